//! Property-based tests for the cleaning filters and dataset I/O
//!
//! - Filter output is exactly the set of rows satisfying every predicate
//! - Price and coordinate filters commute
//! - Range bounds are inclusive
//! - CSV save/load preserves the dataset
//!
//! Run with `ProptestConfig::with_cases(100)`.

use std::sync::Arc;

use arrow::array::{Float64Array, Int64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use proptest::prelude::*;
use rental_pipeline::stages::cleaning::{clean, GeoBounds};
use rental_pipeline::table::Table;

// ============================================================================
// Strategies
// ============================================================================

/// (price, longitude, latitude), with the box edges over-represented.
type Row = (i64, f64, f64);

fn arb_longitude() -> impl Strategy<Value = f64> {
    prop_oneof![
        Just(GeoBounds::NYC.min_longitude),
        Just(GeoBounds::NYC.max_longitude),
        -74.6f64..-73.1,
    ]
}

fn arb_latitude() -> impl Strategy<Value = f64> {
    prop_oneof![
        Just(GeoBounds::NYC.min_latitude),
        Just(GeoBounds::NYC.max_latitude),
        40.3f64..41.4,
    ]
}

/// At least one row: a header-only CSV reloads with `Null` column types.
fn arb_rows(max_rows: usize) -> impl Strategy<Value = Vec<Row>> {
    proptest::collection::vec((0i64..1000, arb_longitude(), arb_latitude()), 1..max_rows)
}

/// Rows become a table with a unique `id` per row.
fn to_table(rows: &[Row]) -> Table {
    let schema = Schema::new(vec![
        Field::new("id", DataType::Int64, true),
        Field::new("price", DataType::Int64, true),
        Field::new("longitude", DataType::Float64, true),
        Field::new("latitude", DataType::Float64, true),
    ]);
    let ids = (0..rows.len()).map(|i| i64::try_from(i).unwrap());
    Table::new(
        RecordBatch::try_new(
            Arc::new(schema),
            vec![
                Arc::new(Int64Array::from_iter_values(ids)),
                Arc::new(Int64Array::from_iter_values(rows.iter().map(|r| r.0))),
                Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| r.1))),
                Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| r.2))),
            ],
        )
        .unwrap(),
    )
}

fn ids(table: &Table) -> Vec<f64> {
    table.numeric_column("id").unwrap().values().to_vec()
}

#[allow(clippy::cast_precision_loss)]
fn expected_ids(rows: &[Row], lo: i64, hi: i64) -> Vec<f64> {
    let b = GeoBounds::NYC;
    rows.iter()
        .enumerate()
        .filter(|(_, (price, lon, lat))| {
            lo <= *price
                && *price <= hi
                && b.min_longitude <= *lon
                && *lon <= b.max_longitude
                && b.min_latitude <= *lat
                && *lat <= b.max_latitude
        })
        .map(|(i, _)| i as f64)
        .collect()
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property: output rows are exactly the rows inside every bound, in
    /// input order and unmodified
    #[test]
    fn prop_clean_is_exact_selection(rows in arb_rows(60), lo in 0i64..500, width in 0i64..600) {
        let hi = lo + width;
        let table = to_table(&rows);
        let (cleaned, counts) = clean(&table, lo, hi, &GeoBounds::NYC).unwrap();

        prop_assert_eq!(ids(&cleaned), expected_ids(&rows, lo, hi));
        prop_assert_eq!(counts.after_geo, cleaned.num_rows());
        prop_assert!(counts.after_geo <= counts.after_price);
        prop_assert!(counts.after_price <= counts.input_rows);
        prop_assert_eq!(cleaned.schema(), table.schema());
    }

    /// Property: price-then-geo equals geo-then-price
    #[test]
    #[allow(clippy::cast_precision_loss)]
    fn prop_filters_commute(rows in arb_rows(60), lo in 0i64..500, width in 0i64..600) {
        let hi = lo + width;
        let table = to_table(&rows);

        let (price_first, _) = clean(&table, lo, hi, &GeoBounds::NYC).unwrap();
        let geo_first = GeoBounds::NYC
            .apply(&table)
            .unwrap()
            .filter_range("price", lo as f64, hi as f64)
            .unwrap();

        prop_assert_eq!(price_first, geo_first);
    }

    /// Property: prices on the bounds are kept, one step outside are dropped
    #[test]
    fn prop_price_bounds_inclusive(lo in 1i64..500, width in 1i64..500) {
        let hi = lo + width;
        let inside = (-74.0, 40.7);
        let rows = [
            (lo - 1, inside.0, inside.1),
            (lo, inside.0, inside.1),
            (hi, inside.0, inside.1),
            (hi + 1, inside.0, inside.1),
        ];
        let (cleaned, _) = clean(&to_table(&rows), lo, hi, &GeoBounds::NYC).unwrap();
        prop_assert_eq!(ids(&cleaned), vec![1.0, 2.0]);
    }

    /// Property: load(save(D)) == D for CSV
    #[test]
    fn prop_csv_round_trip(rows in arb_rows(40)) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clean_sample.csv");
        let table = to_table(&rows);

        table.save(&path).unwrap();
        prop_assert_eq!(Table::load(&path).unwrap(), table);
    }
}
