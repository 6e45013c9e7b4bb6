//! Tabular datasets (Arrow)
//!
//! A [`Table`] is a single Arrow `RecordBatch` with named columns. Rows are
//! independent records. Filtering is pure row selection: the schema and
//! column order of a filtered table are those of its source.
//!
//! ```text
//!   .csv / .parquet ──load──> Table ──filter_range──> Table ──save──> .csv
//!                                 └──select_column──> (features, labels)
//! ```

mod io;

pub use io::FileFormat;

use std::path::Path;

use arrow::array::{Array, BooleanArray, Float64Array};
use arrow::compute::{cast, filter_record_batch};
use arrow::datatypes::{DataType, SchemaRef};
use arrow::record_batch::RecordBatch;

use crate::{Error, Result};

/// In-memory tabular dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    batch: RecordBatch,
}

impl Table {
    /// Wrap an existing record batch.
    #[must_use]
    pub const fn new(batch: RecordBatch) -> Self {
        Self { batch }
    }

    /// Load a dataset file. CSV column types are inferred from content (see
    /// [`FileFormat::Csv`]); Parquet keeps its stored schema.
    ///
    /// # Errors
    ///
    /// [`Error::ParseError`] on malformed content, [`Error::Io`] when the
    /// file cannot be opened.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        io::load(path.as_ref())
    }

    /// Write the dataset, preserving column order, without an index column.
    ///
    /// # Errors
    ///
    /// [`Error::Io`] or an encoder error.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        io::save(self, path.as_ref())
    }

    /// Underlying record batch.
    #[must_use]
    pub const fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    /// Schema of the table.
    #[must_use]
    pub fn schema(&self) -> SchemaRef {
        self.batch.schema()
    }

    /// Number of rows.
    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    /// Number of columns.
    #[must_use]
    pub fn num_columns(&self) -> usize {
        self.batch.num_columns()
    }

    /// Column names in order.
    #[must_use]
    pub fn column_names(&self) -> Vec<String> {
        self.batch
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect()
    }

    /// Whether a column exists.
    #[must_use]
    pub fn has_column(&self, name: &str) -> bool {
        self.batch.schema().index_of(name).is_ok()
    }

    /// Fail on the first absent column.
    ///
    /// # Errors
    ///
    /// [`Error::MissingColumn`].
    pub fn require_columns(&self, names: &[&str]) -> Result<()> {
        match names.iter().find(|name| !self.has_column(name)) {
            Some(missing) => Err(Error::missing_column(*missing)),
            None => Ok(()),
        }
    }

    /// A column as `f64` values, nulls preserved.
    ///
    /// Integer and decimal columns are widened. `Null`-typed columns and
    /// columns with no non-null values are accepted whatever their type:
    /// a header-only CSV loads back with every column typed `Null`.
    ///
    /// # Errors
    ///
    /// [`Error::MissingColumn`] when absent, [`Error::SchemaError`] when the
    /// column holds non-numeric values.
    pub fn numeric_column(&self, name: &str) -> Result<Float64Array> {
        let column = self
            .batch
            .column_by_name(name)
            .ok_or_else(|| Error::missing_column(name))?;

        let data_type = column.data_type();
        let all_null = *data_type == DataType::Null || column.null_count() == column.len();
        if data_type.is_numeric() || all_null {
            let widened = cast(column, &DataType::Float64)?;
            return widened
                .as_any()
                .downcast_ref::<Float64Array>()
                .cloned()
                .ok_or_else(|| Error::SchemaError(format!("column '{name}' is not numeric")));
        }

        Err(Error::SchemaError(format!(
            "column '{name}' has type {data_type}, expected numeric"
        )))
    }

    /// Keep rows where `lo <= column <= hi`. Null cells never match.
    ///
    /// # Errors
    ///
    /// Same as [`Table::numeric_column`].
    pub fn filter_range(&self, column: &str, lo: f64, hi: f64) -> Result<Self> {
        let values = self.numeric_column(column)?;
        let mask: BooleanArray = values
            .iter()
            .map(|v| Some(v.is_some_and(|x| lo <= x && x <= hi)))
            .collect();
        self.filter(&mask)
    }

    /// Keep rows where `mask` is true.
    ///
    /// # Errors
    ///
    /// [`Error::Arrow`] if the mask length differs from the row count.
    pub fn filter(&self, mask: &BooleanArray) -> Result<Self> {
        Ok(Self::new(filter_record_batch(&self.batch, mask)?))
    }

    /// Split off a numeric column: returns the table without it and its
    /// values, e.g. features and labels.
    ///
    /// # Errors
    ///
    /// [`Error::MissingColumn`] when absent, [`Error::SchemaError`] when the
    /// column is non-numeric or contains nulls.
    pub fn select_column(&self, name: &str) -> Result<(Self, Vec<f64>)> {
        let values = self.numeric_column(name)?;
        if values.null_count() > 0 {
            return Err(Error::SchemaError(format!(
                "column '{name}' has {} missing values",
                values.null_count()
            )));
        }

        let schema = self.batch.schema();
        let keep: Vec<usize> = (0..schema.fields().len())
            .filter(|&i| schema.field(i).name() != name)
            .collect();
        let rest = self.batch.project(&keep)?;

        Ok((Self::new(rest), values.values().to_vec()))
    }
}
