//! Delimited and Parquet file I/O for [`Table`]
//!
//! Dispatch is by extension: `.parquet` / `.pq` go through the Parquet
//! reader and writer, everything else is treated as CSV with a header row.

use std::fs::File;
use std::io::{Seek, SeekFrom};
use std::path::Path;
use std::sync::Arc;

use arrow::compute::concat_batches;
use arrow::csv::reader::Format;
use arrow::csv::{ReaderBuilder, WriterBuilder};
use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;

use super::Table;
use crate::{Error, Result};

/// On-disk format of a dataset file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// Comma-separated values with a header row. Types are re-inferred on
    /// load: digit-only text becomes numeric and empty fields become null.
    Csv,
    /// Apache Parquet.
    Parquet,
}

impl FileFormat {
    /// Pick the format from a path's extension.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        match ext.as_str() {
            "parquet" | "pq" => Self::Parquet,
            _ => Self::Csv,
        }
    }
}

pub(super) fn load(path: &Path) -> Result<Table> {
    match FileFormat::from_path(path) {
        FileFormat::Csv => load_csv(path),
        FileFormat::Parquet => load_parquet(path),
    }
}

pub(super) fn save(table: &Table, path: &Path) -> Result<()> {
    match FileFormat::from_path(path) {
        FileFormat::Csv => save_csv(table, path),
        FileFormat::Parquet => save_parquet(table, path),
    }
}

fn parse_error(path: &Path, e: impl std::fmt::Display) -> Error {
    Error::ParseError(format!("{}: {e}", path.display()))
}

/// Read a CSV file, inferring column types from the whole file.
///
/// Types come from the text alone, so a save/load cycle is not lossless:
/// a text column of digits reads back as `Int64`, an empty field reads back
/// as null, and a header-only file reads back with every column `Null`.
fn load_csv(path: &Path) -> Result<Table> {
    let mut file = File::open(path)?;

    let format = Format::default().with_header(true);
    let (schema, _) = format
        .infer_schema(&mut file, None)
        .map_err(|e| parse_error(path, e))?;
    let schema: SchemaRef = Arc::new(schema);

    file.seek(SeekFrom::Start(0))?;
    let reader = ReaderBuilder::new(Arc::clone(&schema))
        .with_format(format)
        .build(file)
        .map_err(|e| parse_error(path, e))?;

    let batches = reader
        .collect::<std::result::Result<Vec<RecordBatch>, _>>()
        .map_err(|e| parse_error(path, e))?;

    Ok(Table::new(concat_batches(&schema, &batches)?))
}

/// Write a CSV file with a header row and no index column.
fn save_csv(table: &Table, path: &Path) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = WriterBuilder::new().with_header(true).build(file);
    writer.write(table.batch())?;
    Ok(())
}

fn load_parquet(path: &Path) -> Result<Table> {
    let file = File::open(path)?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).map_err(|e| parse_error(path, e))?;
    let schema = Arc::clone(builder.schema());
    let reader = builder.build().map_err(|e| parse_error(path, e))?;

    let batches = reader
        .collect::<std::result::Result<Vec<RecordBatch>, _>>()
        .map_err(|e| parse_error(path, e))?;

    Ok(Table::new(concat_batches(&schema, &batches)?))
}

fn save_parquet(table: &Table, path: &Path) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, table.batch().schema(), None)?;
    writer.write(table.batch())?;
    writer.close()?;
    Ok(())
}
