//! Named float columns for tabular event sources.
//!
//! A [`Columns`] table holds scalar columns (one value per row) and jagged
//! columns (a variable-length list per row), all widened to `f64`. Tables
//! come from memory or from Parquet files; Arrow list columns become jagged
//! columns and numeric columns become scalar columns.

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use arrow::array::{Array, ArrayRef, AsArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Float64Type, Schema};
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;
use lh_core::{Error, Result};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::errors::ParquetError;

/// Variable-length rows stored as one flat value buffer plus offsets.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JaggedColumn {
    offsets: Vec<usize>,
    values: Vec<f64>,
}

impl JaggedColumn {
    /// Build from per-row value lists.
    pub fn from_rows<I, R>(rows: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: AsRef<[f64]>,
    {
        let mut col = Self { offsets: vec![0], values: Vec::new() };
        for row in rows {
            col.push_row(row.as_ref());
        }
        col
    }

    fn push_row(&mut self, row: &[f64]) {
        if self.offsets.is_empty() {
            self.offsets.push(0);
        }
        self.values.extend_from_slice(row);
        self.offsets.push(self.values.len());
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    /// `true` when there are no rows.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Values of row `i`. Panics when out of bounds.
    pub fn row(&self, i: usize) -> &[f64] {
        &self.values[self.offsets[i]..self.offsets[i + 1]]
    }
}

/// One named column.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    /// One value per row.
    Scalar(Vec<f64>),
    /// A list of values per row.
    Jagged(JaggedColumn),
}

impl Column {
    /// Number of rows.
    pub fn len(&self) -> usize {
        match self {
            Column::Scalar(v) => v.len(),
            Column::Jagged(j) => j.len(),
        }
    }

    /// `true` when there are no rows.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A table of named float columns.
#[derive(Debug, Clone, Default)]
pub struct Columns {
    origin: String,
    columns: HashMap<String, Column>,
}

impl Columns {
    /// Empty table; `origin` names it in diagnostics.
    pub fn new(origin: impl Into<String>) -> Self {
        Self { origin: origin.into(), columns: HashMap::new() }
    }

    /// Where the table came from.
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Add or replace a scalar column.
    pub fn insert_scalar(&mut self, name: impl Into<String>, values: Vec<f64>) {
        self.columns.insert(name.into(), Column::Scalar(values));
    }

    /// Add or replace a jagged column.
    pub fn insert_jagged(&mut self, name: impl Into<String>, values: JaggedColumn) {
        self.columns.insert(name.into(), Column::Jagged(values));
    }

    /// Builder form of [`Columns::insert_scalar`].
    pub fn with_scalar(mut self, name: impl Into<String>, values: Vec<f64>) -> Self {
        self.insert_scalar(name, values);
        self
    }

    /// Builder form of [`Columns::insert_jagged`].
    pub fn with_jagged(mut self, name: impl Into<String>, values: JaggedColumn) -> Self {
        self.insert_jagged(name, values);
        self
    }

    /// Whether a column exists.
    pub fn contains(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Column by name.
    pub fn get(&self, name: &str) -> Result<&Column> {
        self.columns.get(name).ok_or_else(|| self.column_error(name, "missing column"))
    }

    /// Scalar column by name.
    pub fn scalar(&self, name: &str) -> Result<&[f64]> {
        match self.get(name)? {
            Column::Scalar(v) => Ok(v),
            Column::Jagged(_) => Err(self.column_error(name, "expected a scalar column")),
        }
    }

    /// Jagged column by name.
    pub fn jagged(&self, name: &str) -> Result<&JaggedColumn> {
        match self.get(name)? {
            Column::Jagged(j) => Ok(j),
            Column::Scalar(_) => Err(self.column_error(name, "expected a list column")),
        }
    }

    /// Rows in column `name`.
    pub fn rows(&self, name: &str) -> Result<usize> {
        Ok(self.get(name)?.len())
    }

    pub(crate) fn column_error(&self, name: &str, message: &str) -> Error {
        Error::malformed(&self.origin, format!("column '{name}'"), message)
    }

    /// Load every numeric and list column of a Parquet file. Columns come
    /// from the file schema, so a file without rows still has its columns.
    pub fn from_parquet(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let parquet_error = |e: ParquetError| Error::Columnar(format!("{}: {e}", path.display()));
        let builder = ParquetRecordBatchReaderBuilder::try_new(file).map_err(parquet_error)?;
        let schema = builder.schema().clone();
        let reader = builder.build().map_err(parquet_error)?;
        let batches = reader
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| Error::Columnar(format!("{}: {e}", path.display())))?;
        let table = Self::from_record_batches(path.display().to_string(), &schema, &batches)?;
        log::debug!("loaded {} columns from {}", table.columns.len(), path.display());
        Ok(table)
    }

    /// Convert Arrow record batches laid out as `schema`. Every numeric and
    /// list field becomes a column, empty when there are no batches; fields
    /// of other types are skipped.
    pub fn from_record_batches(
        origin: impl Into<String>,
        schema: &Schema,
        batches: &[RecordBatch],
    ) -> Result<Self> {
        let mut table = Self::new(origin);
        for (idx, field) in schema.fields().iter().enumerate() {
            let name = field.name();
            let column = match field.data_type() {
                DataType::List(_) => {
                    let mut col = JaggedColumn::default();
                    for batch in batches {
                        append_list(&mut col, batch.column(idx))
                            .map_err(|e| table.arrow_error(name, e))?;
                    }
                    Column::Jagged(col)
                }
                dt if dt.is_numeric() => {
                    let mut values = Vec::new();
                    for batch in batches {
                        append_scalar(&mut values, batch.column(idx))
                            .map_err(|e| table.arrow_error(name, e))?;
                    }
                    Column::Scalar(values)
                }
                other => {
                    log::debug!("{}: skipping column '{name}' of type {other}", table.origin);
                    continue;
                }
            };
            table.columns.insert(name.clone(), column);
        }
        Ok(table)
    }

    fn arrow_error(&self, name: &str, e: ArrowError) -> Error {
        Error::Columnar(format!("{}: column '{name}': {e}", self.origin))
    }
}

type ArrowResult<T> = std::result::Result<T, ArrowError>;

fn as_f64(array: &ArrayRef) -> ArrowResult<ArrayRef> {
    cast(array, &DataType::Float64)
}

fn append_scalar(out: &mut Vec<f64>, array: &ArrayRef) -> ArrowResult<()> {
    let floats = as_f64(array)?;
    let floats = floats.as_primitive::<Float64Type>();
    out.extend(floats.iter().map(|v| v.unwrap_or(f64::NAN)));
    Ok(())
}

/// Null rows become empty rows; null values inside a row become NaN.
fn append_list(out: &mut JaggedColumn, array: &ArrayRef) -> ArrowResult<()> {
    let list = array.as_list::<i32>();
    let values = as_f64(list.values())?;
    let values = values.as_primitive::<Float64Type>();
    let offsets = list.value_offsets();
    let mut row = Vec::new();
    for i in 0..list.len() {
        row.clear();
        if list.is_valid(i) {
            let (start, end) = (offsets[i] as usize, offsets[i + 1] as usize);
            row.extend((start..end).map(|j| {
                if values.is_valid(j) { values.value(j) } else { f64::NAN }
            }));
        }
        out.push_row(&row);
    }
    Ok(())
}
