//! Customer table loading using Polars

use std::fs::File;
use std::path::Path;

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::DataLoadError;

/// Columns every source file must provide
pub const REQUIRED_COLUMNS: [&str; 6] = [
    "Age",
    "Balance",
    "IsActiveMember",
    "Exited",
    "Geography",
    "Gender",
];

/// Columns discarded on load unless configured otherwise
pub const DEFAULT_DROP_COLUMNS: [&str; 2] = ["Year", "Surname"];

/// One customer row of the source dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerRecord {
    /// Country name
    pub geography: String,
    /// Gender as written in the source
    pub gender: String,
    /// Age in years
    pub age: i64,
    /// Account balance
    pub balance: f64,
    /// Whether the customer is an active member
    pub is_active_member: bool,
    /// Churn label: true when the customer left the bank
    pub exited: bool,
}

/// How a source file is read
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Field separator, a single ASCII byte
    pub delimiter: u8,
    /// Columns removed from the table when present
    pub drop_columns: Vec<String>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            drop_columns: DEFAULT_DROP_COLUMNS.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl LoadOptions {
    /// Use `delimiter` as the field separator
    pub fn with_delimiter(mut self, delimiter: char) -> Result<Self, DataLoadError> {
        if !delimiter.is_ascii() {
            return Err(DataLoadError::InvalidDelimiter(delimiter));
        }
        self.delimiter = delimiter as u8;
        Ok(self)
    }

    /// Replace the list of discarded columns
    pub fn with_drop_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.drop_columns = columns.into_iter().map(Into::into).collect();
        self
    }
}

/// Immutable snapshot of a loaded source file
#[derive(Debug, Clone)]
pub struct CustomerTable {
    records: Vec<CustomerRecord>,
    columns: Vec<String>,
    dropped_columns: Vec<String>,
    missing_values: usize,
}

impl CustomerTable {
    /// Parsed customer rows in file order
    pub fn records(&self) -> &[CustomerRecord] {
        &self.records
    }

    /// Column names kept after dropping, including ones the core ignores
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Configured drop columns that were actually present
    pub fn dropped_columns(&self) -> &[String] {
        &self.dropped_columns
    }

    /// Count of empty cells across all kept columns
    pub fn missing_values(&self) -> usize {
        self.missing_values
    }

    /// Number of customer records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when the file held a header and no rows
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Consume the table, keeping only the records
    pub fn into_records(self) -> Vec<CustomerRecord> {
        self.records
    }
}

/// Load a delimited customer file into typed records
///
/// # Arguments
/// * `path` - Path to the source file
/// * `options` - Delimiter and columns to discard
///
/// # Returns
/// * `CustomerTable` holding the parsed records and table metadata
pub fn load(path: &Path, options: &LoadOptions) -> Result<CustomerTable, DataLoadError> {
    let file = File::open(path).map_err(|source| DataLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    // Full-table inference so a float appearing late in Balance is not
    // rejected by an integer guess
    let mut df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(None)
        .with_parse_options(CsvParseOptions::default().with_separator(options.delimiter))
        .into_reader_with_file_handle(file)
        .finish()?;

    let mut dropped_columns = Vec::new();
    for name in &options.drop_columns {
        if df.get_column_index(name).is_some() {
            df = df.drop(name)?;
            dropped_columns.push(name.clone());
        }
    }
    debug!(?dropped_columns, "discarded configured columns");

    for name in REQUIRED_COLUMNS {
        if df.get_column_index(name).is_none() {
            return Err(DataLoadError::MissingColumn(name.to_string()));
        }
    }

    let missing_values: usize = df.get_columns().iter().map(|s| s.null_count()).sum();
    let columns = df
        .get_column_names()
        .into_iter()
        .map(|name| name.to_string())
        .collect();

    let records = extract_records(&df)?;
    info!(
        rows = records.len(),
        columns = df.width(),
        missing_values,
        "loaded customer table from {}",
        path.display()
    );

    Ok(CustomerTable {
        records,
        columns,
        dropped_columns,
        missing_values,
    })
}

/// Convert the validated DataFrame into records, column by column
fn extract_records(df: &DataFrame) -> Result<Vec<CustomerRecord>, DataLoadError> {
    let ages = int_column(df, "Age")?;
    let balances = float_column(df, "Balance")?;
    let active = flag_column(df, "IsActiveMember")?;
    let exited = flag_column(df, "Exited")?;
    let geography = text_column(df, "Geography")?;
    let gender = text_column(df, "Gender")?;

    let records = geography
        .into_iter()
        .zip(gender)
        .zip(ages)
        .zip(balances)
        .zip(active)
        .zip(exited)
        .map(
            |(((((geography, gender), age), balance), is_active_member), exited)| CustomerRecord {
                geography,
                gender,
                age,
                balance,
                is_active_member,
                exited,
            },
        )
        .collect();

    Ok(records)
}

fn required<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Series, DataLoadError> {
    df.column(name)
        .map_err(|_| DataLoadError::MissingColumn(name.to_string()))
}

fn present<T>(name: &str, row: usize, value: Option<T>) -> Result<T, DataLoadError> {
    value.ok_or_else(|| DataLoadError::InvalidValue {
        column: name.to_string(),
        row,
    })
}

/// Integer column; text that does not parse and fractional floats are
/// rejected rather than nulled or truncated by the cast
fn int_column(df: &DataFrame, name: &str) -> Result<Vec<i64>, DataLoadError> {
    let source = required(df, name)?;
    if source.dtype().is_float() {
        let floats = source.cast(&DataType::Float64)?;
        if let Some(row) = floats
            .f64()?
            .into_iter()
            .position(|value| value.is_some_and(|v| v.fract() != 0.0))
        {
            return Err(DataLoadError::InvalidValue {
                column: name.to_string(),
                row,
            });
        };
    }

    let series = source.cast(&DataType::Int64)?;
    series
        .i64()?
        .into_iter()
        .enumerate()
        .map(|(row, value)| present(name, row, value))
        .collect()
}

fn float_column(df: &DataFrame, name: &str) -> Result<Vec<f64>, DataLoadError> {
    let series = required(df, name)?.cast(&DataType::Float64)?;
    series
        .f64()?
        .into_iter()
        .enumerate()
        .map(|(row, value)| present(name, row, value))
        .collect()
}

/// 0/1 columns; any non-zero integer counts as true
fn flag_column(df: &DataFrame, name: &str) -> Result<Vec<bool>, DataLoadError> {
    Ok(int_column(df, name)?.into_iter().map(|v| v != 0).collect())
}

fn text_column(df: &DataFrame, name: &str) -> Result<Vec<String>, DataLoadError> {
    let series = required(df, name)?.cast(&DataType::String)?;
    series
        .str()?
        .into_iter()
        .enumerate()
        .map(|(row, value)| present(name, row, value.map(str::to_string)))
        .collect()
}
