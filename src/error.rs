//! Error type for loading the customer table

use std::path::PathBuf;

use polars::prelude::PolarsError;
use thiserror::Error;

/// Failure to turn a source file into customer records.
///
/// This is the only fallible step of the pipeline; everything downstream of
/// [`crate::data::load`] is total.
#[derive(Error, Debug)]
pub enum DataLoadError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse customer table: {0}")]
    Parse(#[from] PolarsError),

    #[error("required column `{0}` is missing")]
    MissingColumn(String),

    #[error("column `{column}` has an empty or malformed value at row {row}")]
    InvalidValue { column: String, row: usize },

    #[error("delimiter {0:?} is not a single ASCII character")]
    InvalidDelimiter(char),
}

/// A segment label that names none of the known values
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown {kind} `{value}`")]
pub struct UnknownSegment {
    pub kind: &'static str,
    pub value: String,
}
