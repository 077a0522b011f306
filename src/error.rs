//! Engine Error Types

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by graph execution.
///
/// Every error is fatal to the current `run` invocation: the engine has no
/// notion of a "bad row". Row-level resilience belongs to the caller, via a
/// `Filter` mapper or a parser that emits a sentinel row.
#[derive(Error, Debug)]
pub enum Error {
    /// No producer registered under the requested input name
    #[error("unknown input '{0}'")]
    UnknownInput(String),

    /// Input file could not be opened
    #[error("failed to open input file '{path}': {source}")]
    InputFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A required column is missing from a row
    #[error("column '{0}' is missing")]
    MissingColumn(String),

    /// A column held a value of the wrong type for the operator
    #[error("expected {expected} in column '{column}', found {found}")]
    TypeMismatch {
        column: String,
        expected: &'static str,
        found: &'static str,
    },

    /// Two values of different classes were compared
    #[error("cannot compare {left} with {right}")]
    IncomparableValues {
        left: &'static str,
        right: &'static str,
    },

    /// A sort key column mixed value classes across rows
    #[error("mixed value types in sort key column '{column}': {left} vs {right}")]
    MixedKeyTypes {
        column: String,
        left: &'static str,
        right: &'static str,
    },

    /// A grouped operator observed keys running backwards
    #[error("{stage} input is not sorted by {keys:?}")]
    UnsortedInput {
        stage: &'static str,
        keys: Vec<String>,
    },

    /// Division by a zero-valued column
    #[error("division by zero in column '{0}'")]
    DivisionByZero(String),

    /// Logarithm of a non-positive ratio
    #[error("logarithm of non-positive value {0}")]
    NonPositiveLog(f64),

    /// Integer aggregation overflowed
    #[error("integer overflow while aggregating column '{0}'")]
    IntegerOverflow(String),

    /// Timestamp string did not match `YYYYMMDDTHHMMSS[.ffffff]`
    #[error("invalid timestamp '{value}': {source}")]
    Timestamp {
        value: String,
        #[source]
        source: chrono::format::ParseError,
    },

    /// I/O error (spill files, input files)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON error (spill runs, bundled line parser)
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(#[from] figment::Error),
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, Error>;
