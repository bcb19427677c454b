use std::result::Result as StdResult;

use thiserror::Error;

/// Errors raised by the pure domain layer
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// User-facing CSV import problem; the message is shown as-is.
    #[error("{0}")]
    CsvImport(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = StdResult<T, CoreError>;
