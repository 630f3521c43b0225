use core_types::CoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestError {
    /// A single row could not be used. Recorded and skipped, never fatal on its own.
    #[error("Row {row}: {reason}")]
    Parse { row: usize, reason: String },

    #[error("Required column '{0}' is missing from the table")]
    MissingColumn(String),

    #[error("Column override '{0}' does not name a column in the table")]
    UnknownColumn(String),

    #[error("No usable observations remain after {0}")]
    EmptySeries(String),

    #[error("Failed to read delimited input: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to read input file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Series invariant violated: {0}")]
    Core(#[from] CoreError),
}
