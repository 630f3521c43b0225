use core_types::{ColumnRole, CoreError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyticsError {
    #[error("Not enough data to perform calculation: '{0}' needs at least one observation")]
    EmptySeries(String),

    #[error("The {0} column is not available for this series")]
    MissingField(ColumnRole),

    #[error("Calculation error: Division by zero encountered in metric '{0}'")]
    DivisionByZero(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("An error occurred during indicator calculation: {0}")]
    Indicator(String),

    #[error("Value cannot be represented as a decimal: {0}")]
    Conversion(String),

    #[error("Series invariant violated: {0}")]
    Core(#[from] CoreError),
}
