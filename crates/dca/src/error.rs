use core_types::CoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DcaError {
    #[error("Not enough data for the DCA calculation: {0}")]
    EmptySeries(String),

    #[error("Invalid DCA plan: {0}")]
    InvalidPlan(String),

    #[error("Calculation error: Division by zero encountered in metric '{0}'")]
    DivisionByZero(String),

    #[error("Value cannot be represented as a decimal: {0}")]
    Conversion(String),

    #[error("Series invariant violated: {0}")]
    Core(#[from] CoreError),
}
