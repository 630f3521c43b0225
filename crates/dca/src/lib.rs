//! # Cycle Lens DCA
//!
//! Dollar-cost-averaging over a normalized `Series`.
//!
//! - `simulator`: replays a `DcaPlan` against history, buying every Nth row in the
//!   plan's date range, and values the result against a reference price.
//! - `projection`: a forward estimate of a weekly/monthly plan priced at the recent
//!   average.
//!
//! All money amounts are `Decimal`.

pub mod error;
pub mod projection;
pub mod simulator;

pub use error::DcaError;
pub use projection::{project, DcaProjection};
pub use simulator::{simulate, DcaPurchase, DcaResult, DcaValuation};

use rust_decimal::prelude::*;

/// Converts a series price into a `Decimal`, rejecting values it cannot represent.
pub(crate) fn price_to_decimal(price: f64) -> Result<Decimal, DcaError> {
    Decimal::from_f64(price).ok_or_else(|| DcaError::Conversion(format!("price {price}")))
}

pub(crate) fn overflow(metric: &str) -> DcaError {
    DcaError::Conversion(format!("{metric} overflows the decimal range"))
}
