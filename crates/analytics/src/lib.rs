//! # Cycle Lens Analytics Engine
//!
//! This crate turns a normalized price `Series` into the derived series and scalar
//! metrics the rest of the system renders: yearly extremes, moving averages,
//! percent-change volatility, EMA regime means, market-cap price projections,
//! point-in-time returns and the price distribution.
//!
//! ## Architectural Principles
//!
//! - **Layer 1 Logic:** This is a pure logic crate. It has no knowledge of files,
//!   terminals or charts. It depends only on `core-types` and `configuration`.
//! - **Stateless Calculation:** Every function is a pure transform of its inputs.
//!   The `AnalyticsEngine` bundles them into one `AnalysisReport` per series.
//! - **Explicit Failure:** Division by zero, empty input and missing optional
//!   columns surface as `AnalyticsError` instead of `NaN` or infinity.
//!
//! ## Public API
//!
//! - `AnalyticsEngine`: runs every panel for a series with a given `AnalysisParams`.
//! - `AnalysisReport`: the standardized output of the engine.
//! - `RegimeMeanStrategy`: the two interchangeable bull/bear mean algorithms.
//! - `AnalyticsError`: the specific error types that can be returned from this crate.

// Declare the modules that constitute this crate.
pub mod distribution;
pub mod engine;
pub mod error;
pub mod lookup;
pub mod projection;
pub mod regime;
pub mod report;
pub mod smoothing;
pub mod volatility;
pub mod yearly;

// Re-export the key components to create a clean, public-facing API.
pub use distribution::{price_histogram, summarize, PriceBin, SeriesSummary};
pub use engine::AnalyticsEngine;
pub use error::AnalyticsError;
pub use lookup::{nearest, return_between, PeriodReturn};
pub use projection::{risks, targets, MarketCapBounds, RiskScenario, TargetScenario};
pub use regime::{
    create_regime_strategy, ArithmeticMean, EmaRun, RegimeMeanStrategy, RegimeMeans,
    RegimeSegmentation, RunTrackingMean,
};
pub use report::{AnalysisReport, MovingAverage, Panel, UnavailablePanel};
pub use smoothing::{exponential_moving_average, simple_moving_average, SmoothedSeries};
pub use volatility::percent_change;
pub use yearly::{aggregate, summarize_years, YearlyExtreme, YearlySummary};

use core_types::Series;

/// Fails with `AnalyticsError::EmptySeries` naming the calculation that needed data.
pub(crate) fn ensure_non_empty(series: &Series, metric: &str) -> Result<(), AnalyticsError> {
    if series.is_empty() {
        return Err(AnalyticsError::EmptySeries(metric.to_string()));
    }
    Ok(())
}
