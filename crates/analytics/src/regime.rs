//! Bull/bear mean targets derived from where price sits relative to its EMA.
//!
//! Two algorithms exist and they are not interchangeable numerically:
//!
//! - [`RunTrackingMean`] walks the series as alternating above/below runs, records
//!   every new run extreme plus the extreme of each run as it closes, and averages
//!   with a `count + 1` denominator.
//! - [`ArithmeticMean`] simply averages every price strictly above (bull) or
//!   strictly below (bear) the EMA.

use crate::error::AnalyticsError;
use crate::smoothing::ema_values;
use configuration::RegimeStrategyKind;
use core_types::{RunDirection, Series};
use serde::Serialize;
use std::fmt::Debug;

/// A maximal stretch of observations on one side of the EMA.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmaRun {
    pub direction: RunDirection,
    pub start_index: usize,
    /// Inclusive.
    pub end_index: usize,
    /// Highest price for an `Above` run, lowest for a `Below` run.
    pub extreme_price: f64,
    /// False only for the run still open at the end of the series.
    pub closed: bool,
}

/// The per-run detail behind a run-tracking result, for chart overlays.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RegimeSegmentation {
    pub highs: Vec<f64>,
    pub lows: Vec<f64>,
    /// Strictly alternating in direction.
    pub runs: Vec<EmaRun>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegimeMeans {
    pub strategy: &'static str,
    pub bull_mean_target: f64,
    pub bear_mean_target: f64,
    pub segmentation: Option<RegimeSegmentation>,
}

/// A way of turning aligned price/EMA pairs into bull and bear mean targets.
pub trait RegimeMeanStrategy: Debug + Send + Sync {
    fn name(&self) -> &'static str;

    /// `prices` and `ema` must have the same length.
    fn evaluate(&self, prices: &[f64], ema: &[f64]) -> Result<RegimeMeans, AnalyticsError>;

    /// Computes the EMA for `series` and evaluates against it.
    fn evaluate_series(&self, series: &Series, span: usize) -> Result<RegimeMeans, AnalyticsError> {
        if series.is_empty() {
            return Err(AnalyticsError::EmptySeries(format!("{} regime means", self.name())));
        }
        let prices = series.prices();
        let ema = ema_values(&prices, span)?;
        self.evaluate(&prices, &ema)
    }
}

/// Creates the strategy selected in configuration.
pub fn create_regime_strategy(kind: RegimeStrategyKind) -> Box<dyn RegimeMeanStrategy> {
    match kind {
        RegimeStrategyKind::RunTracking => Box::new(RunTrackingMean),
        RegimeStrategyKind::Arithmetic => Box::new(ArithmeticMean),
    }
}

fn check_aligned(prices: &[f64], ema: &[f64]) -> Result<(), AnalyticsError> {
    if prices.len() != ema.len() {
        return Err(AnalyticsError::InvalidParameter(format!(
            "price and EMA series differ in length ({} vs {})",
            prices.len(),
            ema.len()
        )));
    }
    Ok(())
}

/// `sum / (count + 1)`, or 0 when there is nothing to average.
fn damped_mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / (values.len() as f64 + 1.0)
    }
}

/// Run-based segmentation with the damped mean.
///
/// Within a run every new extreme is appended immediately; when a run closes its
/// extreme is appended once more. The run still open at the end of the series is
/// not flushed, so its final extreme counts only through the in-run appends.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunTrackingMean;

impl RegimeMeanStrategy for RunTrackingMean {
    fn name(&self) -> &'static str {
        "run_tracking"
    }

    fn evaluate(&self, prices: &[f64], ema: &[f64]) -> Result<RegimeMeans, AnalyticsError> {
        check_aligned(prices, ema)?;

        let mut segmentation = RegimeSegmentation::default();
        let mut current: Option<EmaRun> = None;

        for (i, (&price, &average)) in prices.iter().zip(ema).enumerate() {
            let side = if price > average {
                RunDirection::Above
            } else {
                RunDirection::Below
            };

            match current.as_mut() {
                Some(run) if run.direction == side => {
                    run.end_index = i;
                    let is_new_extreme = match side {
                        RunDirection::Above => price > run.extreme_price,
                        RunDirection::Below => price < run.extreme_price,
                    };
                    if is_new_extreme {
                        run.extreme_price = price;
                        match side {
                            RunDirection::Above => segmentation.highs.push(price),
                            RunDirection::Below => segmentation.lows.push(price),
                        }
                    }
                }
                _ => {
                    if let Some(mut finished) = current.take() {
                        match finished.direction {
                            RunDirection::Above => segmentation.highs.push(finished.extreme_price),
                            RunDirection::Below => segmentation.lows.push(finished.extreme_price),
                        }
                        finished.closed = true;
                        segmentation.runs.push(finished);
                    }
                    current = Some(EmaRun {
                        direction: side,
                        start_index: i,
                        end_index: i,
                        extreme_price: price,
                        closed: false,
                    });
                }
            }
        }

        // TODO: flush the open run's extreme into highs/lows (changes both means).
        if let Some(open) = current {
            segmentation.runs.push(open);
        }

        tracing::debug!(
            runs = segmentation.runs.len(),
            highs = segmentation.highs.len(),
            lows = segmentation.lows.len(),
            "EMA regime segmented"
        );

        Ok(RegimeMeans {
            strategy: self.name(),
            bull_mean_target: damped_mean(&segmentation.highs),
            bear_mean_target: damped_mean(&segmentation.lows),
            segmentation: Some(segmentation),
        })
    }
}

/// Plain means of the prices strictly above and strictly below the EMA.
///
/// A side with no prices yields 0. Prices equal to the EMA count for neither side.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArithmeticMean;

impl RegimeMeanStrategy for ArithmeticMean {
    fn name(&self) -> &'static str {
        "arithmetic"
    }

    fn evaluate(&self, prices: &[f64], ema: &[f64]) -> Result<RegimeMeans, AnalyticsError> {
        check_aligned(prices, ema)?;

        let (mut above_sum, mut above_count) = (0.0, 0usize);
        let (mut below_sum, mut below_count) = (0.0, 0usize);
        for (&price, &average) in prices.iter().zip(ema) {
            if price > average {
                above_sum += price;
                above_count += 1;
            } else if price < average {
                below_sum += price;
                below_count += 1;
            }
        }

        let mean = |sum: f64, count: usize| if count == 0 { 0.0 } else { sum / count as f64 };

        Ok(RegimeMeans {
            strategy: self.name(),
            bull_mean_target: mean(above_sum, above_count),
            bear_mean_target: mean(below_sum, below_count),
            segmentation: None,
        })
    }
}
