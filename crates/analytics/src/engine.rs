use crate::distribution::{price_histogram, summarize};
use crate::error::AnalyticsError;
use crate::projection::{risks, targets, MarketCapBounds};
use crate::regime::{create_regime_strategy, RegimeMeanStrategy};
use crate::report::{AnalysisReport, MovingAverage, Panel, UnavailablePanel};
use crate::smoothing::{exponential_moving_average, simple_moving_average};
use crate::volatility::percent_change;
use crate::yearly::{aggregate, summarize_years};
use configuration::AnalysisParams;
use core_types::Series;

/// A stateless calculator that derives every analysis panel from a series.
#[derive(Debug)]
pub struct AnalyticsEngine {
    params: AnalysisParams,
    regime: Box<dyn RegimeMeanStrategy>,
}

impl Default for AnalyticsEngine {
    fn default() -> Self {
        Self::new(AnalysisParams::default())
    }
}

impl AnalyticsEngine {
    pub fn new(params: AnalysisParams) -> Self {
        let regime = create_regime_strategy(params.regime_strategy);
        Self { params, regime }
    }

    /// Swaps the bull/bear mean algorithm.
    pub fn with_regime_strategy(mut self, regime: Box<dyn RegimeMeanStrategy>) -> Self {
        self.regime = regime;
        self
    }

    pub fn params(&self) -> &AnalysisParams {
        &self.params
    }

    /// The main entry point for calculating the analysis panels.
    ///
    /// # Arguments
    ///
    /// * `series` - The normalized (and already windowed) series to analyze.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `AnalysisReport` or an `AnalyticsError`.
    /// Panels that need an absent optional column are listed in
    /// `AnalysisReport::unavailable` instead of failing the whole report.
    pub fn calculate(&self, series: &Series) -> Result<AnalysisReport, AnalyticsError> {
        if series.is_empty() {
            return Err(AnalyticsError::EmptySeries("analysis report".to_string()));
        }
        tracing::debug!(observations = series.len(), "Calculating analysis report");

        let summary = summarize(series)?;
        let histogram = price_histogram(series, self.params.histogram_bins)?;

        let yearly = aggregate(series)?;
        let yearly_summary = summarize_years(&yearly)?;

        let moving_averages = self
            .params
            .sma_windows
            .iter()
            .map(|&window| {
                Ok(MovingAverage {
                    window,
                    values: simple_moving_average(series, window)?,
                })
            })
            .collect::<Result<Vec<_>, AnalyticsError>>()?;
        let ema = exponential_moving_average(series, self.params.ema_span)?;
        let volatility = percent_change(series)?;

        let regime = self.regime.evaluate_series(series, self.params.ema_span)?;

        let mut unavailable = Vec::new();
        let (market_cap_bounds, targets, risks) = match MarketCapBounds::from_series(series) {
            Ok(bounds) => {
                let t = targets(
                    bounds.min_market_cap,
                    bounds.last_supply,
                    &self.params.target_multipliers,
                )?;
                let r = risks(
                    bounds.max_market_cap,
                    bounds.last_supply,
                    &self.params.risk_drawdowns,
                )?;
                (Some(bounds), Some(t), Some(r))
            }
            Err(AnalyticsError::MissingField(role)) => {
                for panel in [Panel::Targets, Panel::Risks] {
                    tracing::warn!(%panel, %role, "Skipping panel: column unavailable");
                    unavailable.push(UnavailablePanel {
                        panel,
                        reason: format!("the series has no {role} column"),
                    });
                }
                (None, None, None)
            }
            Err(e) => return Err(e),
        };

        Ok(AnalysisReport {
            summary,
            histogram,
            yearly,
            yearly_summary,
            moving_averages,
            ema_span: self.params.ema_span,
            ema,
            volatility,
            regime,
            market_cap_bounds,
            targets,
            risks,
            unavailable,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regime::ArithmeticMean;
    use chrono::{Duration, TimeZone, Utc};
    use core_types::Observation;
    use rust_decimal_macros::dec;

    fn series(n: usize, with_caps: bool) -> Series {
        let start = Utc.with_ymd_and_hms(2022, 12, 1, 0, 0, 0).unwrap();
        let observations = (0..n)
            .map(|i| {
                let price = 100.0 + (i as f64 * 0.7).sin() * 20.0 + i as f64;
                let obs = Observation::new(start + Duration::days(i as i64), price).unwrap();
                if with_caps {
                    obs.with_market_cap(price * 1_000.0).with_supply(1_000.0)
                } else {
                    obs
                }
            })
            .collect();
        Series::new(observations).unwrap()
    }

    fn params() -> AnalysisParams {
        AnalysisParams {
            sma_windows: vec![5, 20],
            ema_span: 10,
            histogram_bins: 8,
            ..AnalysisParams::default()
        }
    }

    #[test]
    fn report_panels_are_aligned_with_the_series() {
        let s = series(90, true);
        let report = AnalyticsEngine::new(params()).calculate(&s).unwrap();

        assert_eq!(report.summary.observation_count, 90);
        assert_eq!(report.yearly.len(), 2);
        assert_eq!(report.moving_averages.len(), 2);
        assert_eq!(report.moving_averages[1].window, 20);
        assert_eq!(report.moving_averages[1].values.defined_count(), 71);
        assert_eq!(report.ema.len(), 90);
        assert_eq!(report.volatility.len(), 90);
        assert_eq!(report.histogram.iter().map(|b| b.count).sum::<usize>(), 90);
        assert_eq!(report.regime.strategy, "run_tracking");
        assert!(report.unavailable.is_empty());

        let targets = report.targets.unwrap();
        assert_eq!(targets.len(), 7);
        assert_eq!(targets[0].multiplier, dec!(5));
        assert_eq!(report.risks.unwrap().len(), 5);
    }

    #[test]
    fn missing_columns_mark_panels_unavailable() {
        let report = AnalyticsEngine::new(params()).calculate(&series(30, false)).unwrap();
        assert!(report.targets.is_none());
        assert!(report.risks.is_none());
        assert_eq!(report.unavailable.len(), 2);
        assert_eq!(report.unavailable[0].panel, Panel::Targets);
    }

    #[test]
    fn regime_strategy_can_be_swapped() {
        let engine = AnalyticsEngine::new(params()).with_regime_strategy(Box::new(ArithmeticMean));
        let report = engine.calculate(&series(30, false)).unwrap();
        assert_eq!(report.regime.strategy, "arithmetic");
        assert!(report.regime.segmentation.is_none());
    }

    #[test]
    fn empty_series_short_circuits() {
        assert!(matches!(
            AnalyticsEngine::default().calculate(&Series::default()),
            Err(AnalyticsError::EmptySeries(_))
        ));
    }
}
