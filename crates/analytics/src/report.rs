use crate::distribution::{PriceBin, SeriesSummary};
use crate::projection::{MarketCapBounds, RiskScenario, TargetScenario};
use crate::regime::RegimeMeans;
use crate::smoothing::SmoothedSeries;
use crate::yearly::{YearlyExtreme, YearlySummary};
use serde::Serialize;
use std::fmt;

/// The analysis panels that can be individually unavailable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Panel {
    Targets,
    Risks,
}

impl fmt::Display for Panel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Panel::Targets => f.write_str("targets"),
            Panel::Risks => f.write_str("risks"),
        }
    }
}

/// A panel that was skipped, and why.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnavailablePanel {
    pub panel: Panel,
    pub reason: String,
}

/// One SMA series and the window it was computed with.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovingAverage {
    pub window: usize,
    pub values: SmoothedSeries,
}

/// Everything the `AnalyticsEngine` derives from one series.
///
/// Every per-observation series is aligned index-for-index with the input.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    // I. Overview
    pub summary: SeriesSummary,
    pub histogram: Vec<PriceBin>,

    // II. Yearly Extremes
    pub yearly: Vec<YearlyExtreme>,
    pub yearly_summary: YearlySummary,

    // III. Smoothing and Volatility
    pub moving_averages: Vec<MovingAverage>,
    pub ema_span: usize,
    pub ema: SmoothedSeries,
    pub volatility: SmoothedSeries,

    // IV. EMA Regime
    pub regime: RegimeMeans,

    // V. Market-Cap Projections (need the optional columns)
    pub market_cap_bounds: Option<MarketCapBounds>,
    pub targets: Option<Vec<TargetScenario>>,
    pub risks: Option<Vec<RiskScenario>>,
    pub unavailable: Vec<UnavailablePanel>,
}
