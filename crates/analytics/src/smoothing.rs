use crate::ensure_non_empty;
use crate::error::AnalyticsError;
use core_types::Series;
use serde::{Deserialize, Serialize};
use ta::indicators::{ExponentialMovingAverage as Ema, SimpleMovingAverage as Sma};
use ta::Next;

/// A derived value per observation, aligned index-for-index with its `Series`.
///
/// `None` marks "no value yet" (e.g. before an SMA window fills), never zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SmoothedSeries {
    pub values: Vec<Option<f64>>,
}

impl SmoothedSeries {
    pub fn new(values: Vec<Option<f64>>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied().flatten()
    }

    /// The most recent defined value.
    pub fn last_defined(&self) -> Option<f64> {
        self.values.iter().rev().find_map(|v| *v)
    }

    pub fn defined_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }
}

/// Arithmetic mean of the trailing `window` prices.
///
/// The first `window - 1` entries are undefined.
pub fn simple_moving_average(series: &Series, window: usize) -> Result<SmoothedSeries, AnalyticsError> {
    ensure_non_empty(series, "simple moving average")?;
    if window == 0 {
        return Err(AnalyticsError::InvalidParameter(
            "SMA window must be at least 1".to_string(),
        ));
    }
    let mut sma = Sma::new(window)
        .map_err(|e| AnalyticsError::Indicator(format!("SMA({window}): {e:?}")))?;

    // `ta` averages over whatever it has seen so far; mask the warm-up ourselves.
    let values = series
        .iter()
        .enumerate()
        .map(|(i, obs)| {
            let value = sma.next(obs.price);
            (i + 1 >= window).then_some(value)
        })
        .collect();

    Ok(SmoothedSeries::new(values))
}

/// EMA with `α = 2 / (span + 1)`, seeded with the first price and no bias adjustment.
///
/// `EMA[0] = price[0]`, `EMA[i] = α·price[i] + (1 − α)·EMA[i − 1]`. Defined everywhere.
pub fn exponential_moving_average(series: &Series, span: usize) -> Result<SmoothedSeries, AnalyticsError> {
    ensure_non_empty(series, "exponential moving average")?;
    let values = ema_values(&series.prices(), span)?;
    Ok(SmoothedSeries::new(values.into_iter().map(Some).collect()))
}

/// The dense EMA used by the regime segmenter.
pub(crate) fn ema_values(prices: &[f64], span: usize) -> Result<Vec<f64>, AnalyticsError> {
    if span == 0 {
        return Err(AnalyticsError::InvalidParameter(
            "EMA span must be at least 1".to_string(),
        ));
    }
    let mut ema = Ema::new(span)
        .map_err(|e| AnalyticsError::Indicator(format!("EMA({span}): {e:?}")))?;
    Ok(prices.iter().map(|p| ema.next(*p)).collect())
}
