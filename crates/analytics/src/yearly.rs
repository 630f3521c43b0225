use crate::ensure_non_empty;
use crate::error::AnalyticsError;
use chrono::Datelike;
use core_types::Series;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Price extremes for one calendar year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearlyExtreme {
    pub year: i32,
    pub min: f64,
    pub max: f64,
    /// `max - min`
    pub range: f64,
    /// `max / min`
    pub growth_multiple: f64,
}

/// Averages across all `YearlyExtreme`s.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearlySummary {
    pub mean_range: f64,
    pub mean_growth_multiple: f64,
    /// `(mean_growth_multiple - 1) * 100`
    pub average_growth_pct: f64,
}

/// Groups the series by calendar year and computes min/max per year, ascending by year.
///
/// A year with a single observation has `range == 0` and `growth_multiple == 1`.
pub fn aggregate(series: &Series) -> Result<Vec<YearlyExtreme>, AnalyticsError> {
    ensure_non_empty(series, "yearly extremes")?;

    let mut years: BTreeMap<i32, (f64, f64)> = BTreeMap::new();
    for obs in series {
        years
            .entry(obs.timestamp.year())
            .and_modify(|(min, max)| {
                *min = min.min(obs.price);
                *max = max.max(obs.price);
            })
            .or_insert((obs.price, obs.price));
    }

    years
        .into_iter()
        .map(|(year, (min, max))| {
            if min <= 0.0 {
                return Err(AnalyticsError::DivisionByZero(format!("growth multiple for {year}")));
            }
            Ok(YearlyExtreme {
                year,
                min,
                max,
                range: max - min,
                growth_multiple: max / min,
            })
        })
        .collect()
}

/// Mean range and mean growth multiple across the given years.
pub fn summarize_years(yearly: &[YearlyExtreme]) -> Result<YearlySummary, AnalyticsError> {
    if yearly.is_empty() {
        return Err(AnalyticsError::EmptySeries("yearly summary".to_string()));
    }
    let count = yearly.len() as f64;
    let mean_range = yearly.iter().map(|y| y.range).sum::<f64>() / count;
    let mean_growth_multiple = yearly.iter().map(|y| y.growth_multiple).sum::<f64>() / count;

    Ok(YearlySummary {
        mean_range,
        mean_growth_multiple,
        average_growth_pct: (mean_growth_multiple - 1.0) * 100.0,
    })
}
