use crate::ensure_non_empty;
use crate::error::AnalyticsError;
use chrono::{DateTime, Utc};
use configuration::MAX_HISTOGRAM_BINS;
use core_types::Series;
use serde::{Deserialize, Serialize};

/// Headline figures for the analyzed window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesSummary {
    pub observation_count: usize,
    pub first_timestamp: DateTime<Utc>,
    pub last_timestamp: DateTime<Utc>,
    pub min_price: f64,
    pub max_price: f64,
    pub last_price: f64,
}

/// One bucket of the price histogram. `upper` is exclusive except for the last bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

pub fn summarize(series: &Series) -> Result<SeriesSummary, AnalyticsError> {
    ensure_non_empty(series, "series summary")?;
    let observations = series.observations();
    let first = &observations[0];
    let last = &observations[observations.len() - 1];

    let (min_price, max_price) = observations
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), o| {
            (min.min(o.price), max.max(o.price))
        });

    Ok(SeriesSummary {
        observation_count: observations.len(),
        first_timestamp: first.timestamp,
        last_timestamp: last.timestamp,
        min_price,
        max_price,
        last_price: last.price,
    })
}

/// How many observations fall in each of `bins` equal-width price buckets.
///
/// A flat series collapses into a single bucket holding every observation.
pub fn price_histogram(series: &Series, bins: usize) -> Result<Vec<PriceBin>, AnalyticsError> {
    if bins == 0 || bins > MAX_HISTOGRAM_BINS {
        return Err(AnalyticsError::InvalidParameter(format!(
            "histogram needs between 1 and {MAX_HISTOGRAM_BINS} bins, got {bins}"
        )));
    }
    let summary = summarize(series)?;
    let (min, max) = (summary.min_price, summary.max_price);

    if max == min {
        return Ok(vec![PriceBin {
            lower: min,
            upper: max,
            count: series.len(),
        }]);
    }

    let width = (max - min) / bins as f64;
    let mut histogram: Vec<PriceBin> = (0..bins)
        .map(|i| PriceBin {
            lower: min + width * i as f64,
            upper: if i + 1 == bins { max } else { min + width * (i + 1) as f64 },
            count: 0,
        })
        .collect();

    for obs in series {
        let slot = (((obs.price - min) / width).floor() as usize).min(bins - 1);
        histogram[slot].count += 1;
    }

    Ok(histogram)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use core_types::Observation;

    fn series(prices: &[f64]) -> Series {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let observations = prices
            .iter()
            .enumerate()
            .map(|(i, p)| Observation::new(start + Duration::days(i as i64), *p).unwrap())
            .collect();
        Series::new(observations).unwrap()
    }

    #[test]
    fn summary_reports_extremes_and_last_price() {
        let summary = summarize(&series(&[5.0, 9.0, 2.0, 4.0])).unwrap();
        assert_eq!(summary.observation_count, 4);
        assert_eq!(summary.min_price, 2.0);
        assert_eq!(summary.max_price, 9.0);
        assert_eq!(summary.last_price, 4.0);
        assert!(summary.first_timestamp < summary.last_timestamp);
    }

    #[test]
    fn histogram_counts_every_observation_once() {
        let s = series(&[0.5, 1.0, 1.5, 2.0, 2.5, 3.0, 10.0]);
        let histogram = price_histogram(&s, 4).unwrap();
        assert_eq!(histogram.len(), 4);
        assert_eq!(histogram.iter().map(|b| b.count).sum::<usize>(), 7);
        // The maximum lands in the last, right-closed bucket.
        assert_eq!(histogram[3].count, 1);
        assert_eq!(histogram[3].upper, 10.0);
        assert_eq!(histogram[0].lower, 0.5);
    }

    #[test]
    fn flat_series_is_a_single_bucket() {
        let histogram = price_histogram(&series(&[3.0, 3.0, 3.0]), 50).unwrap();
        assert_eq!(histogram.len(), 1);
        assert_eq!(histogram[0].count, 3);
    }

    #[test]
    fn out_of_range_bin_counts_are_rejected() {
        for bins in [0, MAX_HISTOGRAM_BINS + 1, 10_000_000_000] {
            assert!(matches!(
                price_histogram(&series(&[1.0, 2.0]), bins),
                Err(AnalyticsError::InvalidParameter(_))
            ));
        }
        assert_eq!(
            price_histogram(&series(&[1.0, 2.0]), MAX_HISTOGRAM_BINS).unwrap().len(),
            MAX_HISTOGRAM_BINS
        );
    }
}
