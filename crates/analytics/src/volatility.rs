use crate::ensure_non_empty;
use crate::error::AnalyticsError;
use crate::smoothing::SmoothedSeries;
use core_types::Series;

/// Period-over-period change in percent: `(p[i] - p[i-1]) / p[i-1] * 100`.
///
/// The first entry is undefined. No smoothing or clipping is applied.
pub fn percent_change(series: &Series) -> Result<SmoothedSeries, AnalyticsError> {
    ensure_non_empty(series, "percent change")?;

    let observations = series.observations();
    let mut values = Vec::with_capacity(observations.len());
    values.push(None);

    for pair in observations.windows(2) {
        let (previous, current) = (pair[0].price, pair[1].price);
        if previous == 0.0 {
            return Err(AnalyticsError::DivisionByZero(format!(
                "percent change at {}",
                pair[1].timestamp
            )));
        }
        values.push(Some((current - previous) / previous * 100.0));
    }

    Ok(SmoothedSeries::new(values))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
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
    fn first_value_is_undefined_then_percent_moves() {
        let change = percent_change(&series(&[100.0, 110.0, 99.0])).unwrap();
        assert_eq!(change.len(), 3);
        assert_eq!(change.get(0), None);
        assert!((change.get(1).unwrap() - 10.0).abs() < 1e-9);
        assert!((change.get(2).unwrap() + 10.0).abs() < 1e-9);
    }

    #[test]
    fn single_observation_has_no_change() {
        let change = percent_change(&series(&[42.0])).unwrap();
        assert_eq!(change.values, vec![None]);
    }

    #[test]
    fn empty_series_is_an_error() {
        assert!(percent_change(&Series::default()).is_err());
    }
}
