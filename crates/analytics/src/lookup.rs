use crate::ensure_non_empty;
use crate::error::AnalyticsError;
use chrono::{DateTime, Utc};
use core_types::{Observation, Series};
use serde::{Deserialize, Serialize};

/// The move between two observations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodReturn {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub price_from: f64,
    pub price_to: f64,
    /// `(price_to - price_from) / price_from * 100`
    pub percent: f64,
    /// `price_to / price_from`
    pub multiple: f64,
}

/// The observation closest in time to `query`.
///
/// On an exact tie between the neighbours on either side, the earlier one wins.
pub fn nearest(series: &Series, query: DateTime<Utc>) -> Result<&Observation, AnalyticsError> {
    ensure_non_empty(series, "nearest observation")?;
    let observations = series.observations();

    let idx = observations.partition_point(|o| o.timestamp < query);
    let found = if idx == 0 {
        &observations[0]
    } else if idx == observations.len() {
        &observations[idx - 1]
    } else {
        let before = &observations[idx - 1];
        let after = &observations[idx];
        if after.timestamp - query < query - before.timestamp {
            after
        } else {
            before
        }
    };

    tracing::debug!(%query, matched = %found.timestamp, "Nearest observation resolved");
    Ok(found)
}

/// The return from `from` to `to`.
pub fn return_between(from: &Observation, to: &Observation) -> Result<PeriodReturn, AnalyticsError> {
    if from.price == 0.0 {
        return Err(AnalyticsError::DivisionByZero(format!(
            "return from {}",
            from.timestamp
        )));
    }
    Ok(PeriodReturn {
        from: from.timestamp,
        to: to.timestamp,
        price_from: from.price,
        price_to: to.price,
        percent: (to.price - from.price) / from.price * 100.0,
        multiple: to.price / from.price,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    // One observation every other day.
    fn series(prices: &[f64]) -> Series {
        let observations = prices
            .iter()
            .enumerate()
            .map(|(i, p)| Observation::new(start() + Duration::days(2 * i as i64), *p).unwrap())
            .collect();
        Series::new(observations).unwrap()
    }

    #[test]
    fn exact_timestamp_returns_that_observation() {
        let s = series(&[10.0, 20.0, 30.0]);
        let query = start() + Duration::days(2);
        let found = nearest(&s, query).unwrap();
        assert_eq!(found, &s.observations()[1]);
        assert_eq!(found.timestamp - query, Duration::zero());
    }

    #[test]
    fn picks_the_closer_neighbour_and_earlier_on_ties() {
        let s = series(&[10.0, 20.0, 30.0]);
        let closer_to_second = start() + Duration::hours(36);
        assert_eq!(nearest(&s, closer_to_second).unwrap().price, 20.0);

        let midway = start() + Duration::days(1);
        assert_eq!(nearest(&s, midway).unwrap().price, 10.0);
    }

    #[test]
    fn clamps_outside_the_series() {
        let s = series(&[10.0, 20.0, 30.0]);
        assert_eq!(nearest(&s, start() - Duration::days(100)).unwrap().price, 10.0);
        assert_eq!(nearest(&s, start() + Duration::days(100)).unwrap().price, 30.0);
        assert!(nearest(&Series::default(), start()).is_err());
    }

    #[test]
    fn return_between_two_lookups() {
        let s = series(&[50.0, 75.0, 100.0]);
        let a = nearest(&s, start()).unwrap();
        let b = nearest(&s, start() + Duration::days(4)).unwrap();
        let r = return_between(a, b).unwrap();
        assert!((r.percent - 100.0).abs() < 1e-12);
        assert!((r.multiple - 2.0).abs() < 1e-12);

        let down = return_between(b, a).unwrap();
        assert!((down.percent + 50.0).abs() < 1e-12);
    }

    #[test]
    fn zero_base_price_is_guarded() {
        // Bypasses the constructor to reach the guard.
        let mut a = Observation::new(start(), 1.0).unwrap();
        a.price = 0.0;
        let b = Observation::new(start(), 5.0).unwrap();
        assert!(matches!(
            return_between(&a, &b),
            Err(AnalyticsError::DivisionByZero(_))
        ));
    }
}
