use crate::error::AnalyticsError;
use core_types::{ColumnRole, Series};
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A hypothetical price if market cap grew from its low by `multiplier`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetScenario {
    pub multiplier: Decimal,
    pub projected_price: Decimal,
}

/// A hypothetical price if market cap fell from its high by `drawdown_pct` percent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskScenario {
    pub drawdown_pct: Decimal,
    pub projected_price: Decimal,
}

/// The market-cap extremes and the latest supply of a series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketCapBounds {
    pub min_market_cap: f64,
    pub max_market_cap: f64,
    pub last_supply: f64,
}

impl MarketCapBounds {
    /// Reads the bounds from the optional columns of `series`.
    ///
    /// `last_supply` is the supply of the latest observation that carries one.
    /// Fails with `MissingField` when no observation has a market cap or a supply.
    pub fn from_series(series: &Series) -> Result<Self, AnalyticsError> {
        let (min_market_cap, max_market_cap) = series
            .iter()
            .filter_map(|o| o.market_cap)
            .fold(None, |acc: Option<(f64, f64)>, cap| match acc {
                None => Some((cap, cap)),
                Some((min, max)) => Some((min.min(cap), max.max(cap))),
            })
            .ok_or(AnalyticsError::MissingField(ColumnRole::MarketCap))?;

        let last_supply = series
            .iter()
            .rev()
            .find_map(|o| o.supply)
            .ok_or(AnalyticsError::MissingField(ColumnRole::Supply))?;

        Ok(Self {
            min_market_cap,
            max_market_cap,
            last_supply,
        })
    }
}

fn to_decimal(value: f64, name: &str) -> Result<Decimal, AnalyticsError> {
    Decimal::from_f64(value).ok_or_else(|| AnalyticsError::Conversion(format!("{name} = {value}")))
}

fn supply_to_decimal(last_supply: f64) -> Result<Decimal, AnalyticsError> {
    let supply = to_decimal(last_supply, "last_supply")?;
    if supply.is_zero() {
        return Err(AnalyticsError::DivisionByZero("last_supply".to_string()));
    }
    Ok(supply)
}

fn overflow(metric: &str) -> AnalyticsError {
    AnalyticsError::Conversion(format!("{metric} overflows the decimal range"))
}

/// `floor(min_market_cap * multiplier / last_supply)` for each multiplier, in order.
pub fn targets(
    min_market_cap: f64,
    last_supply: f64,
    multipliers: &[Decimal],
) -> Result<Vec<TargetScenario>, AnalyticsError> {
    let market_cap = to_decimal(min_market_cap, "min_market_cap")?;
    let supply = supply_to_decimal(last_supply)?;

    multipliers
        .iter()
        .map(|&multiplier| {
            let projected_price = market_cap
                .checked_mul(multiplier)
                .and_then(|cap| cap.checked_div(supply))
                .ok_or_else(|| overflow("target price"))?
                .floor();
            Ok(TargetScenario {
                multiplier,
                projected_price,
            })
        })
        .collect()
}

/// `floor(max_market_cap * (100 + drawdown) / 100 / last_supply)` for each drawdown, in order.
///
/// Drawdowns are negative percentages, e.g. `-60`.
pub fn risks(
    max_market_cap: f64,
    last_supply: f64,
    drawdown_pcts: &[Decimal],
) -> Result<Vec<RiskScenario>, AnalyticsError> {
    let market_cap = to_decimal(max_market_cap, "max_market_cap")?;
    let supply = supply_to_decimal(last_supply)?;
    let hundred = Decimal::ONE_HUNDRED;

    drawdown_pcts
        .iter()
        .map(|&drawdown_pct| {
            let projected_price = market_cap
                .checked_mul(hundred + drawdown_pct)
                .and_then(|cap| cap.checked_div(hundred))
                .and_then(|cap| cap.checked_div(supply))
                .ok_or_else(|| overflow("risk price"))?
                .floor();
            Ok(RiskScenario {
                drawdown_pct,
                projected_price,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use core_types::Observation;
    use rust_decimal_macros::dec;

    #[test]
    fn target_price_is_floored() {
        let scenarios = targets(1_000_000.0, 10_000.0, &[dec!(10)]).unwrap();
        assert_eq!(scenarios[0].projected_price, dec!(1000));

        let scenarios = targets(1_000_000.0, 3_000.0, &[dec!(5), dec!(10)]).unwrap();
        assert_eq!(scenarios[0].projected_price, dec!(1666));
        assert_eq!(scenarios[1].projected_price, dec!(3333));
        assert_eq!(scenarios[1].multiplier, dec!(10));
    }

    #[test]
    fn risk_price_applies_the_drawdown() {
        let scenarios = risks(2_000_000.0, 10_000.0, &[dec!(-60), dec!(-95)]).unwrap();
        assert_eq!(scenarios[0].projected_price, dec!(80));
        assert_eq!(scenarios[1].projected_price, dec!(10));
        assert_eq!(scenarios[1].drawdown_pct, dec!(-95));
    }

    #[test]
    fn zero_supply_is_a_division_error() {
        assert!(matches!(
            targets(1.0, 0.0, &[dec!(5)]),
            Err(AnalyticsError::DivisionByZero(_))
        ));
        assert!(matches!(
            risks(1.0, 0.0, &[dec!(-60)]),
            Err(AnalyticsError::DivisionByZero(_))
        ));
    }

    #[test]
    fn non_finite_inputs_are_rejected() {
        assert!(matches!(
            targets(f64::NAN, 1.0, &[dec!(5)]),
            Err(AnalyticsError::Conversion(_))
        ));
    }

    #[test]
    fn bounds_need_both_optional_columns() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let obs = |i: i64, cap: Option<f64>, supply: Option<f64>| {
            let mut o = Observation::new(start + Duration::days(i), 1.0).unwrap();
            o.market_cap = cap;
            o.supply = supply;
            o
        };

        let series = Series::new(vec![
            obs(0, Some(300.0), Some(10.0)),
            obs(1, Some(100.0), Some(20.0)),
            obs(2, Some(500.0), None),
        ])
        .unwrap();
        let bounds = MarketCapBounds::from_series(&series).unwrap();
        assert_eq!(bounds.min_market_cap, 100.0);
        assert_eq!(bounds.max_market_cap, 500.0);
        assert_eq!(bounds.last_supply, 20.0);

        let no_supply = Series::new(vec![obs(0, Some(1.0), None)]).unwrap();
        assert!(matches!(
            MarketCapBounds::from_series(&no_supply),
            Err(AnalyticsError::MissingField(ColumnRole::Supply))
        ));

        let no_cap = Series::new(vec![obs(0, None, Some(1.0))]).unwrap();
        assert!(matches!(
            MarketCapBounds::from_series(&no_cap),
            Err(AnalyticsError::MissingField(ColumnRole::MarketCap))
        ));
    }
}
