use crate::error::DcaError;
use crate::{overflow, price_to_decimal};
use chrono::{DateTime, Utc};
use core_types::{DcaPlan, Series};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One simulated purchase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DcaPurchase {
    pub timestamp: DateTime<Utc>,
    pub price: Decimal,
    pub units: Decimal,
    pub cumulative_spent: Decimal,
}

/// The outcome of replaying a `DcaPlan` against history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DcaResult {
    pub purchase_count: usize,
    pub total_spent: Decimal,
    pub total_units: Decimal,
    /// `total_spent / total_units`, or 0 when nothing was bought.
    pub average_cost: Decimal,
    pub purchases: Vec<DcaPurchase>,
}

/// Unrealized P&L of a `DcaResult` at a reference price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DcaValuation {
    pub reference_price: Decimal,
    pub current_value: Decimal,
    pub profit: Decimal,
    /// `profit / total_spent * 100`; absent when nothing was spent.
    pub roi_pct: Option<Decimal>,
}

impl DcaResult {
    /// Values the accumulated units at `reference_price`.
    pub fn valuate(&self, reference_price: Decimal) -> Result<DcaValuation, DcaError> {
        let current_value = self
            .total_units
            .checked_mul(reference_price)
            .ok_or_else(|| overflow("current value"))?;
        let profit = current_value
            .checked_sub(self.total_spent)
            .ok_or_else(|| overflow("profit"))?;
        let roi_pct = if self.total_spent.is_zero() {
            None
        } else {
            let roi = profit
                .checked_div(self.total_spent)
                .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
                .ok_or_else(|| overflow("roi"))?;
            Some(roi)
        };
        Ok(DcaValuation {
            reference_price,
            current_value,
            profit,
            roi_pct,
        })
    }
}

/// Replays `plan` against `series`.
///
/// The series is restricted to `[plan.start, plan.end]` (inclusive) and every
/// `plan.cadence_days`-th row of that range is bought, starting with the first.
/// The stride counts rows, not calendar days, so gaps in the data shift purchases.
/// An empty range is not an error: it yields zero purchases and a zero average cost.
pub fn simulate(series: &Series, plan: &DcaPlan) -> Result<DcaResult, DcaError> {
    if plan.amount_per_purchase <= Decimal::ZERO {
        return Err(DcaError::InvalidPlan(format!(
            "amount per purchase must be positive, got {}",
            plan.amount_per_purchase
        )));
    }
    if plan.cadence_days == 0 {
        return Err(DcaError::InvalidPlan("cadence must be at least 1".to_string()));
    }

    let in_range = series.between_dates(plan.start, plan.end);
    let amount = plan.amount_per_purchase;

    let mut purchases = Vec::new();
    let mut total_spent = Decimal::ZERO;
    let mut total_units = Decimal::ZERO;

    for obs in in_range.iter().step_by(plan.cadence_days as usize) {
        let price = price_to_decimal(obs.price)?;
        if price.is_zero() {
            return Err(DcaError::DivisionByZero(format!("units bought at {}", obs.timestamp)));
        }
        let units = amount
            .checked_div(price)
            .ok_or_else(|| overflow(&format!("units bought at {}", obs.timestamp)))?;
        total_spent = total_spent
            .checked_add(amount)
            .ok_or_else(|| overflow("total spent"))?;
        total_units = total_units
            .checked_add(units)
            .ok_or_else(|| overflow("total units"))?;
        purchases.push(DcaPurchase {
            timestamp: obs.timestamp,
            price,
            units,
            cumulative_spent: total_spent,
        });
    }

    let average_cost = if total_units.is_zero() {
        Decimal::ZERO
    } else {
        total_spent
            .checked_div(total_units)
            .ok_or_else(|| overflow("average cost"))?
    };

    tracing::debug!(
        rows_in_range = in_range.len(),
        purchases = purchases.len(),
        %total_spent,
        "DCA simulation complete"
    );

    Ok(DcaResult {
        purchase_count: purchases.len(),
        total_spent,
        total_units,
        average_cost,
        purchases,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate, TimeZone};
    use core_types::Observation;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // Irregular calendar spacing: gaps of 1, 2, 3, ... days.
    fn series(prices: &[f64]) -> Series {
        let mut at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let observations = prices
            .iter()
            .enumerate()
            .map(|(i, p)| {
                at += Duration::days(i as i64);
                Observation::new(at, *p).unwrap()
            })
            .collect();
        Series::new(observations).unwrap()
    }

    #[test]
    fn samples_every_nth_row_regardless_of_calendar_gaps() {
        let s = series(&[10.0, 1.0, 1.0, 20.0, 1.0, 1.0, 50.0, 1.0, 1.0]);
        let plan = DcaPlan::new(dec!(100), 3, date(2024, 1, 1), date(2024, 12, 31)).unwrap();
        let result = simulate(&s, &plan).unwrap();

        assert_eq!(result.purchase_count, 3);
        let bought_at: Vec<_> = result.purchases.iter().map(|p| p.timestamp).collect();
        let expected: Vec<_> = [0, 3, 6].iter().map(|&i| s.observations()[i].timestamp).collect();
        assert_eq!(bought_at, expected);

        assert_eq!(result.total_spent, dec!(300));
        assert_eq!(result.total_units, dec!(17));
        assert_eq!(result.average_cost, dec!(300) / dec!(17));
        assert_eq!(result.purchases[2].cumulative_spent, dec!(300));
    }

    #[test]
    fn range_is_inclusive_on_both_ends() {
        let s = series(&[10.0, 20.0, 40.0, 80.0]);
        // Rows fall on Jan 1, 2, 4, 7.
        let plan = DcaPlan::new(dec!(40), 1, date(2024, 1, 2), date(2024, 1, 4)).unwrap();
        let result = simulate(&s, &plan).unwrap();
        assert_eq!(result.purchase_count, 2);
        assert_eq!(result.total_units, dec!(3));
    }

    #[test]
    fn empty_range_yields_zero_average_without_error() {
        let s = series(&[10.0, 20.0]);
        let plan = DcaPlan::new(dec!(100), 7, date(2030, 1, 1), date(2030, 12, 31)).unwrap();
        let result = simulate(&s, &plan).unwrap();
        assert_eq!(result.purchase_count, 0);
        assert_eq!(result.total_spent, Decimal::ZERO);
        assert_eq!(result.average_cost, Decimal::ZERO);
        assert_eq!(result.valuate(dec!(50)).unwrap().roi_pct, None);
    }

    #[test]
    fn invalid_plans_are_rejected() {
        let s = series(&[10.0]);
        let mut plan = DcaPlan::new(dec!(100), 1, date(2024, 1, 1), date(2024, 1, 1)).unwrap();
        plan.cadence_days = 0;
        assert!(matches!(simulate(&s, &plan), Err(DcaError::InvalidPlan(_))));
    }

    #[test]
    fn tiny_price_overflow_is_an_error_not_a_panic() {
        let s = series(&[1e-27]);
        let plan = DcaPlan::new(dec!(100), 1, date(2024, 1, 1), date(2024, 1, 31)).unwrap();
        assert!(matches!(simulate(&s, &plan), Err(DcaError::Conversion(_))));
    }

    #[test]
    fn huge_reference_price_overflow_is_an_error() {
        let s = series(&[10.0, 20.0]);
        let plan = DcaPlan::new(dec!(100), 1, date(2024, 1, 1), date(2024, 1, 31)).unwrap();
        let result = simulate(&s, &plan).unwrap();
        assert!(matches!(result.valuate(Decimal::MAX), Err(DcaError::Conversion(_))));
    }

    #[test]
    fn valuation_reports_unrealized_profit() {
        let s = series(&[10.0, 20.0]);
        let plan = DcaPlan::new(dec!(100), 1, date(2024, 1, 1), date(2024, 1, 31)).unwrap();
        let result = simulate(&s, &plan).unwrap();
        assert_eq!(result.total_units, dec!(15));

        let valuation = result.valuate(dec!(20)).unwrap();
        assert_eq!(valuation.current_value, dec!(300));
        assert_eq!(valuation.profit, dec!(100));
        assert_eq!(valuation.roi_pct, Some(dec!(50)));
    }
}
