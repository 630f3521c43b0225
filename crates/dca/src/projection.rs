use crate::error::DcaError;
use crate::{overflow, price_to_decimal};
use configuration::{DcaFrequency, DcaSettings, MAX_DCA_YEARS};
use core_types::Series;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A forward estimate of a recurring purchase plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DcaProjection {
    pub frequency: DcaFrequency,
    pub years: u32,
    pub purchase_count: u32,
    pub total_invested: Decimal,
    /// Mean price of the trailing `lookback_rows` observations.
    pub average_price: Decimal,
    pub total_units: Decimal,
    /// Cumulative capital after each purchase.
    pub invested_curve: Vec<Decimal>,
}

/// Projects `settings.amount` bought `settings.frequency` for `settings.years`,
/// assuming every purchase fills at the recent average price.
pub fn project(series: &Series, settings: &DcaSettings) -> Result<DcaProjection, DcaError> {
    if series.is_empty() {
        return Err(DcaError::EmptySeries("DCA projection".to_string()));
    }
    if settings.amount <= Decimal::ZERO {
        return Err(DcaError::InvalidPlan(format!(
            "amount must be positive, got {}",
            settings.amount
        )));
    }
    if settings.lookback_rows == 0 {
        return Err(DcaError::InvalidPlan("lookback must cover at least one row".to_string()));
    }

    if settings.years == 0 || settings.years > MAX_DCA_YEARS {
        return Err(DcaError::InvalidPlan(format!(
            "years must be between 1 and {MAX_DCA_YEARS}, got {}",
            settings.years
        )));
    }
    let purchase_count = settings.years * settings.frequency.purchases_per_year();

    let recent = series.tail(settings.lookback_rows);
    let mut sum = Decimal::ZERO;
    for obs in recent {
        sum = sum
            .checked_add(price_to_decimal(obs.price)?)
            .ok_or_else(|| overflow("price sum"))?;
    }
    let average_price = sum / Decimal::from(recent.len());
    if average_price.is_zero() {
        return Err(DcaError::DivisionByZero("projected units".to_string()));
    }

    let invested_curve = (1..=purchase_count)
        .map(|n| {
            settings
                .amount
                .checked_mul(Decimal::from(n))
                .ok_or_else(|| overflow("invested capital"))
        })
        .collect::<Result<Vec<_>, _>>()?;
    let total_invested = invested_curve.last().copied().unwrap_or(Decimal::ZERO);
    let total_units = total_invested
        .checked_div(average_price)
        .ok_or_else(|| overflow("projected units"))?;

    tracing::debug!(
        purchase_count,
        %average_price,
        lookback = recent.len(),
        "DCA projection complete"
    );

    Ok(DcaProjection {
        frequency: settings.frequency,
        years: settings.years,
        purchase_count,
        total_invested,
        average_price,
        total_units,
        invested_curve,
    })
}
