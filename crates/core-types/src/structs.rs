use crate::enums::ColumnRole;
use crate::error::CoreError;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single row of the price table after normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
    pub market_cap: Option<f64>,
    pub supply: Option<f64>,
    pub ratio: Option<f64>,
}

impl Observation {
    /// Creates an observation with no optional fields.
    ///
    /// Fails when the price is not a finite, strictly positive number.
    pub fn new(timestamp: DateTime<Utc>, price: f64) -> Result<Self, CoreError> {
        if !price.is_finite() || price <= 0.0 {
            return Err(CoreError::InvalidPrice(price));
        }
        Ok(Self {
            timestamp,
            price,
            market_cap: None,
            supply: None,
            ratio: None,
        })
    }

    pub fn with_market_cap(mut self, market_cap: f64) -> Self {
        self.market_cap = Some(market_cap);
        self
    }

    pub fn with_supply(mut self, supply: f64) -> Self {
        self.supply = Some(supply);
        self
    }

    pub fn with_ratio(mut self, ratio: f64) -> Self {
        self.ratio = Some(ratio);
        self
    }

    /// The value carried for an optional role, if any.
    pub fn value(&self, role: ColumnRole) -> Option<f64> {
        match role {
            ColumnRole::MarketCap => self.market_cap,
            ColumnRole::Supply => self.supply,
            ColumnRole::Ratio => self.ratio,
        }
    }
}

/// An ordered, immutable run of observations with strictly ascending timestamps.
///
/// A `Series` is never edited in place. Windowing or range selection produces a new one.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Series {
    observations: Vec<Observation>,
}

impl Series {
    /// Builds a series from observations that are already sorted and unique.
    pub fn new(observations: Vec<Observation>) -> Result<Self, CoreError> {
        for pair in observations.windows(2) {
            if pair[1].timestamp <= pair[0].timestamp {
                return Err(CoreError::OutOfOrder {
                    previous: pair[0].timestamp,
                    next: pair[1].timestamp,
                });
            }
        }
        if let Some(bad) = observations
            .iter()
            .find(|o| !o.price.is_finite() || o.price <= 0.0)
        {
            return Err(CoreError::InvalidPrice(bad.price));
        }
        Ok(Self { observations })
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Observation> {
        self.observations.iter()
    }

    pub fn first(&self) -> Option<&Observation> {
        self.observations.first()
    }

    pub fn last(&self) -> Option<&Observation> {
        self.observations.last()
    }

    pub fn prices(&self) -> Vec<f64> {
        self.observations.iter().map(|o| o.price).collect()
    }

    /// The trailing `n` observations (all of them when the series is shorter).
    pub fn tail(&self, n: usize) -> &[Observation] {
        let start = self.observations.len().saturating_sub(n);
        &self.observations[start..]
    }

    /// Observations strictly after `cutoff`.
    pub fn since(&self, cutoff: DateTime<Utc>) -> Series {
        let start = self.observations.partition_point(|o| o.timestamp <= cutoff);
        Series {
            observations: self.observations[start..].to_vec(),
        }
    }

    /// Observations whose calendar date falls in `[start, end]`, both ends inclusive.
    pub fn between_dates(&self, start: NaiveDate, end: NaiveDate) -> Series {
        let observations = self
            .observations
            .iter()
            .filter(|o| {
                let date = o.timestamp.date_naive();
                date >= start && date <= end
            })
            .cloned()
            .collect();
        Series { observations }
    }

    /// True when at least one observation carries a value for `role`.
    pub fn has_role(&self, role: ColumnRole) -> bool {
        self.observations.iter().any(|o| o.value(role).is_some())
    }
}

impl<'a> IntoIterator for &'a Series {
    type Item = &'a Observation;
    type IntoIter = std::slice::Iter<'a, Observation>;

    fn into_iter(self) -> Self::IntoIter {
        self.observations.iter()
    }
}

/// A fixed-amount, fixed-cadence purchase plan over a date range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DcaPlan {
    pub amount_per_purchase: Decimal,
    /// Stride in rows between purchases, not calendar days.
    pub cadence_days: u32,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DcaPlan {
    /// Creates a plan, validating that it describes at least one possible purchase.
    pub fn new(
        amount_per_purchase: Decimal,
        cadence_days: u32,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Self, CoreError> {
        if amount_per_purchase <= Decimal::ZERO {
            return Err(CoreError::InvalidInput(
                "amount_per_purchase".to_string(),
                format!("must be greater than zero, got {amount_per_purchase}"),
            ));
        }
        if cadence_days == 0 {
            return Err(CoreError::InvalidInput(
                "cadence_days".to_string(),
                "must be at least 1".to_string(),
            ));
        }
        if start > end {
            return Err(CoreError::InvalidInput(
                "date range".to_string(),
                format!("start {start} is after end {end}"),
            ));
        }
        Ok(Self {
            amount_per_purchase,
            cadence_days,
            start,
            end,
        })
    }
}
