use crate::error::ConfigError;
use chrono::NaiveDate;
use core_types::{CoreError, DcaPlan};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Upper bound on `analysis.histogram_bins`; bins are allocated up front.
pub const MAX_HISTOGRAM_BINS: usize = 10_000;

/// Upper bound on `dca.years` for forward projections.
pub const MAX_DCA_YEARS: u32 = 100;

/// The root configuration structure for the entire application.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub analysis: AnalysisParams,
    pub columns: ColumnOverrides,
    pub dca: DcaSettings,
}

impl Config {
    /// Rejects parameter combinations the analytics cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.analysis.validate()?;
        self.columns.validate()?;
        self.dca.validate()
    }
}

/// Which bull/bear mean algorithm the regime panel uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "snake_case")]
pub enum RegimeStrategyKind {
    /// Run-tracking extrema with the `sum / (count + 1)` mean.
    #[default]
    RunTracking,
    /// Plain mean of all prices strictly above / below the EMA.
    Arithmetic,
}

/// Parameters for the descriptive and projective analytics.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalysisParams {
    /// Trailing window in days; `None` analyzes the full history.
    pub window_days: Option<u32>,
    pub sma_windows: Vec<usize>,
    pub ema_span: usize,
    pub target_multipliers: Vec<Decimal>,
    /// Drawdowns in percent, negative (e.g. -60).
    pub risk_drawdowns: Vec<Decimal>,
    pub regime_strategy: RegimeStrategyKind,
    pub histogram_bins: usize,
}

impl Default for AnalysisParams {
    fn default() -> Self {
        Self {
            // 4 x 365, deliberately not leap-year aware.
            window_days: Some(4 * 365),
            sma_windows: vec![50, 200],
            ema_span: 55,
            target_multipliers: vec![
                dec!(5),
                dec!(10),
                dec!(15),
                dec!(20),
                dec!(30),
                dec!(40),
                dec!(50),
            ],
            risk_drawdowns: vec![dec!(-60), dec!(-70), dec!(-80), dec!(-90), dec!(-95)],
            regime_strategy: RegimeStrategyKind::default(),
            histogram_bins: 50,
        }
    }
}

impl AnalysisParams {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.window_days == Some(0) {
            return Err(ConfigError::ValidationError(
                "analysis.window_days must be at least 1 (omit it to disable the window)".to_string(),
            ));
        }
        if self.sma_windows.iter().any(|w| *w == 0) {
            return Err(ConfigError::ValidationError(
                "analysis.sma_windows must not contain 0".to_string(),
            ));
        }
        if self.ema_span == 0 {
            return Err(ConfigError::ValidationError(
                "analysis.ema_span must be at least 1".to_string(),
            ));
        }
        if self.target_multipliers.is_empty() {
            return Err(ConfigError::ValidationError(
                "analysis.target_multipliers must not be empty".to_string(),
            ));
        }
        if self.target_multipliers.iter().any(|m| *m <= Decimal::ZERO) {
            return Err(ConfigError::ValidationError(
                "analysis.target_multipliers must all be positive".to_string(),
            ));
        }
        if self
            .risk_drawdowns
            .iter()
            .any(|d| *d > Decimal::ZERO || *d <= dec!(-100))
        {
            return Err(ConfigError::ValidationError(
                "analysis.risk_drawdowns must lie in (-100, 0]".to_string(),
            ));
        }
        if self.histogram_bins == 0 || self.histogram_bins > MAX_HISTOGRAM_BINS {
            return Err(ConfigError::ValidationError(format!(
                "analysis.histogram_bins must be between 1 and {MAX_HISTOGRAM_BINS}"
            )));
        }
        Ok(())
    }
}

/// Column names in the source table.
///
/// The timestamp and price columns are required. The optional roles are
/// auto-detected by name unless pinned here.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ColumnOverrides {
    pub timestamp_column: String,
    pub price_column: String,
    pub market_cap: Option<String>,
    pub supply: Option<String>,
    pub ratio: Option<String>,
}

impl Default for ColumnOverrides {
    fn default() -> Self {
        Self {
            timestamp_column: "data".to_string(),
            price_column: "price".to_string(),
            market_cap: None,
            supply: None,
            ratio: None,
        }
    }
}

impl ColumnOverrides {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.timestamp_column.trim().is_empty() || self.price_column.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "columns.timestamp_column and columns.price_column must be set".to_string(),
            ));
        }
        Ok(())
    }
}

/// Purchase frequency for the forward DCA projection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "snake_case")]
pub enum DcaFrequency {
    #[default]
    Weekly,
    Monthly,
}

impl DcaFrequency {
    pub fn purchases_per_year(&self) -> u32 {
        match self {
            DcaFrequency::Weekly => 52,
            DcaFrequency::Monthly => 12,
        }
    }
}

/// Parameters for the DCA simulator and the forward projection.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DcaSettings {
    pub amount: Decimal,
    /// Row stride between simulated purchases.
    pub cadence_days: u32,
    /// Defaults to the first observation's date.
    pub start: Option<NaiveDate>,
    /// Defaults to the last observation's date.
    pub end: Option<NaiveDate>,
    pub frequency: DcaFrequency,
    pub years: u32,
    /// How many trailing rows feed the projected average price.
    pub lookback_rows: usize,
}

impl Default for DcaSettings {
    fn default() -> Self {
        Self {
            amount: dec!(100),
            cadence_days: 7,
            start: None,
            end: None,
            frequency: DcaFrequency::default(),
            years: 2,
            lookback_rows: 730,
        }
    }
}

impl DcaSettings {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.amount <= Decimal::ZERO {
            return Err(ConfigError::ValidationError(
                "dca.amount must be greater than zero".to_string(),
            ));
        }
        if self.cadence_days == 0 {
            return Err(ConfigError::ValidationError(
                "dca.cadence_days must be at least 1".to_string(),
            ));
        }
        if self.years == 0 || self.years > MAX_DCA_YEARS {
            return Err(ConfigError::ValidationError(format!(
                "dca.years must be between 1 and {MAX_DCA_YEARS}"
            )));
        }
        if self.lookback_rows == 0 {
            return Err(ConfigError::ValidationError(
                "dca.lookback_rows must be at least 1".to_string(),
            ));
        }
        if let (Some(start), Some(end)) = (self.start, self.end) {
            if start > end {
                return Err(ConfigError::ValidationError(format!(
                    "dca.start ({start}) is after dca.end ({end})"
                )));
            }
        }
        Ok(())
    }

    /// Builds the simulator plan, filling unset dates from the series bounds.
    pub fn to_plan(
        &self,
        series_start: NaiveDate,
        series_end: NaiveDate,
    ) -> Result<DcaPlan, CoreError> {
        DcaPlan::new(
            self.amount,
            self.cadence_days,
            self.start.unwrap_or(series_start),
            self.end.unwrap_or(series_end),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_parameters() {
        let config = Config::default();
        assert_eq!(config.analysis.window_days, Some(1460));
        assert_eq!(config.analysis.sma_windows, vec![50, 200]);
        assert_eq!(config.analysis.ema_span, 55);
        assert_eq!(config.analysis.target_multipliers.len(), 7);
        assert_eq!(config.analysis.risk_drawdowns.first(), Some(&dec!(-60)));
        assert_eq!(config.analysis.regime_strategy, RegimeStrategyKind::RunTracking);
        assert_eq!(config.columns.timestamp_column, "data");
        assert_eq!(config.columns.price_column, "price");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validation_rejects_degenerate_parameters() {
        let mut config = Config::default();
        config.analysis.ema_span = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.analysis.risk_drawdowns = vec![dec!(10)];
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.analysis.risk_drawdowns = vec![dec!(-100)];
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.dca.amount = Decimal::ZERO;
        assert!(config.validate().is_err());
    }

    #[test]
    fn oversized_allocations_are_rejected() {
        let mut config = Config::default();
        config.analysis.histogram_bins = 10_000_000_000;
        assert!(config.validate().is_err());
        config.analysis.histogram_bins = MAX_HISTOGRAM_BINS;
        assert!(config.validate().is_ok());

        let mut config = Config::default();
        config.dca.years = 80_000_000;
        assert!(config.validate().is_err());
        config.dca.years = MAX_DCA_YEARS;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_defaults_for_missing_keys() {
        let raw = r#"
            [analysis]
            ema_span = 21
            regime_strategy = "arithmetic"

            [dca]
            frequency = "monthly"
        "#;
        let config: Config = config::Config::builder()
            .add_source(config::File::from_str(raw, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.analysis.ema_span, 21);
        assert_eq!(config.analysis.regime_strategy, RegimeStrategyKind::Arithmetic);
        assert_eq!(config.analysis.sma_windows, vec![50, 200]);
        assert_eq!(config.dca.frequency, DcaFrequency::Monthly);
        assert_eq!(config.dca.frequency.purchases_per_year(), 12);
        assert_eq!(config.columns.price_column, "price");
    }

    #[test]
    fn plan_falls_back_to_series_bounds() {
        let settings = DcaSettings::default();
        let first = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap();
        let last = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let plan = settings.to_plan(first, last).unwrap();
        assert_eq!(plan.start, first);
        assert_eq!(plan.end, last);
        assert_eq!(plan.cadence_days, 7);
    }
}
