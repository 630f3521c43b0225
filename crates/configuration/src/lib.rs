use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use error::ConfigError;
pub use settings::{
    AnalysisParams, ColumnOverrides, Config, DcaFrequency, DcaSettings, MAX_DCA_YEARS,
    MAX_HISTOGRAM_BINS, RegimeStrategyKind,
};

/// The file consulted when no explicit path is given.
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Loads the application configuration.
///
/// Reads the TOML file at `path` (or `config.toml`) if it exists, layers
/// `CYCLE_LENS__SECTION__KEY` environment variables on top, and deserializes the
/// result into our strongly-typed `Config`. List keys take comma-separated values,
/// e.g. `CYCLE_LENS__ANALYSIS__SMA_WINDOWS=50,200`. Every missing section falls back to its
/// default, so an absent file yields `Config::default()`.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let file = match path {
        Some(p) => config::File::from(p).required(true),
        None => config::File::with_name(DEFAULT_CONFIG_FILE).required(false),
    };

    let builder = config::Config::builder()
        .add_source(file)
        .add_source(environment())
        .build()?;

    let config = builder.try_deserialize::<Config>()?;
    config.validate()?;

    tracing::debug!(?config, "Configuration loaded");
    Ok(config)
}

/// Keys holding sequences, split on commas when read from the environment.
const LIST_KEYS: [&str; 3] = [
    "analysis.sma_windows",
    "analysis.target_multipliers",
    "analysis.risk_drawdowns",
];

fn environment() -> config::Environment {
    LIST_KEYS.iter().fold(
        config::Environment::with_prefix("CYCLE_LENS")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true)
            .list_separator(","),
        |env, key| env.with_list_parse_key(key),
    )
}
