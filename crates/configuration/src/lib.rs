use crate::error::ConfigError;

// Declare the modules that make up this crate.
pub mod error;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use settings::{
    AnalysisSettings, Config, DatabaseSettings, LoggingSettings, RankingSettings,
};

const CONFIG_FILE: &str = "config.toml";
const ENV_PREFIX: &str = "ETFLAB";

/// Loads the application configuration.
///
/// Sources, later ones winning: built-in defaults, an optional `config.toml` in the
/// working directory, then `ETFLAB__SECTION__KEY` environment variables
/// (e.g. `ETFLAB__ANALYSIS__RISK_FREE_RATE=0.02`).
pub fn load_config() -> Result<Config, ConfigError> {
    let builder = config::Config::builder()
        .add_source(config::File::with_name(CONFIG_FILE).required(false))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    finish(builder)
}

/// Loads the configuration from a TOML document, without consulting the environment.
pub fn load_config_from_str(toml: &str) -> Result<Config, ConfigError> {
    let builder = config::Config::builder()
        .add_source(config::File::from_str(toml, config::FileFormat::Toml))
        .build()?;

    finish(builder)
}

fn finish(builder: config::Config) -> Result<Config, ConfigError> {
    // Attempt to deserialize the entire configuration into our `Config` struct
    let config = builder.try_deserialize::<Config>()?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<(), ConfigError> {
    if !config.analysis.risk_free_rate.is_finite() {
        return Err(ConfigError::ValidationError(
            "analysis.risk_free_rate must be a finite number".to_string(),
        ));
    }
    if config.ranking.top_n == 0 {
        return Err(ConfigError::ValidationError(
            "ranking.top_n must be at least 1".to_string(),
        ));
    }
    if config.ranking.min_observations < 2 {
        return Err(ConfigError::ValidationError(
            "ranking.min_observations must be at least 2".to_string(),
        ));
    }
    if config.database.max_connections == 0 {
        return Err(ConfigError::ValidationError(
            "database.max_connections must be at least 1".to_string(),
        ));
    }
    Ok(())
}
