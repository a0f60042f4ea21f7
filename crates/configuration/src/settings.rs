use serde::Deserialize;
use std::path::PathBuf;

/// The root configuration structure for the entire application.
///
/// Every section has defaults, so an absent `config.toml` is a valid setup.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseSettings,
    pub analysis: AnalysisSettings,
    pub ranking: RankingSettings,
    pub logging: LoggingSettings,
}

/// Contains parameters for the price store connection pool.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// Connection string. Falls back to the `DATABASE_URL` environment variable.
    pub url: Option<String>,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
}

/// Contains parameters for single-instrument analysis.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    /// Annual risk-free rate subtracted in the Sharpe and Sortino numerators.
    /// 0.02 corresponds to 2%.
    pub risk_free_rate: f64,
}

/// Contains parameters for ranking instruments by risk-adjusted return.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RankingSettings {
    /// How many instruments to keep per metric.
    pub top_n: usize,
    /// Instruments with fewer price observations are skipped.
    pub min_observations: usize,
    /// Default lookback window in months. `None` uses the full history.
    pub months: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default filter directive, overridden by `RUST_LOG`.
    pub level: String,
    /// When set, logs are also written to a daily-rolling file in this directory.
    pub directory: Option<PathBuf>,
}

// --- Default Implementations ---

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 10,
            acquire_timeout_secs: 5,
        }
    }
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            risk_free_rate: 0.0,
        }
    }
}

impl Default for RankingSettings {
    fn default() -> Self {
        Self {
            top_n: 5,
            min_observations: 2,
            months: None,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
        }
    }
}
