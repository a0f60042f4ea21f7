use analytics::AnalyticsError;
use core_types::SourceError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalyzerError {
    #[error("No data found for {0}")]
    NoData(String),

    #[error(transparent)]
    Analytics(#[from] AnalyticsError),

    #[error("Price source error: {0}")]
    Source(#[from] SourceError),
}
