use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Dates must be strictly increasing: record {index} ({current}) does not follow {previous}")]
    UnorderedDates {
        index: usize,
        previous: NaiveDate,
        current: NaiveDate,
    },
}

/// Errors surfaced by a price repository collaborator.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SourceError {
    #[error("No price records found for {0}")]
    NotFound(String),

    #[error("Price source unavailable: {0}")]
    Unavailable(String),
}
