use core_types::{PriceField, SourceError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Failed to load environment variables for database connection: {0}")]
    ConnectionConfigError(String),

    #[error("Database query failed: {0}")]
    ConnectionError(#[from] sqlx::Error),

    #[error("Database migration failed: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("Stored prices are inconsistent: {0}")]
    Series(#[from] core_types::CoreError),

    #[error("The requested data was not found in the database.")]
    NotFound,

    #[error("Refusing to save an empty batch of prices.")]
    EmptyBatch,

    #[error("Invalid instrument metadata: {0}")]
    InvalidMetadata(String),

    #[error("Price records are missing required fields: {0:?}")]
    MissingFields(Vec<PriceField>),
}

impl From<DbError> for SourceError {
    fn from(err: DbError) -> Self {
        SourceError::Unavailable(err.to_string())
    }
}
