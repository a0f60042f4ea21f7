use crate::error::DbError;
use configuration::DatabaseSettings;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::env;
use std::time::Duration;

/// Establishes a connection pool to the PostgreSQL price store.
///
/// The URL comes from `settings.url`, falling back to the `DATABASE_URL` environment
/// variable. The pool can be shared across concurrent analyses.
pub async fn connect(settings: &DatabaseSettings) -> Result<PgPool, DbError> {
    let database_url = database_url(settings)?;

    let pool = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .acquire_timeout(Duration::from_secs(settings.acquire_timeout_secs))
        .connect(&database_url)
        .await?;

    tracing::debug!(max_connections = settings.max_connections, "Database pool ready.");
    Ok(pool)
}

/// Applies the embedded migrations, creating the `prices` and `etf_metadata` tables.
pub async fn run_migrations(pool: &PgPool) -> Result<(), DbError> {
    // Use a relative path from the crate root
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

fn database_url(settings: &DatabaseSettings) -> Result<String, DbError> {
    match &settings.url {
        Some(url) if !url.trim().is_empty() => Ok(url.clone()),
        _ => env::var("DATABASE_URL").map_err(|_e| {
            DbError::ConnectionConfigError("database.url or DATABASE_URL must be set.".to_string())
        }),
    }
}
