use crate::DbError;
use async_trait::async_trait;
use chrono::NaiveDate;
use core_types::{PriceField, PriceRecord, PriceRepository, PriceSeries, SourceError};
use serde::Deserialize;
use sqlx::postgres::PgPool;
use sqlx::FromRow;
use std::collections::HashMap;

/// The `DbRepository` provides a high-level, application-specific interface
/// to the price store. It encapsulates all SQL queries and data access logic.
#[derive(Debug, Clone)]
pub struct DbRepository {
    pool: PgPool,
}

/// A row fetched from the `prices` table.
#[derive(Debug, Clone, FromRow)]
struct PriceRow {
    date: NaiveDate,
    open: Option<f64>,
    high: Option<f64>,
    low: Option<f64>,
    close: Option<f64>,
    adj_close: Option<f64>,
    volume: Option<i64>,
}

impl From<PriceRow> for PriceRecord {
    fn from(row: PriceRow) -> Self {
        PriceRecord {
            date: Some(row.date),
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            adj_close: row.adj_close,
            volume: row.volume,
        }
    }
}

/// Per-ticker storage summary.
#[derive(Debug, Clone, FromRow)]
pub struct TickerSummary {
    pub ticker: String,
    pub row_count: i64,
    pub latest_date: Option<NaiveDate>,
}

/// Represents a row from the `etf_metadata` table.
///
/// Also deserializes from universe files, where the ticker column may be named `symbol`.
#[derive(Debug, Clone, Default, PartialEq, FromRow, Deserialize)]
#[serde(default)]
pub struct InstrumentMetadata {
    #[serde(alias = "symbol")]
    pub ticker: String,
    pub isin: Option<String>,
    pub asset_class: Option<String>,
    pub region: Option<String>,
    pub category: Option<String>,
    pub currency: Option<String>,
    pub exchange: Option<String>,
    pub description: Option<String>,
}

/// A stored ticker with its metadata, if any was loaded.
#[derive(Debug, Clone)]
pub struct TickerStatus {
    pub summary: TickerSummary,
    pub metadata: Option<InstrumentMetadata>,
}

impl DbRepository {
    /// Creates a new `DbRepository` with a shared database connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Saves a batch of daily prices for one ticker within a single transaction.
    ///
    /// Existing rows for the same `(ticker, date)` are replaced, so re-importing
    /// overlapping data is safe. Returns the number of rows written.
    pub async fn save_prices(&self, ticker: &str, records: &[PriceRecord]) -> Result<usize, DbError> {
        validate_batch(records)?;

        let mut tx = self.pool.begin().await?;
        for record in records {
            sqlx::query(
                r#"
                INSERT INTO prices (ticker, date, open, high, low, close, adj_close, volume)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                ON CONFLICT (ticker, date) DO UPDATE SET
                    open = EXCLUDED.open,
                    high = EXCLUDED.high,
                    low = EXCLUDED.low,
                    close = EXCLUDED.close,
                    adj_close = EXCLUDED.adj_close,
                    volume = EXCLUDED.volume
                "#,
            )
            .bind(ticker)
            .bind(record.date)
            .bind(record.open)
            .bind(record.high)
            .bind(record.low)
            .bind(record.close)
            .bind(record.adj_close)
            .bind(record.volume)
            .execute(&mut *tx) // Note: must use the transaction object `tx` here
            .await?;
        }
        tx.commit().await?;

        tracing::info!(ticker, rows = records.len(), "Saved prices.");
        Ok(records.len())
    }

    /// Fetches all prices for a ticker, ordered by date.
    pub async fn load_prices(&self, ticker: &str) -> Result<Vec<PriceRecord>, DbError> {
        let rows = sqlx::query_as::<_, PriceRow>(
            r#"
            SELECT date, open, high, low, close, adj_close, volume
            FROM prices
            WHERE ticker = $1
            ORDER BY date ASC
            "#,
        )
        .bind(ticker)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(PriceRecord::from).collect())
    }

    /// The most recent stored date for a ticker, if it has any prices.
    pub async fn get_latest_date(&self, ticker: &str) -> Result<Option<NaiveDate>, DbError> {
        let latest = sqlx::query_scalar::<_, Option<NaiveDate>>(
            "SELECT MAX(date) FROM prices WHERE ticker = $1",
        )
        .bind(ticker)
        .fetch_one(&self.pool)
        .await?;
        Ok(latest)
    }

    /// All tickers with stored prices, sorted.
    pub async fn get_available_tickers(&self) -> Result<Vec<String>, DbError> {
        let tickers =
            sqlx::query_scalar::<_, String>("SELECT DISTINCT ticker FROM prices ORDER BY ticker")
                .fetch_all(&self.pool)
                .await?;
        Ok(tickers)
    }

    /// Row count and latest date for every ticker.
    pub async fn row_counts(&self) -> Result<Vec<TickerSummary>, DbError> {
        let summaries = sqlx::query_as::<_, TickerSummary>(
            r#"
            SELECT ticker, COUNT(*) AS row_count, MAX(date) AS latest_date
            FROM prices
            GROUP BY ticker
            ORDER BY ticker
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(summaries)
    }

    /// Row counts joined with metadata, one entry per ticker that has prices.
    pub async fn ticker_status(&self) -> Result<Vec<TickerStatus>, DbError> {
        let (summaries, metadata) = tokio::join!(self.row_counts(), self.list_metadata());
        Ok(merge_status(summaries?, metadata?))
    }

    /// Upserts metadata rows within a single transaction. Returns the number of rows written.
    pub async fn save_metadata(&self, entries: &[InstrumentMetadata]) -> Result<usize, DbError> {
        validate_metadata(entries)?;

        let mut tx = self.pool.begin().await?;
        for meta in entries {
            sqlx::query(
                r#"
                INSERT INTO etf_metadata
                    (ticker, isin, asset_class, region, category, currency, exchange, description)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                ON CONFLICT (ticker) DO UPDATE SET
                    isin = EXCLUDED.isin,
                    asset_class = EXCLUDED.asset_class,
                    region = EXCLUDED.region,
                    category = EXCLUDED.category,
                    currency = EXCLUDED.currency,
                    exchange = EXCLUDED.exchange,
                    description = COALESCE(EXCLUDED.description, etf_metadata.description)
                "#,
            )
            .bind(meta.ticker.trim())
            .bind(meta.isin.as_deref())
            .bind(meta.asset_class.as_deref())
            .bind(meta.region.as_deref())
            .bind(meta.category.as_deref())
            .bind(meta.currency.as_deref())
            .bind(meta.exchange.as_deref())
            .bind(meta.description.as_deref())
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        tracing::info!(rows = entries.len(), "Saved instrument metadata.");
        Ok(entries.len())
    }

    /// Every metadata row, ordered by ticker.
    pub async fn list_metadata(&self) -> Result<Vec<InstrumentMetadata>, DbError> {
        let rows = sqlx::query_as::<_, InstrumentMetadata>(
            r#"
            SELECT ticker, isin, asset_class, region, category, currency, exchange, description
            FROM etf_metadata
            ORDER BY ticker
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Fetches the descriptive metadata for a ticker.
    pub async fn get_metadata(&self, ticker: &str) -> Result<InstrumentMetadata, DbError> {
        sqlx::query_as::<_, InstrumentMetadata>(
            r#"
            SELECT ticker, isin, asset_class, region, category, currency, exchange, description
            FROM etf_metadata
            WHERE ticker = $1
            "#,
        )
        .bind(ticker)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| if let sqlx::Error::RowNotFound = e { DbError::NotFound } else { e.into() })
    }
}

#[async_trait]
impl PriceRepository for DbRepository {
    async fn load_price_series(&self, instrument_id: &str) -> Result<PriceSeries, SourceError> {
        let records = self.load_prices(instrument_id).await?;
        if records.is_empty() {
            return Err(SourceError::NotFound(instrument_id.to_string()));
        }
        PriceSeries::new(instrument_id, records).map_err(|e| DbError::from(e).into())
    }

    async fn available_instruments(&self) -> Result<Vec<String>, SourceError> {
        Ok(self.get_available_tickers().await?)
    }
}

/// Checks a batch before it touches the database.
///
/// Every record needs a date (part of the primary key) and a close.
fn validate_batch(records: &[PriceRecord]) -> Result<(), DbError> {
    if records.is_empty() {
        return Err(DbError::EmptyBatch);
    }

    let missing: Vec<PriceField> = PriceField::REQUIRED
        .into_iter()
        .filter(|field| records.iter().any(|r| !r.has(*field)))
        .collect();
    if !missing.is_empty() {
        return Err(DbError::MissingFields(missing));
    }

    Ok(())
}

/// Checks a metadata batch before it touches the database.
///
/// Every entry needs a non-blank ticker (the primary key), unique within the batch.
fn validate_metadata(entries: &[InstrumentMetadata]) -> Result<(), DbError> {
    if entries.is_empty() {
        return Err(DbError::EmptyBatch);
    }

    let mut seen = HashMap::with_capacity(entries.len());
    for (index, meta) in entries.iter().enumerate() {
        let ticker = meta.ticker.trim();
        if ticker.is_empty() {
            return Err(DbError::InvalidMetadata(format!("entry {index} has no ticker")));
        }
        if let Some(first) = seen.insert(ticker, index) {
            return Err(DbError::InvalidMetadata(format!(
                "ticker {ticker} appears at entries {first} and {index}"
            )));
        }
    }

    Ok(())
}

fn merge_status(
    summaries: Vec<TickerSummary>,
    metadata: Vec<InstrumentMetadata>,
) -> Vec<TickerStatus> {
    let mut by_ticker: HashMap<String, InstrumentMetadata> = metadata
        .into_iter()
        .map(|meta| (meta.ticker.clone(), meta))
        .collect();

    summaries
        .into_iter()
        .map(|summary| TickerStatus {
            metadata: by_ticker.remove(&summary.ticker),
            summary,
        })
        .collect()
}
