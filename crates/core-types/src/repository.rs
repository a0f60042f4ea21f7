use crate::error::SourceError;
use crate::series::PriceSeries;
use async_trait::async_trait;
use std::collections::BTreeMap;

/// The read-side contract the analytics consume from whatever stores prices.
///
/// One call in, one series out. Implementations own their connection handling.
#[async_trait]
pub trait PriceRepository: Send + Sync {
    /// Loads the full, date-ordered series for an instrument.
    ///
    /// Fails with `SourceError::NotFound` when the instrument has no records.
    async fn load_price_series(&self, instrument_id: &str) -> Result<PriceSeries, SourceError>;

    /// Lists every instrument with stored prices, sorted.
    async fn available_instruments(&self) -> Result<Vec<String>, SourceError>;
}

/// A `PriceRepository` backed by a map, for tests and offline runs.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRepository {
    series: BTreeMap<String, PriceSeries>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the series stored under its instrument id.
    pub fn insert(&mut self, series: PriceSeries) {
        self.series
            .insert(series.instrument_id().to_string(), series);
    }

    pub fn with_series(mut self, series: PriceSeries) -> Self {
        self.insert(series);
        self
    }
}

#[async_trait]
impl PriceRepository for InMemoryRepository {
    async fn load_price_series(&self, instrument_id: &str) -> Result<PriceSeries, SourceError> {
        match self.series.get(instrument_id) {
            Some(series) if !series.is_empty() => Ok(series.clone()),
            _ => Err(SourceError::NotFound(instrument_id.to_string())),
        }
    }

    async fn available_instruments(&self) -> Result<Vec<String>, SourceError> {
        Ok(self.series.keys().cloned().collect())
    }
}
