use crate::error::AnalyzerError;
use crate::performance::PerformanceAnalyzer;
use analytics::{AnalyticsError, PerformanceMetrics};
use chrono::{Days, NaiveDate};
use configuration::RankingSettings;
use core_types::{PriceField, PriceRepository};
use futures::future::join_all;
use std::cmp::Ordering;
use std::fmt;

/// Average days per month used to turn a lookback in months into a cutoff date.
const DAYS_PER_MONTH: f64 = 30.44;

/// The risk-adjusted ratios instruments can be ranked by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankingMetric {
    Sharpe,
    Sortino,
    Calmar,
}

impl RankingMetric {
    pub const ALL: [RankingMetric; 3] = [
        RankingMetric::Sharpe,
        RankingMetric::Sortino,
        RankingMetric::Calmar,
    ];

    pub fn value(&self, metrics: &PerformanceMetrics) -> f64 {
        match self {
            RankingMetric::Sharpe => metrics.sharpe_ratio(),
            RankingMetric::Sortino => metrics.sortino_ratio(),
            RankingMetric::Calmar => metrics.calmar_ratio(),
        }
    }
}

impl fmt::Display for RankingMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RankingMetric::Sharpe => "Sharpe",
            RankingMetric::Sortino => "Sortino",
            RankingMetric::Calmar => "Calmar",
        })
    }
}

/// The top instruments for each metric, best first.
#[derive(Debug, Clone, Default)]
pub struct Rankings {
    pub by_sharpe: Vec<PerformanceMetrics>,
    pub by_sortino: Vec<PerformanceMetrics>,
    pub by_calmar: Vec<PerformanceMetrics>,
    /// Instruments left out for thin history or errors.
    pub skipped: Vec<String>,
}

impl Rankings {
    pub fn get(&self, metric: RankingMetric) -> &[PerformanceMetrics] {
        match metric {
            RankingMetric::Sharpe => &self.by_sharpe,
            RankingMetric::Sortino => &self.by_sortino,
            RankingMetric::Calmar => &self.by_calmar,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.by_sharpe.is_empty()
    }
}

/// Ranks instruments by risk-adjusted return.
pub struct Ranker {
    settings: RankingSettings,
}

impl Ranker {
    pub fn new(settings: RankingSettings) -> Self {
        Self { settings }
    }

    /// Analyzes every instrument and keeps the best `top_n` per metric.
    ///
    /// With `months`, each series is first cut to the window ending at `as_of`.
    /// Series shorter than `min_observations` before or after the cut, or with no
    /// defined daily return, are skipped rather than treated as errors.
    pub async fn rank_all<R: PriceRepository>(
        &self,
        analyzer: &PerformanceAnalyzer<R>,
        as_of: NaiveDate,
        months: Option<u32>,
    ) -> Result<Rankings, AnalyzerError> {
        let instruments = analyzer.repository().available_instruments().await?;
        let cutoff = months.and_then(|m| lookback_cutoff(as_of, m));

        let results = join_all(instruments.iter().map(|id| async move {
            (id, self.evaluate_window(analyzer, id, cutoff).await)
        }))
        .await;

        let mut entries = Vec::new();
        let mut skipped = Vec::new();
        for (id, result) in results {
            match result {
                Ok(Some(metrics)) => entries.push(metrics),
                Ok(None) => {
                    tracing::debug!(instrument = %id, "Not enough history to rank.");
                    skipped.push(id.clone());
                }
                Err(error) => {
                    tracing::warn!(instrument = %id, %error, "Skipping instrument.");
                    skipped.push(id.clone());
                }
            }
        }

        Ok(Rankings {
            by_sharpe: self.top(&entries, RankingMetric::Sharpe),
            by_sortino: self.top(&entries, RankingMetric::Sortino),
            by_calmar: self.top(&entries, RankingMetric::Calmar),
            skipped,
        })
    }

    /// The best `top_n` entries by `metric`, descending. Ties keep their input order.
    pub fn top(&self, entries: &[PerformanceMetrics], metric: RankingMetric) -> Vec<PerformanceMetrics> {
        let mut ranked = entries.to_vec();
        ranked.sort_by(|a, b| {
            metric
                .value(b)
                .partial_cmp(&metric.value(a))
                .unwrap_or(Ordering::Equal)
        });
        ranked.truncate(self.settings.top_n);
        ranked
    }

    async fn evaluate_window<R: PriceRepository>(
        &self,
        analyzer: &PerformanceAnalyzer<R>,
        instrument_id: &str,
        cutoff: Option<NaiveDate>,
    ) -> Result<Option<PerformanceMetrics>, AnalyzerError> {
        let min = self.settings.min_observations;
        let series = analyzer.load_series(instrument_id).await?;
        if series.len() < min {
            return Ok(None);
        }

        let series = match cutoff {
            Some(cutoff) => {
                // The window drops undated records, so check the schema on the full history.
                let missing = series.missing_fields(&PriceField::REQUIRED);
                if !missing.is_empty() {
                    return Err(AnalyticsError::Schema(missing).into());
                }
                series.since(cutoff)
            }
            None => series,
        };
        if series.len() < min {
            return Ok(None);
        }

        let analysis = analyzer.evaluate_for_ranking(series)?;
        if analysis.returns().defined_returns().is_empty() {
            return Ok(None);
        }
        Ok(Some(analysis.into_metrics()))
    }
}

/// The first date inside a window of `months` ending at `as_of`.
fn lookback_cutoff(as_of: NaiveDate, months: u32) -> Option<NaiveDate> {
    let days = (f64::from(months) * DAYS_PER_MONTH).round() as u64;
    as_of.checked_sub_days(Days::new(days))
}
