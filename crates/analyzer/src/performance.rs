use crate::error::AnalyzerError;
use analytics::{
    AnalyticsError, MetricsInput, PerformanceMetrics, ReturnsEngine, ReturnsSeries, RiskEngine,
};
use configuration::AnalysisSettings;
use core_types::{PriceField, PriceRepository, PriceSeries, SourceError};
use futures::future::join_all;

/// A completed analysis: the metrics plus the series they were computed from.
///
/// Chart collaborators read the prices and returns from here; nothing is mutable.
#[derive(Debug, Clone)]
pub struct InstrumentAnalysis {
    prices: PriceSeries,
    returns: ReturnsSeries,
    metrics: PerformanceMetrics,
}

impl InstrumentAnalysis {
    pub fn prices(&self) -> &PriceSeries {
        &self.prices
    }

    pub fn returns(&self) -> &ReturnsSeries {
        &self.returns
    }

    pub fn metrics(&self) -> &PerformanceMetrics {
        &self.metrics
    }

    pub fn into_metrics(self) -> PerformanceMetrics {
        self.metrics
    }
}

/// An instrument that could not be analyzed during a batch run.
#[derive(Debug, Clone, PartialEq)]
pub struct InstrumentFailure {
    pub instrument_id: String,
    pub error: AnalyzerError,
}

/// The outcome of analyzing every instrument in the repository.
#[derive(Debug, Clone, Default)]
pub struct BatchAnalysis {
    pub metrics: Vec<PerformanceMetrics>,
    pub failures: Vec<InstrumentFailure>,
}

/// How `annualized_return` treats a cumulative return of `-1.0` or below.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Annualization {
    Strict,
    FloorAtTotalLoss,
}

/// Orchestrates the returns and risk engines over prices loaded from a repository.
pub struct PerformanceAnalyzer<R> {
    repository: R,
    returns: ReturnsEngine,
    risk: RiskEngine,
    settings: AnalysisSettings,
}

impl<R: PriceRepository> PerformanceAnalyzer<R> {
    pub fn new(repository: R, settings: AnalysisSettings) -> Self {
        Self {
            repository,
            returns: ReturnsEngine::new(),
            risk: RiskEngine::new(),
            settings,
        }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Runs the full analysis for one instrument.
    pub async fn analyze(&self, instrument_id: &str) -> Result<PerformanceMetrics, AnalyzerError> {
        Ok(self.analyze_detailed(instrument_id).await?.into_metrics())
    }

    /// Like `analyze`, but keeps the price and returns series alongside the metrics.
    pub async fn analyze_detailed(
        &self,
        instrument_id: &str,
    ) -> Result<InstrumentAnalysis, AnalyzerError> {
        let series = self.load_series(instrument_id).await?;
        self.evaluate(series)
    }

    /// Loads a series, translating a missing instrument into `AnalyzerError::NoData`.
    pub async fn load_series(&self, instrument_id: &str) -> Result<PriceSeries, AnalyzerError> {
        match self.repository.load_price_series(instrument_id).await {
            Ok(series) => Ok(series),
            Err(SourceError::NotFound(_)) => Err(AnalyzerError::NoData(instrument_id.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    /// The synchronous core of an analysis over an already-loaded series.
    pub fn evaluate(&self, prices: PriceSeries) -> Result<InstrumentAnalysis, AnalyzerError> {
        self.assemble(prices, Annualization::Strict)
    }

    /// Like `evaluate`, but a window that ends in total loss is still measured.
    ///
    /// Rankings only read the risk-adjusted ratios, which stay defined when wealth reaches
    /// zero. The annualized return of such a window is reported as `-1.0`.
    pub fn evaluate_for_ranking(
        &self,
        prices: PriceSeries,
    ) -> Result<InstrumentAnalysis, AnalyzerError> {
        self.assemble(prices, Annualization::FloorAtTotalLoss)
    }

    fn assemble(
        &self,
        prices: PriceSeries,
        annualization: Annualization,
    ) -> Result<InstrumentAnalysis, AnalyzerError> {
        let instrument_id = prices.instrument_id().to_string();
        if prices.is_empty() {
            return Err(AnalyzerError::NoData(instrument_id));
        }

        let missing = prices.missing_fields(&PriceField::REQUIRED);
        if !missing.is_empty() {
            return Err(AnalyticsError::Schema(missing).into());
        }
        let (Some(period_start), Some(period_end)) = (prices.first_date(), prices.last_date())
        else {
            return Err(AnalyticsError::Schema(vec![PriceField::Date]).into());
        };

        let returns = self.returns.cumulative_returns(&prices)?;
        let daily = returns.defined_returns();
        let cumulative = returns.cumulative_returns().unwrap_or_default();
        let total_return = returns.total_return().unwrap_or(0.0);

        let annualized_return = match self
            .returns
            .annualized_return(total_return, prices.len() as i64)
        {
            Err(AnalyticsError::InvalidReturn(_))
                if annualization == Annualization::FloorAtTotalLoss && total_return <= -1.0 =>
            {
                -1.0
            }
            other => other?,
        };

        let rf = self.settings.risk_free_rate;
        let metrics = PerformanceMetrics::from(MetricsInput {
            instrument_id,
            total_return,
            annualized_return,
            volatility: self.risk.volatility(&daily),
            sharpe_ratio: self.risk.sharpe_ratio(&daily, rf),
            sortino_ratio: self.risk.sortino_ratio(&daily, rf),
            calmar_ratio: self.risk.calmar_ratio(cumulative, &daily),
            max_drawdown: self.risk.max_drawdown(cumulative),
            observations: prices.len(),
            period_start,
            period_end,
        });

        tracing::info!(
            instrument = metrics.instrument_id(),
            total_return = metrics.total_return(),
            sharpe = metrics.sharpe_ratio(),
            "Analysis complete."
        );

        Ok(InstrumentAnalysis {
            prices,
            returns,
            metrics,
        })
    }

    /// Analyzes every instrument the repository knows about.
    ///
    /// Instruments run concurrently. A failing instrument is logged and recorded in
    /// `failures`; it never aborts the batch. Only listing the instruments can fail.
    pub async fn analyze_all(&self) -> Result<BatchAnalysis, AnalyzerError> {
        let instruments = self.repository.available_instruments().await?;

        let results = join_all(instruments.iter().map(|id| async move {
            (id, self.analyze(id).await)
        }))
        .await;

        let mut batch = BatchAnalysis::default();
        for (id, result) in results {
            match result {
                Ok(metrics) => batch.metrics.push(metrics),
                Err(error) => {
                    tracing::warn!(instrument = %id, %error, "Skipping instrument.");
                    batch.failures.push(InstrumentFailure {
                        instrument_id: id.clone(),
                        error,
                    });
                }
            }
        }
        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;
    use core_types::{InMemoryRepository, PriceRecord};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn series(id: &str, closes: &[f64]) -> PriceSeries {
        PriceSeries::from_closes(
            id,
            closes.iter().enumerate().map(|(i, c)| (day(i as u32 + 1), *c)),
        )
        .unwrap()
    }

    fn analyzer(repo: InMemoryRepository) -> PerformanceAnalyzer<InMemoryRepository> {
        PerformanceAnalyzer::new(repo, AnalysisSettings::default())
    }

    #[tokio::test]
    async fn test_unknown_instrument_is_no_data() {
        let result = analyzer(InMemoryRepository::new()).analyze("UNKNOWN").await;
        assert_eq!(result, Err(AnalyzerError::NoData("UNKNOWN".to_string())));
    }

    #[tokio::test]
    async fn test_analyze_known_series() {
        let repo = InMemoryRepository::new().with_series(series("SPY", &[100.0, 110.0, 99.0]));
        let metrics = analyzer(repo).analyze("SPY").await.unwrap();

        assert_eq!(metrics.instrument_id(), "SPY");
        assert_relative_eq!(metrics.total_return(), -0.01, epsilon = 1e-12);
        assert_relative_eq!(
            metrics.annualized_return(),
            0.99_f64.powf(252.0 / 3.0) - 1.0,
            epsilon = 1e-12
        );
        assert_relative_eq!(metrics.max_drawdown(), 0.99 / 1.10 - 1.0, epsilon = 1e-12);
        assert_eq!(metrics.observations(), 3);
        assert_eq!(metrics.period_start(), day(1));
        assert_eq!(metrics.period_end(), day(3));
        assert!(metrics.volatility() > 0.0);
    }

    #[tokio::test]
    async fn test_single_observation_is_neutral() {
        let repo = InMemoryRepository::new().with_series(series("NEW", &[50.0]));
        let metrics = analyzer(repo).analyze("NEW").await.unwrap();

        assert_eq!(metrics.total_return(), 0.0);
        assert_eq!(metrics.annualized_return(), 0.0);
        assert_eq!(metrics.volatility(), 0.0);
        assert_eq!(metrics.sharpe_ratio(), 0.0);
        assert_eq!(metrics.max_drawdown(), 0.0);
    }

    #[tokio::test]
    async fn test_missing_close_is_schema_error() {
        let records = vec![
            PriceRecord::daily_close(day(1), 10.0),
            PriceRecord {
                date: Some(day(2)),
                ..PriceRecord::default()
            },
        ];
        let repo = InMemoryRepository::new().with_series(PriceSeries::new("BAD", records).unwrap());
        let result = analyzer(repo).analyze("BAD").await;

        assert_eq!(
            result,
            Err(AnalyzerError::Analytics(AnalyticsError::Schema(vec![
                PriceField::Close
            ])))
        );
    }

    #[tokio::test]
    async fn test_missing_date_is_schema_error() {
        let records = vec![PriceRecord {
            close: Some(10.0),
            ..PriceRecord::default()
        }];
        let repo = InMemoryRepository::new().with_series(PriceSeries::new("NODATE", records).unwrap());
        let result = analyzer(repo).analyze("NODATE").await;

        assert_eq!(
            result,
            Err(AnalyzerError::Analytics(AnalyticsError::Schema(vec![
                PriceField::Date
            ])))
        );
    }

    #[test]
    fn test_evaluate_empty_series_is_no_data() {
        let empty = PriceSeries::new("EMPTY", vec![]).unwrap();
        let result = analyzer(InMemoryRepository::new()).evaluate(empty);
        assert!(matches!(result, Err(AnalyzerError::NoData(id)) if id == "EMPTY"));
    }

    #[test]
    fn test_total_loss_is_invalid_return() {
        let result = analyzer(InMemoryRepository::new()).evaluate(series("DEAD", &[10.0, 0.0]));
        assert!(matches!(
            result,
            Err(AnalyzerError::Analytics(AnalyticsError::InvalidReturn(_)))
        ));
    }

    #[test]
    fn test_total_loss_is_measured_for_ranking() {
        let analysis = analyzer(InMemoryRepository::new())
            .evaluate_for_ranking(series("DEAD", &[100.0, 50.0, 0.0]))
            .unwrap();
        let metrics = analysis.metrics();

        assert_relative_eq!(metrics.total_return(), -1.0, epsilon = 1e-12);
        assert_eq!(metrics.annualized_return(), -1.0);
        assert_relative_eq!(metrics.max_drawdown(), -1.0, epsilon = 1e-12);
        assert!(metrics.sharpe_ratio() < 0.0);
    }

    #[test]
    fn test_ranking_evaluation_still_checks_schema() {
        let records = vec![PriceRecord {
            date: Some(day(1)),
            ..PriceRecord::default()
        }];
        let result = analyzer(InMemoryRepository::new())
            .evaluate_for_ranking(PriceSeries::new("BAD", records).unwrap());
        assert!(matches!(
            result,
            Err(AnalyzerError::Analytics(AnalyticsError::Schema(_)))
        ));
    }

    #[tokio::test]
    async fn test_detailed_analysis_exposes_series() {
        let repo = InMemoryRepository::new().with_series(series("QQQ", &[10.0, 11.0, 12.1]));
        let analysis = analyzer(repo).analyze_detailed("QQQ").await.unwrap();

        assert_eq!(analysis.prices().len(), 3);
        assert_eq!(analysis.returns().len(), 3);
        assert_eq!(analysis.returns().defined_returns().len(), 2);
        assert_relative_eq!(analysis.metrics().total_return(), 0.21, epsilon = 1e-12);
    }

    #[tokio::test]
    async fn test_risk_free_rate_lowers_sharpe() {
        let repo = InMemoryRepository::new().with_series(series("SPY", &[100.0, 102.0, 101.0, 104.0]));
        let base = analyzer(repo.clone()).analyze("SPY").await.unwrap();
        let with_rf = PerformanceAnalyzer::new(
            repo,
            AnalysisSettings {
                risk_free_rate: 0.05,
            },
        )
        .analyze("SPY")
        .await
        .unwrap();

        assert!(with_rf.sharpe_ratio() < base.sharpe_ratio());
    }

    #[tokio::test]
    async fn test_batch_skips_failures() {
        let records = vec![PriceRecord {
            date: Some(day(1)),
            ..PriceRecord::default()
        }];
        let repo = InMemoryRepository::new()
            .with_series(series("SPY", &[100.0, 101.0, 102.0]))
            .with_series(PriceSeries::new("BAD", records).unwrap())
            .with_series(series("VTI", &[50.0, 49.0, 51.0]));

        let batch = analyzer(repo).analyze_all().await.unwrap();

        let ids: Vec<&str> = batch.metrics.iter().map(|m| m.instrument_id()).collect();
        assert_eq!(ids, vec!["SPY", "VTI"]);
        assert_eq!(batch.failures.len(), 1);
        assert_eq!(batch.failures[0].instrument_id, "BAD");
    }
}
