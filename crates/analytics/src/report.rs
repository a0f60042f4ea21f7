use chrono::NaiveDate;
use serde::Serialize;

/// The standardized performance record for one instrument over one period.
///
/// This is the output of a `PerformanceAnalyzer` run. It is a computed view, never
/// stored, and has no setters: every field is fixed at construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceMetrics {
    instrument_id: String,

    // I. Returns
    total_return: f64,
    annualized_return: f64,

    // II. Risk
    volatility: f64,
    sharpe_ratio: f64,
    sortino_ratio: f64,
    calmar_ratio: f64,
    max_drawdown: f64,

    // III. Period
    observations: usize,
    period_start: NaiveDate,
    period_end: NaiveDate,
}

/// Collects the inputs of a `PerformanceMetrics` record.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsInput {
    pub instrument_id: String,
    pub total_return: f64,
    pub annualized_return: f64,
    pub volatility: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub calmar_ratio: f64,
    pub max_drawdown: f64,
    pub observations: usize,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
}

impl From<MetricsInput> for PerformanceMetrics {
    fn from(input: MetricsInput) -> Self {
        Self {
            instrument_id: input.instrument_id,
            total_return: input.total_return,
            annualized_return: input.annualized_return,
            volatility: input.volatility,
            sharpe_ratio: input.sharpe_ratio,
            sortino_ratio: input.sortino_ratio,
            calmar_ratio: input.calmar_ratio,
            max_drawdown: input.max_drawdown,
            observations: input.observations,
            period_start: input.period_start,
            period_end: input.period_end,
        }
    }
}

impl PerformanceMetrics {
    pub fn instrument_id(&self) -> &str {
        &self.instrument_id
    }

    /// Compounded return from the first to the last observation.
    pub fn total_return(&self) -> f64 {
        self.total_return
    }

    pub fn annualized_return(&self) -> f64 {
        self.annualized_return
    }

    pub fn volatility(&self) -> f64 {
        self.volatility
    }

    pub fn sharpe_ratio(&self) -> f64 {
        self.sharpe_ratio
    }

    pub fn sortino_ratio(&self) -> f64 {
        self.sortino_ratio
    }

    pub fn calmar_ratio(&self) -> f64 {
        self.calmar_ratio
    }

    /// Deepest peak-to-trough decline, `<= 0.0`.
    pub fn max_drawdown(&self) -> f64 {
        self.max_drawdown
    }

    /// Number of price observations the record was computed from.
    pub fn observations(&self) -> usize {
        self.observations
    }

    pub fn period_start(&self) -> NaiveDate {
        self.period_start
    }

    pub fn period_end(&self) -> NaiveDate {
        self.period_end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_serialize_with_field_names() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let metrics = PerformanceMetrics::from(MetricsInput {
            instrument_id: "SPY".to_string(),
            total_return: 0.1,
            annualized_return: 0.1,
            volatility: 0.15,
            sharpe_ratio: 0.5,
            sortino_ratio: 0.7,
            calmar_ratio: 0.4,
            max_drawdown: -0.25,
            observations: 252,
            period_start: date,
            period_end: date,
        });

        let json = serde_json::to_value(&metrics).unwrap();
        assert_eq!(json["instrument_id"], "SPY");
        assert_eq!(json["max_drawdown"], -0.25);
        assert_eq!(json["period_start"], "2024-01-02");
    }
}
