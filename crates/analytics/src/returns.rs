use crate::error::AnalyticsError;
use chrono::NaiveDate;
use core_types::{PriceField, PriceSeries};
use serde::Serialize;

/// Trading days in a year, the annualization convention used throughout.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Daily and cumulative returns aligned one-to-one with the records of a `PriceSeries`.
///
/// The first daily return is always undefined. Cumulative returns are only present
/// once the series has been compounded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReturnsSeries {
    dates: Vec<Option<NaiveDate>>,
    daily: Vec<Option<f64>>,
    cumulative: Option<Vec<f64>>,
}

impl ReturnsSeries {
    pub fn len(&self) -> usize {
        self.daily.len()
    }

    pub fn is_empty(&self) -> bool {
        self.daily.is_empty()
    }

    pub fn dates(&self) -> &[Option<NaiveDate>] {
        &self.dates
    }

    pub fn daily_returns(&self) -> &[Option<f64>] {
        &self.daily
    }

    /// The daily returns with undefined entries dropped.
    pub fn defined_returns(&self) -> Vec<f64> {
        self.daily.iter().flatten().copied().collect()
    }

    pub fn cumulative_returns(&self) -> Option<&[f64]> {
        self.cumulative.as_deref()
    }

    /// The last cumulative return, i.e. the total return over the series.
    pub fn total_return(&self) -> Option<f64> {
        self.cumulative.as_ref().and_then(|c| c.last().copied())
    }
}

/// A stateless calculator that turns prices into returns.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReturnsEngine;

impl ReturnsEngine {
    pub fn new() -> Self {
        Self
    }

    /// Percentage change of each close from the previous one.
    ///
    /// Fails with `AnalyticsError::Schema` when any record lacks a close.
    pub fn daily_returns(&self, prices: &PriceSeries) -> Result<ReturnsSeries, AnalyticsError> {
        let closes = prices
            .closes()
            .ok_or_else(|| AnalyticsError::Schema(vec![PriceField::Close]))?;

        let mut daily = Vec::with_capacity(closes.len());
        if !closes.is_empty() {
            daily.push(None);
        }
        // A zero previous close has no meaningful relative change.
        daily.extend(closes.windows(2).map(|w| {
            if w[0] == 0.0 {
                None
            } else {
                Some(w[1] / w[0] - 1.0)
            }
        }));

        Ok(ReturnsSeries {
            dates: prices.dates(),
            daily,
            cumulative: None,
        })
    }

    /// Daily returns compounded into a running total return.
    pub fn cumulative_returns(&self, prices: &PriceSeries) -> Result<ReturnsSeries, AnalyticsError> {
        let returns = self.compound(self.daily_returns(prices)?);
        tracing::debug!(
            instrument = prices.instrument_id(),
            observations = returns.len(),
            total_return = ?returns.total_return(),
            "Compounded daily returns."
        );
        Ok(returns)
    }

    /// Compounds a series that already carries daily returns.
    ///
    /// Undefined daily returns contribute nothing. Any previous cumulative values are
    /// recomputed, so compounding twice gives the same result.
    pub fn compound(&self, mut returns: ReturnsSeries) -> ReturnsSeries {
        let mut wealth = 1.0;
        let cumulative = returns
            .daily
            .iter()
            .map(|r| {
                wealth *= 1.0 + r.unwrap_or(0.0);
                wealth - 1.0
            })
            .collect();
        returns.cumulative = Some(cumulative);
        returns
    }

    /// Converts a total return over `period_length` trading days to a yearly rate.
    ///
    /// `(1 + cumulative_return)^(252 / period_length) - 1`
    pub fn annualized_return(
        &self,
        cumulative_return: f64,
        period_length: i64,
    ) -> Result<f64, AnalyticsError> {
        if period_length <= 0 {
            return Err(AnalyticsError::InvalidPeriod(period_length));
        }
        if !cumulative_return.is_finite() || cumulative_return <= -1.0 {
            return Err(AnalyticsError::InvalidReturn(cumulative_return));
        }

        let exponent = TRADING_DAYS_PER_YEAR / period_length as f64;
        Ok((1.0 + cumulative_return).powf(exponent) - 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use core_types::PriceRecord;

    fn series(closes: &[f64]) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        PriceSeries::from_closes(
            "TEST",
            closes
                .iter()
                .enumerate()
                .map(|(i, c)| (start + chrono::Days::new(i as u64), *c)),
        )
        .unwrap()
    }

    #[test]
    fn test_single_price_has_undefined_return() {
        let returns = ReturnsEngine::new().daily_returns(&series(&[100.0])).unwrap();
        assert_eq!(returns.daily_returns(), &[None]);
        assert!(returns.defined_returns().is_empty());
    }

    #[test]
    fn test_known_scenario() {
        let engine = ReturnsEngine::new();
        let returns = engine.cumulative_returns(&series(&[100.0, 110.0, 99.0])).unwrap();

        let daily = returns.daily_returns();
        assert_eq!(daily[0], None);
        assert_relative_eq!(daily[1].unwrap(), 0.10, epsilon = 1e-12);
        assert_relative_eq!(daily[2].unwrap(), -0.10, epsilon = 1e-12);

        let cumulative = returns.cumulative_returns().unwrap();
        assert_relative_eq!(cumulative[0], 0.0);
        assert_relative_eq!(cumulative[1], 0.10, epsilon = 1e-12);
        assert_relative_eq!(cumulative[2], -0.01, epsilon = 1e-12);
    }

    #[test]
    fn test_last_cumulative_is_product_of_returns() {
        let engine = ReturnsEngine::new();
        let returns = engine
            .cumulative_returns(&series(&[50.0, 52.0, 51.5, 55.0, 54.2, 60.1]))
            .unwrap();

        let expected = returns
            .defined_returns()
            .iter()
            .fold(1.0, |acc, r| acc * (1.0 + r))
            - 1.0;
        assert_relative_eq!(returns.total_return().unwrap(), expected, epsilon = 1e-12);
        assert_relative_eq!(returns.total_return().unwrap(), 60.1 / 50.0 - 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_compound_is_idempotent() {
        let engine = ReturnsEngine::new();
        let once = engine.cumulative_returns(&series(&[10.0, 12.0, 9.0])).unwrap();
        let twice = engine.compound(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_zero_price_yields_undefined_return() {
        let returns = ReturnsEngine::new()
            .cumulative_returns(&series(&[0.0, 5.0, 10.0]))
            .unwrap();
        assert_eq!(returns.daily_returns()[1], None);
        assert_relative_eq!(returns.total_return().unwrap(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_missing_close_is_schema_error() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let prices = PriceSeries::new(
            "TEST",
            vec![PriceRecord {
                date: Some(date),
                ..PriceRecord::default()
            }],
        )
        .unwrap();

        let result = ReturnsEngine::new().daily_returns(&prices);
        assert_eq!(result, Err(AnalyticsError::Schema(vec![PriceField::Close])));
    }

    #[test]
    fn test_annualized_return() {
        let engine = ReturnsEngine::new();
        assert_eq!(engine.annualized_return(0.0, 252).unwrap(), 0.0);
        assert_relative_eq!(engine.annualized_return(0.10, 252).unwrap(), 0.10, epsilon = 1e-12);
        assert_relative_eq!(
            engine.annualized_return(0.21, 504).unwrap(),
            0.10,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_annualized_return_rejects_bad_period() {
        let engine = ReturnsEngine::new();
        assert_eq!(
            engine.annualized_return(0.1, 0),
            Err(AnalyticsError::InvalidPeriod(0))
        );
        assert_eq!(
            engine.annualized_return(0.1, -5),
            Err(AnalyticsError::InvalidPeriod(-5))
        );
    }

    #[test]
    fn test_annualized_return_rejects_total_loss() {
        let engine = ReturnsEngine::new();
        assert_eq!(
            engine.annualized_return(-1.0, 252),
            Err(AnalyticsError::InvalidReturn(-1.0))
        );
        assert!(engine.annualized_return(-1.5, 252).is_err());
        assert!(engine.annualized_return(f64::NAN, 252).is_err());
    }
}
