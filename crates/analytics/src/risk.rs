//! Risk statistics over daily return series.
//!
//! Every function here is total: empty or degenerate input yields `0.0` instead of an
//! error, so a single thin-history instrument cannot abort a batch. The price of that is
//! ambiguity. A `0.0` may mean "measured and exactly zero" or "not enough data", and
//! callers that care must check the input length themselves.

use crate::returns::TRADING_DAYS_PER_YEAR;

/// A stateless calculator for volatility, risk-adjusted ratios and drawdown.
#[derive(Debug, Clone, Copy, Default)]
pub struct RiskEngine;

impl RiskEngine {
    pub fn new() -> Self {
        Self
    }

    /// Annualized sample standard deviation of daily returns.
    ///
    /// Returns `0.0` for fewer than two observations.
    pub fn volatility(&self, returns: &[f64]) -> f64 {
        sample_std_dev(returns) * TRADING_DAYS_PER_YEAR.sqrt()
    }

    /// Annualized excess return per unit of volatility.
    ///
    /// Returns `0.0` when `returns` is empty or its volatility is zero.
    pub fn sharpe_ratio(&self, returns: &[f64], risk_free_rate: f64) -> f64 {
        if returns.is_empty() {
            return 0.0;
        }
        let vol = self.volatility(returns);
        if vol > 0.0 {
            (annualized_mean(returns) - risk_free_rate) / vol
        } else {
            0.0
        }
    }

    /// Annualized excess return per unit of downside deviation.
    ///
    /// The downside deviation is the annualized sample standard deviation of the strictly
    /// negative returns. Returns `0.0` when there are none, or too few to measure.
    pub fn sortino_ratio(&self, returns: &[f64], risk_free_rate: f64) -> f64 {
        if returns.is_empty() {
            return 0.0;
        }
        let downside: Vec<f64> = returns.iter().copied().filter(|r| *r < 0.0).collect();
        let downside_deviation = sample_std_dev(&downside) * TRADING_DAYS_PER_YEAR.sqrt();
        if downside_deviation > 0.0 {
            (annualized_mean(returns) - risk_free_rate) / downside_deviation
        } else {
            0.0
        }
    }

    /// The deepest relative decline of the wealth index `1 + c` from its running peak.
    ///
    /// The peak is seeded at the first observation and only moves up. The result is
    /// always `<= 0.0`, and exactly `0.0` for an empty or non-decreasing series.
    pub fn max_drawdown(&self, cumulative_returns: &[f64]) -> f64 {
        let Some(first) = cumulative_returns.first() else {
            return 0.0;
        };

        let mut peak = 1.0 + first;
        let mut max_drawdown = 0.0_f64;
        for c in cumulative_returns {
            let wealth = 1.0 + c;
            if wealth >= peak {
                peak = wealth;
            }
            if peak <= 0.0 {
                continue;
            }
            let drawdown = (wealth - peak) / peak;
            if drawdown < max_drawdown {
                max_drawdown = drawdown;
            }
        }

        max_drawdown
    }

    /// Mean-annualized return over the magnitude of the maximum drawdown.
    ///
    /// Uses `mean(returns) * 252` rather than compounding. Returns `0.0` when either
    /// input is empty or there was no drawdown.
    pub fn calmar_ratio(&self, cumulative_returns: &[f64], returns: &[f64]) -> f64 {
        if cumulative_returns.is_empty() || returns.is_empty() {
            return 0.0;
        }
        let max_drawdown = self.max_drawdown(cumulative_returns);
        if max_drawdown == 0.0 {
            return 0.0;
        }
        annualized_mean(returns) / max_drawdown.abs()
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn annualized_mean(returns: &[f64]) -> f64 {
    mean(returns) * TRADING_DAYS_PER_YEAR
}

fn sample_std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = mean(values);
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}
