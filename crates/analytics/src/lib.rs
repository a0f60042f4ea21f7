//! # ETF Lab Analytics Engine
//!
//! This crate turns a daily closing-price series into returns and risk statistics.
//!
//! ## Architectural Principles
//!
//! - **Layer 1 Logic:** This is a pure logic crate. It has no knowledge of storage or
//!   presentation. It depends only on `core-types` (Layer 0).
//! - **Stateless Calculation:** `ReturnsEngine` and `RiskEngine` hold no state. They take
//!   a series as input and return new values, never mutating what they were given.
//!
//! ## Public API
//!
//! - `ReturnsEngine`: daily, cumulative and annualized returns.
//! - `RiskEngine`: volatility, Sharpe, Sortino and Calmar ratios, maximum drawdown.
//! - `ReturnsSeries`: returns aligned with the source price records.
//! - `PerformanceMetrics`: the immutable per-instrument result record.
//! - `AnalyticsError`: the specific error types that can be returned from this crate.

pub mod error;
pub mod report;
pub mod returns;
pub mod risk;

pub use error::AnalyticsError;
pub use report::{MetricsInput, PerformanceMetrics};
pub use returns::{ReturnsEngine, ReturnsSeries, TRADING_DAYS_PER_YEAR};
pub use risk::RiskEngine;
