//! Per-instrument performance analysis and cross-instrument ranking.
//!
//! `PerformanceAnalyzer` loads one price series from a `PriceRepository`, runs it
//! through the returns and risk engines and assembles a `PerformanceMetrics` record.
//! `Ranker` applies it across every stored instrument.

pub mod error;
pub mod performance;
pub mod ranking;

pub use error::AnalyzerError;
pub use performance::{BatchAnalysis, InstrumentAnalysis, InstrumentFailure, PerformanceAnalyzer};
pub use ranking::{Ranker, RankingMetric, Rankings};
