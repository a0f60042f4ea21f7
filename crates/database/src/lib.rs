//! # ETF Lab Database Crate
//!
//! This crate is the application-specific interface to the PostgreSQL price store.
//!
//! ## Architectural Principles
//!
//! - **Adapter:** All SQL lives here. The rest of the workspace sees prices only through
//!   the `PriceRepository` trait from `core-types`, which `DbRepository` implements.
//! - **Asynchronous & Pooled:** All operations are asynchronous and share a `PgPool`.
//!
//! ## Public API
//!
//! - `connect`: establishes the connection pool from `DatabaseSettings`.
//! - `run_migrations`: applies the embedded schema migrations.
//! - `DbRepository`: saving and loading prices and instrument metadata, listing tickers.
//! - `DbError`: the specific error types that can be returned from this crate.

// Declare the modules that constitute this crate.
pub mod connection;
pub mod error;
pub mod repository;

// Re-export the key components to create a clean, public-facing API.
pub use connection::{connect, run_migrations};
pub use error::DbError;
pub use repository::{DbRepository, InstrumentMetadata, TickerStatus, TickerSummary};
