pub mod enums;
pub mod error;
pub mod repository;
pub mod series;

// Re-export the core types to provide a clean public API.
pub use enums::PriceField;
pub use error::{CoreError, SourceError};
pub use repository::{InMemoryRepository, PriceRepository};
pub use series::{PriceRecord, PriceSeries};
