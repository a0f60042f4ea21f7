use core_types::PriceField;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalyticsError {
    #[error("Missing required fields: {}", join_fields(.0))]
    Schema(Vec<PriceField>),

    #[error("Period length must be greater than zero, got {0}")]
    InvalidPeriod(i64),

    #[error("Cumulative return cannot be <= -1 (total loss), got {0}")]
    InvalidReturn(f64),
}

fn join_fields(fields: &[PriceField]) -> String {
    fields
        .iter()
        .map(PriceField::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
