use serde::{Deserialize, Serialize};
use std::fmt;

/// The named fields a daily price observation can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceField {
    Date,
    Open,
    High,
    Low,
    Close,
    AdjClose,
    Volume,
}

impl PriceField {
    /// The fields every analysis needs.
    pub const REQUIRED: [PriceField; 2] = [PriceField::Close, PriceField::Date];

    /// Returns the lowercase column name used by storage and error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            PriceField::Date => "date",
            PriceField::Open => "open",
            PriceField::High => "high",
            PriceField::Low => "low",
            PriceField::Close => "close",
            PriceField::AdjClose => "adj_close",
            PriceField::Volume => "volume",
        }
    }
}

impl fmt::Display for PriceField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
