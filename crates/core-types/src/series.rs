use crate::enums::PriceField;
use crate::error::CoreError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single daily observation for one instrument.
///
/// Every field is optional because storage allows NULLs. Only `date` and `close`
/// feed the analytics; the remaining fields are carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceRecord {
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub open: Option<f64>,
    #[serde(default)]
    pub high: Option<f64>,
    #[serde(default)]
    pub low: Option<f64>,
    #[serde(default)]
    pub close: Option<f64>,
    #[serde(default)]
    pub adj_close: Option<f64>,
    #[serde(default)]
    pub volume: Option<i64>,
}

impl PriceRecord {
    /// A record with only the two fields the analytics need.
    pub fn daily_close(date: NaiveDate, close: f64) -> Self {
        Self {
            date: Some(date),
            close: Some(close),
            ..Self::default()
        }
    }

    /// Whether this record carries a value for `field`.
    pub fn has(&self, field: PriceField) -> bool {
        match field {
            PriceField::Date => self.date.is_some(),
            PriceField::Open => self.open.is_some(),
            PriceField::High => self.high.is_some(),
            PriceField::Low => self.low.is_some(),
            PriceField::Close => self.close.is_some(),
            PriceField::AdjClose => self.adj_close.is_some(),
            PriceField::Volume => self.volume.is_some(),
        }
    }
}

/// An ordered, read-only sequence of daily observations for one instrument.
///
/// Dated records are strictly increasing; the constructor rejects anything else.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceSeries {
    instrument_id: String,
    records: Vec<PriceRecord>,
}

impl PriceSeries {
    pub fn new(
        instrument_id: impl Into<String>,
        records: Vec<PriceRecord>,
    ) -> Result<Self, CoreError> {
        let mut previous: Option<NaiveDate> = None;
        for (index, current) in records.iter().enumerate() {
            let Some(current) = current.date else {
                continue;
            };
            if let Some(previous) = previous {
                if current <= previous {
                    return Err(CoreError::UnorderedDates {
                        index,
                        previous,
                        current,
                    });
                }
            }
            previous = Some(current);
        }

        Ok(Self {
            instrument_id: instrument_id.into(),
            records,
        })
    }

    /// Builds a series from `(date, close)` pairs.
    pub fn from_closes(
        instrument_id: impl Into<String>,
        closes: impl IntoIterator<Item = (NaiveDate, f64)>,
    ) -> Result<Self, CoreError> {
        let records = closes
            .into_iter()
            .map(|(date, close)| PriceRecord::daily_close(date, close))
            .collect();
        Self::new(instrument_id, records)
    }

    pub fn instrument_id(&self) -> &str {
        &self.instrument_id
    }

    pub fn records(&self) -> &[PriceRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Fields from `required` that at least one record lacks.
    ///
    /// An empty series is not missing anything; emptiness is reported separately.
    pub fn missing_fields(&self, required: &[PriceField]) -> Vec<PriceField> {
        required
            .iter()
            .copied()
            .filter(|field| self.records.iter().any(|r| !r.has(*field)))
            .collect()
    }

    pub fn has_fields(&self, required: &[PriceField]) -> bool {
        self.missing_fields(required).is_empty()
    }

    /// The closing prices, or `None` if any record lacks one.
    pub fn closes(&self) -> Option<Vec<f64>> {
        self.records.iter().map(|r| r.close).collect()
    }

    pub fn dates(&self) -> Vec<Option<NaiveDate>> {
        self.records.iter().map(|r| r.date).collect()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.records.first().and_then(|r| r.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.records.last().and_then(|r| r.date)
    }

    /// A new series holding only the records dated on or after `cutoff`.
    pub fn since(&self, cutoff: NaiveDate) -> PriceSeries {
        let records = self
            .records
            .iter()
            .filter(|r| r.date.is_some_and(|d| d >= cutoff))
            .cloned()
            .collect();
        PriceSeries {
            instrument_id: self.instrument_id.clone(),
            records,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn test_rejects_duplicate_dates() {
        let result = PriceSeries::from_closes("SPY", [(day(2), 1.0), (day(2), 2.0)]);
        assert!(matches!(
            result,
            Err(CoreError::UnorderedDates { index: 1, .. })
        ));
    }

    #[test]
    fn test_rejects_decreasing_dates() {
        let result = PriceSeries::from_closes("SPY", [(day(3), 1.0), (day(2), 2.0)]);
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_close_is_reported() {
        let records = vec![
            PriceRecord::daily_close(day(2), 100.0),
            PriceRecord {
                date: Some(day(3)),
                ..PriceRecord::default()
            },
        ];
        let series = PriceSeries::new("SPY", records).unwrap();

        assert_eq!(
            series.missing_fields(&PriceField::REQUIRED),
            vec![PriceField::Close]
        );
        assert!(series.closes().is_none());
        assert!(series.has_fields(&[PriceField::Date]));
    }

    #[test]
    fn test_empty_series_misses_nothing() {
        let series = PriceSeries::new("SPY", vec![]).unwrap();
        assert!(series.has_fields(&PriceField::REQUIRED));
        assert!(series.first_date().is_none());
    }

    #[test]
    fn test_since_keeps_cutoff_day() {
        let series =
            PriceSeries::from_closes("SPY", [(day(2), 1.0), (day(3), 2.0), (day(4), 3.0)]).unwrap();
        let recent = series.since(day(3));

        assert_eq!(recent.len(), 2);
        assert_eq!(recent.first_date(), Some(day(3)));
        assert_eq!(recent.instrument_id(), "SPY");
    }

    #[test]
    fn test_record_deserializes_with_missing_fields() {
        let record: PriceRecord =
            serde_json::from_str(r#"{"date": "2024-01-02", "close": 101.5}"#).unwrap();
        assert_eq!(record, PriceRecord::daily_close(day(2), 101.5));
    }
}
