use anyhow::Context;
use database::InstrumentMetadata;
use std::io::Read;
use std::path::Path;

/// Reads instrument metadata from a universe file.
///
/// `.json` files hold an array of objects; anything else is read as CSV with a header row.
/// Columns other than the metadata fields are ignored.
pub fn read_metadata(path: &Path) -> anyhow::Result<Vec<InstrumentMetadata>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    let entries = if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json")) {
        serde_json::from_reader(file)?
    } else {
        parse_csv(file)?
    };
    Ok(entries)
}

pub fn parse_csv<R: Read>(reader: R) -> anyhow::Result<Vec<InstrumentMetadata>> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut entries = Vec::new();
    for (line, row) in reader.deserialize::<InstrumentMetadata>().enumerate() {
        // Line 1 is the header.
        entries.push(row.with_context(|| format!("Invalid metadata row on line {}", line + 2))?);
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_universe_csv_with_symbol_column() {
        let data = "\
symbol,name,isin,asset_class,region,category,currency,exchange
SPY,SPDR S&P 500,US78462F1030,Equity,US,Large Blend,USD,NYSE Arca
IWDA,iShares Core MSCI World,,Equity,Global,World,USD,LSE
";
        let entries = parse_csv(data.as_bytes()).unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].ticker, "SPY");
        assert_eq!(entries[0].isin.as_deref(), Some("US78462F1030"));
        assert_eq!(entries[0].exchange.as_deref(), Some("NYSE Arca"));
        assert_eq!(entries[1].ticker, "IWDA");
        assert!(entries[1].isin.is_none());
        assert!(entries[1].description.is_none());
    }

    #[test]
    fn test_csv_with_ticker_and_description() {
        let data = "ticker,description\nQQQ, Nasdaq 100 tracker \n";
        let entries = parse_csv(data.as_bytes()).unwrap();
        assert_eq!(entries[0].ticker, "QQQ");
        assert_eq!(entries[0].description.as_deref(), Some("Nasdaq 100 tracker"));
    }

    #[test]
    fn test_ragged_row_reports_its_line() {
        let data = "ticker,isin\nSPY,US78462F1030\nVTI\n";
        let error = parse_csv(data.as_bytes()).unwrap_err();
        assert!(error.to_string().contains("line 3"));
    }
}
