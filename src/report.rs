use analytics::PerformanceMetrics;
use analyzer::RankingMetric;
use comfy_table::{presets::UTF8_FULL, Table};
use database::{InstrumentMetadata, TickerStatus};

pub fn pct(value: f64) -> String {
    format!("{:.2}%", value * 100.0)
}

pub fn ratio(value: f64) -> String {
    format!("{value:.2}")
}

/// The per-instrument performance table printed by `analyze`.
pub fn metrics_table(metrics: &[PerformanceMetrics]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec![
        "Ticker",
        "Period",
        "Total Return",
        "Annual Return",
        "Volatility",
        "Sharpe Ratio",
        "Max Drawdown",
    ]);

    for m in metrics {
        table.add_row(vec![
            m.instrument_id().to_string(),
            format!("{} to {}", m.period_start(), m.period_end()),
            pct(m.total_return()),
            pct(m.annualized_return()),
            pct(m.volatility()),
            ratio(m.sharpe_ratio()),
            pct(m.max_drawdown()),
        ]);
    }
    table
}

/// One ranking table. `label` describes each entry, e.g. with its ISIN.
pub fn ranking_table<F>(metric: RankingMetric, entries: &[PerformanceMetrics], label: F) -> Table
where
    F: Fn(&PerformanceMetrics) -> String,
{
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec![
        "#".to_string(),
        "Ticker".to_string(),
        "Description".to_string(),
        format!("{metric} Ratio"),
    ]);

    for (rank, m) in entries.iter().enumerate() {
        table.add_row(vec![
            (rank + 1).to_string(),
            m.instrument_id().to_string(),
            label(m),
            ratio(metric.value(m)),
        ]);
    }
    table
}

/// "description, ISIN", skipping whichever is missing.
pub fn describe(meta: &InstrumentMetadata) -> String {
    [meta.description.as_deref(), meta.isin.as_deref()]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(", ")
}

/// Row counts, freshness and metadata per ticker, printed by `status`.
pub fn status_table(status: &[TickerStatus]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec![
        "Ticker",
        "Rows",
        "Latest Date",
        "ISIN",
        "Exchange",
        "Description",
    ]);

    for s in status {
        let meta = s.metadata.as_ref();
        table.add_row(vec![
            s.summary.ticker.clone(),
            s.summary.row_count.to_string(),
            s.summary
                .latest_date
                .map(|d| d.to_string())
                .unwrap_or_else(|| "-".to_string()),
            or_dash(meta.and_then(|m| m.isin.as_deref())),
            or_dash(meta.and_then(|m| m.exchange.as_deref())),
            or_dash(meta.and_then(|m| m.description.as_deref())),
        ]);
    }
    table
}

fn or_dash(value: Option<&str>) -> String {
    value.unwrap_or("-").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use database::TickerSummary;

    #[test]
    fn test_pct_formats_two_decimals() {
        assert_eq!(pct(0.1234), "12.34%");
        assert_eq!(pct(-0.1), "-10.00%");
    }

    #[test]
    fn test_status_table_shows_metadata() {
        let table = status_table(&[
            TickerStatus {
                summary: TickerSummary {
                    ticker: "SPY".to_string(),
                    row_count: 250,
                    latest_date: None,
                },
                metadata: Some(InstrumentMetadata {
                    ticker: "SPY".to_string(),
                    isin: Some("US78462F1030".to_string()),
                    exchange: Some("NYSE Arca".to_string()),
                    ..InstrumentMetadata::default()
                }),
            },
            TickerStatus {
                summary: TickerSummary {
                    ticker: "VTI".to_string(),
                    row_count: 3,
                    latest_date: None,
                },
                metadata: None,
            },
        ]);
        let rendered = table.to_string();
        assert!(rendered.contains("US78462F1030"));
        assert!(rendered.contains("NYSE Arca"));
        assert!(rendered.contains("VTI"));
    }

    #[test]
    fn test_describe_skips_missing_parts() {
        let mut meta = InstrumentMetadata {
            ticker: "SPY".to_string(),
            isin: Some("US78462F1030".to_string()),
            ..InstrumentMetadata::default()
        };
        assert_eq!(describe(&meta), "US78462F1030");

        meta.description = Some("S&P 500".to_string());
        assert_eq!(describe(&meta), "S&P 500, US78462F1030");
        assert_eq!(describe(&InstrumentMetadata::default()), "");
    }
}
