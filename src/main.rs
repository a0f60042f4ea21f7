use analyzer::{PerformanceAnalyzer, Ranker, RankingMetric};
use anyhow::Context;
use clap::{Parser, Subcommand};
use configuration::{Config, LoggingSettings};
use core_types::PriceRecord;
use database::{DbRepository, connect, run_migrations};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

mod report;
mod universe;

/// The main entry point for the ETF Lab analysis tool.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file, if there is one
    dotenvy::dotenv().ok();

    // Parse command-line arguments
    let cli = Cli::parse();

    let config = configuration::load_config().context("Failed to load configuration")?;
    let _log_guard = init_logging(&config.logging)?;
    tracing::debug!(?config, "Configuration loaded.");

    // Initialize the database connection and run migrations
    let db_pool = connect(&config.database)
        .await
        .context("Failed to connect to the database")?;
    run_migrations(&db_pool)
        .await
        .context("Failed to run database migrations")?;
    let db_repo = DbRepository::new(db_pool);

    // Execute the appropriate command
    match cli.command {
        Commands::Analyze(args) => handle_analyze(args, db_repo, &config).await,
        Commands::Rank(args) => handle_rank(args, db_repo, &config).await,
        Commands::Import(args) => handle_import(args, db_repo).await,
        Commands::ImportMetadata(args) => handle_import_metadata(args, db_repo).await,
        Commands::Status => handle_status(db_repo).await,
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Performance and risk statistics for daily ETF price histories.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute returns, volatility, Sharpe ratio and drawdown per instrument.
    Analyze(AnalyzeArgs),
    /// Rank instruments by Sharpe, Sortino and Calmar ratio.
    Rank(RankArgs),
    /// Store daily prices from a JSON file.
    Import(ImportArgs),
    /// Store instrument metadata (ISIN, exchange, ...) from a CSV or JSON universe file.
    ImportMetadata(ImportMetadataArgs),
    /// Show row counts, the latest stored date and metadata per instrument.
    Status,
}

#[derive(Parser)]
struct AnalyzeArgs {
    /// Analyze a single ticker instead of every stored one (e.g., "SPY").
    #[arg(long)]
    ticker: Option<String>,
}

#[derive(Parser)]
struct RankArgs {
    /// Analysis period in months (e.g., 12, 24, 36). Defaults to the full history.
    #[arg(long)]
    months: Option<u32>,

    /// How many instruments to show per ratio.
    #[arg(long)]
    top: Option<usize>,
}

#[derive(Parser)]
struct ImportArgs {
    /// The ticker the prices belong to.
    #[arg(long)]
    ticker: String,

    /// A JSON array of records: {"date": "2024-01-02", "close": 470.1, ...}.
    #[arg(long, short)]
    file: PathBuf,
}

#[derive(Parser)]
struct ImportMetadataArgs {
    /// A CSV file with a header row (`symbol` or `ticker`, isin, asset_class, region,
    /// category, currency, exchange, description), or a JSON array with the same fields.
    #[arg(long, short)]
    file: PathBuf,
}

// ==============================================================================
// Logging
// ==============================================================================

/// Installs the global subscriber. `RUST_LOG` takes precedence over the configured level.
///
/// The returned guard flushes the log file on drop and must live until exit.
fn init_logging(settings: &LoggingSettings) -> anyhow::Result<Option<WorkerGuard>> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.level));
    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr));

    match &settings.directory {
        Some(directory) => {
            let appender = tracing_appender::rolling::daily(directory, "etf-lab.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            registry
                .with(fmt::layer().with_ansi(false).with_writer(writer))
                .try_init()?;
            Ok(Some(guard))
        }
        None => {
            registry.try_init()?;
            Ok(None)
        }
    }
}

// ==============================================================================
// Command Logic
// ==============================================================================

async fn handle_analyze(
    args: AnalyzeArgs,
    db_repo: DbRepository,
    config: &Config,
) -> anyhow::Result<()> {
    let analyzer = PerformanceAnalyzer::new(db_repo, config.analysis.clone());

    let metrics = match args.ticker {
        Some(ticker) => vec![analyzer.analyze(&ticker).await?],
        None => {
            let batch = analyzer.analyze_all().await?;
            if batch.metrics.is_empty() && batch.failures.is_empty() {
                println!("No data found. Run ingestion first.");
                return Ok(());
            }
            for failure in &batch.failures {
                eprintln!("Error analyzing {}: {}", failure.instrument_id, failure.error);
            }
            batch.metrics
        }
    };

    if metrics.is_empty() {
        println!("No successful analyses completed.");
        return Ok(());
    }

    println!("=== ETF Performance Analysis ===\n");
    println!("{}", report::metrics_table(&metrics));
    Ok(())
}

async fn handle_rank(args: RankArgs, db_repo: DbRepository, config: &Config) -> anyhow::Result<()> {
    let mut settings = config.ranking.clone();
    if let Some(top) = args.top {
        anyhow::ensure!(top > 0, "--top must be at least 1");
        settings.top_n = top;
    }
    let months = args.months.or(settings.months);

    let analyzer = PerformanceAnalyzer::new(db_repo.clone(), config.analysis.clone());
    let as_of = chrono::Local::now().date_naive();
    let rankings = Ranker::new(settings).rank_all(&analyzer, as_of, months).await?;

    if rankings.is_empty() {
        println!("No valid results.");
        return Ok(());
    }
    if let Some(months) = months {
        println!("Period: Last {months} months");
    }

    let labels: HashMap<String, String> = db_repo
        .list_metadata()
        .await?
        .into_iter()
        .map(|meta| (meta.ticker.clone(), report::describe(&meta)))
        .collect();

    for metric in RankingMetric::ALL {
        let entries = rankings.get(metric);
        println!("\n=== Top {} by {metric} Ratio ===", entries.len());
        let table = report::ranking_table(metric, entries, |m| {
            format!(
                "{} ({} to {})",
                labels.get(m.instrument_id()).map(String::as_str).unwrap_or_default(),
                m.period_start(),
                m.period_end()
            )
        });
        println!("{table}");
    }

    if !rankings.skipped.is_empty() {
        println!("\nSkipped: {}", rankings.skipped.join(", "));
    }
    Ok(())
}

async fn handle_import(args: ImportArgs, db_repo: DbRepository) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    let records: Vec<PriceRecord> = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse {}", args.file.display()))?;

    let saved = db_repo.save_prices(&args.ticker, &records).await?;
    println!("Imported {saved} rows for {}.", args.ticker);
    Ok(())
}

async fn handle_import_metadata(
    args: ImportMetadataArgs,
    db_repo: DbRepository,
) -> anyhow::Result<()> {
    let entries = universe::read_metadata(&args.file)?;
    let saved = db_repo.save_metadata(&entries).await?;
    println!("Loaded metadata for {saved} instruments.");
    Ok(())
}

async fn handle_status(db_repo: DbRepository) -> anyhow::Result<()> {
    let status = db_repo.ticker_status().await?;
    if status.is_empty() {
        println!("No data found in database.");
        return Ok(());
    }

    let missing = status.iter().filter(|s| s.metadata.is_none()).count();
    println!("Row counts by ticker:");
    println!("{}", report::status_table(&status));
    if missing > 0 {
        println!("{missing} tickers have no metadata. Run import-metadata to add it.");
    }
    Ok(())
}
