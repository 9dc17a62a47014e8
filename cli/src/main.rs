use equitywatch::{
    prelude::*,
    services::DEFAULT_DATA_DIR,
    utils::init_logger,
};
use clap::{Parser, Subcommand};
use std::{path::PathBuf, sync::Arc, time::Duration};

#[derive(Parser)]
#[command(name = "equitywatch")]
#[command(about = "Summaries of daily equity prices from local CSV files")]
pub struct Cli {
    /// Directory holding one CSV file per symbol
    #[arg(long, global = true, default_value = DEFAULT_DATA_DIR)]
    pub data_dir: PathBuf,

    /// Seconds to wait for a price file before giving up
    #[arg(long, global = true, default_value_t = 5)]
    pub read_timeout_secs: u64,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Summarise one symbol
    Summary {
        /// Ticker symbol (case-insensitive)
        #[arg(short, long, default_value = "AAPL")]
        symbol: String,
        /// Trailing window in trading days (clamped to 1..=365)
        #[arg(short, long, allow_negative_numbers = true)]
        days: Option<i64>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Summarise several symbols at once
    Batch {
        /// Ticker symbols (comma-separated); defaults to the whole catalog
        #[arg(short, long, value_delimiter = ',')]
        symbols: Vec<String>,
        /// Trailing window in trading days (clamped to 1..=365)
        #[arg(short, long, allow_negative_numbers = true)]
        days: Option<i64>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// List supported symbols
    Symbols,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logger()?;

    let cli = Cli::parse();

    let source = CsvDirectorySource::new(&cli.data_dir);
    let service = StockSummaryService::new(SymbolCatalog::default(), Arc::new(source))
        .with_read_timeout(Duration::from_secs(cli.read_timeout_secs));

    match cli.command {
        Commands::Summary { symbol, days, json } => {
            let days = clamp_window(days, DEFAULT_WINDOW_DAYS, MAX_WINDOW_DAYS);
            let summary = service.load_summary(&symbol, days).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                print_header(days);
                print_row(&summary);
            }
        }
        Commands::Batch { symbols, days, json } => {
            let days = clamp_window(days, DEFAULT_WINDOW_DAYS, MAX_WINDOW_DAYS);
            let symbols = if symbols.is_empty() {
                service.catalog().symbols()
            } else {
                symbols
            };
            let summaries = service.load_many_summaries(&symbols, days).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&summaries)?);
            } else {
                print_header(days);
                for summary in summaries.values() {
                    print_row(summary);
                }
            }
        }
        Commands::Symbols => {
            for symbol in service.catalog().symbols() {
                println!("{}", symbol);
            }
        }
    }

    Ok(())
}

fn print_header(days: usize) {
    let now = chrono::Utc::now();
    println!("[{}] 📊 Last {} trading days", now.format("%Y-%m-%d %H:%M:%S UTC"), days);
    println!("{:<8} {:>12} {:>9} {:>9} {:>6}  {}", "SYMBOL", "CLOSE", "1D %", "1W %", "POINTS", "RANGE");
}

fn print_row(summary: &StockSummary) {
    let range = match (summary.first_date(), summary.last_date()) {
        (Some(first), Some(last)) => format!("{} → {}", first, last),
        _ => "-".to_string(),
    };
    println!(
        "{:<8} {:>12.2} {:>+9.2} {:>+9.2} {:>6}  {}",
        summary.symbol,
        summary.latest_close,
        summary.change_pct,
        summary.weekly_change_pct,
        summary.series.len(),
        range
    );
}
