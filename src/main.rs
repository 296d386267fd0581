//! End-of-day quote collector
//!
//! Reads ticker symbols from a file, looks each one up on the quote endpoint
//! with a small pool of workers, and writes the quotes to a comma-separated
//! file.

use anyhow::Result;
use clap::{builder::TypedValueParser, Parser};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use eod_quotes::{
    concurrent_fetcher::{ConcurrentFetchConfig, DEFAULT_THREADS},
    data_collector::{default_output_filename, CollectionOptions, DataCollector, DEFAULT_INPUT_FILE},
    models::Config,
};

/// Fetch end-of-day quotes for a list of tickers
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(after_help = "Examples:
  eod-quotes
  eod-quotes -i companies.csv -o output.csv
  eod-quotes -t 8 -v")]
struct Args {
    /// Ticker list, one symbol per line
    #[arg(short, long, default_value = DEFAULT_INPUT_FILE)]
    input: PathBuf,

    /// Output file (defaults to YYYY-MM-DD-HHMMSS.csv)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Number of concurrent threads
    #[arg(short, long, default_value_t = DEFAULT_THREADS,
          value_parser = clap::value_parser!(u64).range(1..).map(|n| n as usize))]
    threads: usize,

    /// Be verbose
    #[arg(short, long)]
    verbose: bool,

    /// Only fetch the first N tickers of the list
    #[arg(short, long)]
    limit: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose)?;

    if args.verbose {
        info!("Verbose");
    }

    let config = Config::from_env()?;
    let options = CollectionOptions {
        input: args.input,
        output: args.output.unwrap_or_else(|| PathBuf::from(default_output_filename())),
        fetch: ConcurrentFetchConfig {
            num_threads: args.threads,
            verbose: args.verbose,
            max_tickers: args.limit,
        },
    };

    let collector = DataCollector::from_config(&config)?;
    collector.run(&options).await?;

    Ok(())
}

fn init_logging(verbose: bool) -> Result<()> {
    let default_filter = if verbose { "eod_quotes=debug" } else { "eod_quotes=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    Ok(())
}
