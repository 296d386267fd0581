use anyhow::Result;
use chrono::{DateTime, Local, TimeZone};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

use crate::api::{QuoteSource, YqlClient};
use crate::concurrent_fetcher::{fetch_quotes_concurrently, ConcurrentFetchConfig};
use crate::input::load_tickers;
use crate::models::Config;
use crate::writer::write_results_to_path;

/// Ticker list read when no input is given
pub const DEFAULT_INPUT_FILE: &str = "companylist.csv";

/// Where to read tickers from, where to write quotes, and how to fetch
#[derive(Debug, Clone)]
pub struct CollectionOptions {
    pub input: PathBuf,
    pub output: PathBuf,
    pub fetch: ConcurrentFetchConfig,
}

/// Summary of a finished run
#[derive(Debug, Clone)]
pub struct CollectionReport {
    pub tickers_requested: usize,
    pub quotes_fetched: usize,
    pub tickers_missing: usize,
    pub rows_written: usize,
    pub output: PathBuf,
    pub elapsed: Duration,
}

/// End-of-day collection: load tickers, fetch quotes, write the output file
pub struct DataCollector {
    source: Arc<dyn QuoteSource>,
}

impl DataCollector {
    /// Create a new data collector over any quote source
    pub fn new(source: Arc<dyn QuoteSource>) -> Self {
        Self { source }
    }

    /// Create a collector backed by the HTTP quote endpoint
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = YqlClient::new(config)?;
        Ok(Self::new(Arc::new(client)))
    }

    /// Run one collection end to end.
    ///
    /// Only input and output file errors abort the run; tickers that fail to
    /// fetch are left out of the output.
    pub async fn run(&self, options: &CollectionOptions) -> Result<CollectionReport> {
        let start = Instant::now();

        let tickers = load_tickers(&options.input)?;
        let results = fetch_quotes_concurrently(Arc::clone(&self.source), tickers, &options.fetch).await?;
        let summary = write_results_to_path(&results, &options.output)?;

        let report = CollectionReport {
            tickers_requested: results.len(),
            quotes_fetched: results.fetched_count(),
            tickers_missing: results.missing_count(),
            rows_written: summary.rows_written,
            output: options.output.clone(),
            elapsed: start.elapsed(),
        };

        info!(
            "📊 {} tickers: {} quotes written to {}, {} without data",
            report.tickers_requested,
            report.rows_written,
            report.output.display(),
            report.tickers_missing
        );
        info!("Job took {:2} secs", report.elapsed.as_secs());

        Ok(report)
    }
}

/// Timestamped output name, e.g. `2024-03-01-173005.csv`
pub fn default_output_filename() -> String {
    output_filename_at(&Local::now())
}

fn output_filename_at<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format("%Y-%m-%d-%H%M%S.csv").to_string()
}
