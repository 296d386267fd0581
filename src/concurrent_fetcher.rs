//! Concurrent quote fetching module
//!
//! Tickers are fetched by a fixed number of worker tasks pulling from a shared
//! queue. Each worker hands back the results it produced, tagged with the
//! input position of the ticker, and the dispatcher rebuilds the result set in
//! input order once every worker has finished.

use anyhow::{anyhow, Result};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

use crate::{
    api::{FetchError, QuoteSource},
    models::{QuoteRecord, ResultSet, Ticker, TickerResult, MISSING_VALUE},
};

/// Worker count used when none is configured
pub const DEFAULT_THREADS: usize = 2;

/// Configuration for concurrent fetching
#[derive(Debug, Clone)]
pub struct ConcurrentFetchConfig {
    pub num_threads: usize,
    pub verbose: bool,
    pub max_tickers: Option<usize>, // Optional cap on the ticker list
}

impl Default for ConcurrentFetchConfig {
    fn default() -> Self {
        Self {
            num_threads: DEFAULT_THREADS,
            verbose: false,
            max_tickers: None,
        }
    }
}

type TickerQueue = Arc<Mutex<VecDeque<(usize, Ticker)>>>;

/// Fetch a quote for every ticker using up to `config.num_threads` workers.
///
/// The returned set has one entry per fetched ticker, in the order given,
/// whatever order the fetches complete in.
pub async fn fetch_quotes_concurrently(
    source: Arc<dyn QuoteSource>,
    tickers: Vec<Ticker>,
    config: &ConcurrentFetchConfig,
) -> Result<ResultSet> {
    // Apply ticker limit if specified
    let tickers = match config.max_tickers {
        Some(max_tickers) if max_tickers < tickers.len() => {
            info!("🔢 Limiting to {} of {} tickers", max_tickers, tickers.len());
            tickers.into_iter().take(max_tickers).collect::<Vec<_>>()
        }
        _ => tickers,
    };

    if tickers.is_empty() {
        warn!("No tickers to fetch");
        return Ok(ResultSet::default());
    }

    let num_threads = config.num_threads.max(1).min(tickers.len());
    info!("🚀 Starting concurrent fetch of {} tickers with {} threads", tickers.len(), num_threads);

    let queue: TickerQueue = Arc::new(Mutex::new(
        tickers.iter().cloned().enumerate().collect(),
    ));

    // Spawn worker threads
    let mut handles = Vec::with_capacity(num_threads);
    for thread_id in 0..num_threads {
        let queue = Arc::clone(&queue);
        let source = Arc::clone(&source);
        let verbose = config.verbose;

        handles.push(tokio::spawn(async move {
            worker_thread(thread_id, queue, source, verbose).await
        }));
    }

    // Wait for all threads to complete, then put results back in input order
    let mut slots: Vec<Option<Option<QuoteRecord>>> = vec![None; tickers.len()];
    for outcome in futures::future::try_join_all(handles).await? {
        for (index, quote) in outcome? {
            slots[index] = Some(quote);
        }
    }

    let entries = tickers
        .into_iter()
        .zip(slots)
        .map(|(ticker, slot)| {
            slot.map(|quote| TickerResult { ticker: ticker.clone(), quote })
                .ok_or_else(|| anyhow!("No fetch result recorded for {}", ticker))
        })
        .collect::<Result<Vec<_>>>()?;

    let results = ResultSet::new(entries);
    info!(
        "✅ Concurrent fetch completed: {} fetched, {} without data",
        results.fetched_count(),
        results.missing_count()
    );

    Ok(results)
}

/// Pull tickers off the queue until it is empty
async fn worker_thread(
    thread_id: usize,
    queue: TickerQueue,
    source: Arc<dyn QuoteSource>,
    verbose: bool,
) -> Result<Vec<(usize, Option<QuoteRecord>)>> {
    let mut completed = Vec::new();

    loop {
        let next = {
            let mut queue = queue
                .lock()
                .map_err(|_| anyhow!("ticker queue lock poisoned"))?;
            queue.pop_front()
        };
        let Some((index, ticker)) = next else {
            break; // No more tickers to process
        };

        debug!("Thread {}: Starting {}", thread_id, ticker);
        let quote = fetch_quote(source.as_ref(), &ticker, verbose).await;
        completed.push((index, quote));
    }

    debug!("Thread {}: finished after {} tickers", thread_id, completed.len());
    Ok(completed)
}

/// Fetch one ticker, turning every failure into an absent quote.
///
/// The reason is logged against the unencoded symbol. With `verbose` set,
/// error response bodies are logged as well.
pub async fn fetch_quote(
    source: &dyn QuoteSource,
    ticker: &Ticker,
    verbose: bool,
) -> Option<QuoteRecord> {
    match source.get_quote(ticker).await {
        Ok(Some(quote)) => {
            let field = |name: &str| quote.text(name).unwrap_or_else(|| MISSING_VALUE.to_string());
            info!(
                "{:>30} {:>7} {:>7} {:>7}",
                ticker.symbol(),
                field("Ask"),
                field("Open"),
                field("Symbol")
            );
            Some(quote)
        }
        Ok(None) => {
            warn!("bad data for '{}'", ticker);
            None
        }
        Err(e @ FetchError::Status { .. }) => {
            warn!("error trying to get {} details: {}", ticker, e);
            if verbose {
                if let Some(body) = e.response_body() {
                    warn!("error trying to get {} details: {}", ticker, body);
                }
            }
            None
        }
        Err(e @ FetchError::Request(_)) => {
            warn!("request for {} failed: {}", ticker, e);
            None
        }
        Err(e @ FetchError::Decode(_)) => {
            warn!("bad data for '{}': {}", ticker, e);
            None
        }
    }
}
