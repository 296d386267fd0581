//! Ticker list loading
//!
//! The input file holds one ticker symbol per line. Lines are trimmed and
//! kept in file order. Blank lines are not dropped: they become tickers with
//! an empty symbol, and a warning is logged so the operator can clean up the
//! list.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{info, warn};

use crate::models::Ticker;

/// Read the ticker list at `path`.
///
/// A missing or unreadable file is fatal for the run.
pub fn load_tickers(path: &Path) -> Result<Vec<Ticker>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open ticker list {}", path.display()))?;
    let tickers = parse_tickers(BufReader::new(file))
        .with_context(|| format!("Failed to read ticker list {}", path.display()))?;

    info!("📋 Loaded {} tickers from {}", tickers.len(), path.display());
    Ok(tickers)
}

/// Parse tickers from a buffered reader, one per line
pub fn parse_tickers<R: BufRead>(reader: R) -> Result<Vec<Ticker>> {
    let mut tickers = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let symbol = line.trim();
        if symbol.is_empty() {
            warn!("⚠️ Line {} of the ticker list is blank; it will be requested as an empty symbol", index + 1);
        }
        tickers.push(Ticker::new(symbol));
    }

    Ok(tickers)
}
