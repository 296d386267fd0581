//! Comma-separated output of fetched quotes
//!
//! The column layout is taken from the first quote written: the preferred
//! columns first, then every other field of that quote in its own order. The
//! layout is then fixed for the whole file, so fields that only show up in
//! later quotes are not written. Values are joined with commas and never
//! quoted or escaped.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

use crate::models::{QuoteRecord, ResultSet, TickerResult, MISSING_VALUE};

/// Columns always placed first, in this order
pub const PREFERRED_COLUMNS: [&str; 11] = [
    "Name",
    "Currency",
    "Ask",
    "Open",
    "PreviousClose",
    "PercentChange",
    "PriceBook",
    "Change",
    "DaysHigh",
    "DaysLow",
    "EarningsShare",
];

/// Ordered output columns
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSchema {
    columns: Vec<String>,
}

impl ColumnSchema {
    /// Preferred columns followed by the record's remaining fields
    pub fn from_record(record: &QuoteRecord) -> Self {
        let mut columns: Vec<String> = PREFERRED_COLUMNS.iter().map(|c| c.to_string()).collect();
        columns.extend(
            record
                .field_names()
                .filter(|name| !name.is_empty() && !PREFERRED_COLUMNS.contains(name))
                .map(str::to_string),
        );
        Self { columns }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// One value per column, `None` where the record lacks the field
    pub fn row(&self, record: &QuoteRecord) -> Vec<String> {
        self.columns
            .iter()
            .map(|column| record.text(column).unwrap_or_else(|| MISSING_VALUE.to_string()))
            .collect()
    }

    /// Fields of `record` that have no column
    pub fn unmapped_fields<'a>(&self, record: &'a QuoteRecord) -> Vec<&'a str> {
        record
            .field_names()
            .filter(|name| !name.is_empty() && !self.columns.iter().any(|c| c == name))
            .collect()
    }
}

/// Outcome of writing a result set
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteSummary {
    pub rows_written: usize,
    pub skipped: usize,
    pub schema: Option<ColumnSchema>,
}

/// Streams quotes as rows, deriving the header from the first one
pub struct QuoteWriter<W: Write> {
    writer: csv::Writer<W>,
    summary: WriteSummary,
}

impl<W: Write> QuoteWriter<W> {
    pub fn new(inner: W) -> Self {
        let writer = csv::WriterBuilder::new()
            .has_headers(false)
            .quote_style(csv::QuoteStyle::Never)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(inner);

        Self {
            writer,
            summary: WriteSummary::default(),
        }
    }

    /// Write one fetch outcome; tickers without a quote are skipped
    pub fn write_result(&mut self, entry: &TickerResult) -> Result<()> {
        let Some(quote) = &entry.quote else {
            debug!("Quote was None for {}", entry.ticker);
            self.summary.skipped += 1;
            return Ok(());
        };

        if self.summary.schema.is_none() {
            let schema = ColumnSchema::from_record(quote);
            debug!("Columns taken from {}: {}", entry.ticker, schema.columns().join(","));
            self.writer.write_record(schema.columns())?;
            self.summary.schema = Some(schema);
        }

        if let Some(schema) = &self.summary.schema {
            let unmapped = schema.unmapped_fields(quote);
            if !unmapped.is_empty() {
                debug!("Dropping fields of {} outside the header: {}", entry.ticker, unmapped.join(","));
            }

            let row = schema.row(quote);
            info!("{}", row.join(","));
            self.writer.write_record(&row)?;
            self.summary.rows_written += 1;
        }

        Ok(())
    }

    /// Flush buffered rows and return the summary
    pub fn finish(mut self) -> Result<WriteSummary> {
        self.writer.flush()?;
        Ok(self.summary)
    }
}

/// Write every fetched quote in `results` to `out`
pub fn write_results<W: Write>(results: &ResultSet, out: W) -> Result<WriteSummary> {
    let mut writer = QuoteWriter::new(out);
    for entry in results {
        writer.write_result(entry)?;
    }
    writer.finish()
}

/// Write `results` to the file at `path`, replacing it.
///
/// Failing to create the file is fatal for the run.
pub fn write_results_to_path(results: &ResultSet, path: &Path) -> Result<WriteSummary> {
    info!("📝 writing results to {}", path.display());
    let file = File::create(path)
        .with_context(|| format!("Failed to create output file {}", path.display()))?;

    write_results(results, file)
        .with_context(|| format!("Failed to write results to {}", path.display()))
}
