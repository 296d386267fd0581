//! Common test utilities and helpers

use std::path::{Path, PathBuf};

/// Test data utilities
pub mod test_data {
    use eod_quotes::models::{QuoteRecord, Ticker};
    use serde_json::{json, Value};

    /// Build a quote record from a JSON object literal
    pub fn quote(value: Value) -> QuoteRecord {
        match value {
            Value::Object(map) => QuoteRecord::new(map),
            other => panic!("quote fixture must be a JSON object, got {}", other),
        }
    }

    /// A quote with the handful of fields the endpoint usually sends
    pub fn sample_quote(symbol: &str, ask: &str, open: &str) -> QuoteRecord {
        quote(json!({
            "symbol": symbol,
            "Ask": ask,
            "AverageDailyVolume": "1000000",
            "Open": open,
            "Symbol": symbol,
        }))
    }

    /// Response body in the endpoint's envelope
    pub fn yql_body(quotes: Vec<Value>) -> Value {
        json!({
            "query": {
                "count": quotes.len(),
                "created": "2017-05-02T21:00:00Z",
                "lang": "en-US",
                "results": { "quote": quotes }
            }
        })
    }

    /// Response body for a lookup that matched nothing
    pub fn yql_empty_body() -> Value {
        json!({
            "query": {
                "count": 0,
                "created": "2017-05-02T21:00:00Z",
                "lang": "en-US",
                "results": null
            }
        })
    }

    /// Tickers for a list of symbols
    pub fn tickers(symbols: &[&str]) -> Vec<Ticker> {
        symbols.iter().map(|s| Ticker::new(*s)).collect()
    }

    /// The `q` parameter the client sends for a symbol
    pub fn yql_query(symbol: &str) -> String {
        format!("select * from yahoo.finance.quotes where symbol in (\"{}\")", symbol)
    }
}

/// In-memory quote sources
pub mod stub_source {
    use async_trait::async_trait;
    use eod_quotes::api::{FetchError, QuoteSource};
    use eod_quotes::models::{QuoteRecord, Ticker};
    use reqwest::StatusCode;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Canned answer for one symbol
    #[derive(Debug, Clone)]
    pub enum Answer {
        Quote(QuoteRecord),
        NoData,
        Status(u16),
    }

    /// Answers lookups from a table. Each symbol gets its own delay so
    /// completions arrive out of input order.
    pub struct StubSource {
        answers: HashMap<String, Answer>,
        calls: Mutex<Vec<String>>,
    }

    impl StubSource {
        pub fn new(answers: impl IntoIterator<Item = (&'static str, Answer)>) -> Self {
            Self {
                answers: answers
                    .into_iter()
                    .map(|(symbol, answer)| (symbol.to_string(), answer))
                    .collect(),
                calls: Mutex::new(Vec::new()),
            }
        }

        /// Symbols looked up so far, in call order
        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn delay_for(symbol: &str) -> Duration {
            let spread: u64 = symbol.bytes().map(u64::from).sum::<u64>() % 7;
            Duration::from_millis(spread * 3)
        }
    }

    #[async_trait]
    impl QuoteSource for StubSource {
        async fn get_quote(&self, ticker: &Ticker) -> Result<Option<QuoteRecord>, FetchError> {
            self.calls.lock().unwrap().push(ticker.symbol().to_string());
            tokio::time::sleep(Self::delay_for(ticker.symbol())).await;

            match self.answers.get(ticker.symbol()) {
                Some(Answer::Quote(quote)) => Ok(Some(quote.clone())),
                Some(Answer::Status(code)) => Err(FetchError::Status {
                    status: StatusCode::from_u16(*code).unwrap(),
                    body: format!("{{\"error\":{{\"description\":\"status {}\"}}}}", code),
                }),
                Some(Answer::NoData) | None => Ok(None),
            }
        }
    }
}

/// Logging utilities for tests
pub mod logging {
    use std::io::{self, Write};
    use std::sync::{Arc, Mutex, Once};
    use tracing::info;

    static INIT: Once = Once::new();

    /// Initialize test logging
    pub fn init_test_logging() {
        INIT.call_once(|| {
            // Another test may already have installed a subscriber
            let _ = tracing_subscriber::fmt()
                .with_env_filter("eod_quotes=debug")
                .with_test_writer()
                .try_init();
        });
    }

    /// Log test step
    pub fn log_test_step(step: &str) {
        info!("🧪 Test Step: {}", step);
    }

    /// Log lines written while a [`CapturedLogs::guard`] is held on this thread
    #[derive(Clone, Default)]
    pub struct CapturedLogs {
        buffer: Arc<Mutex<Vec<u8>>>,
    }

    struct CaptureWriter(Arc<Mutex<Vec<u8>>>);

    impl Write for CaptureWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl CapturedLogs {
        /// Route this thread's events into the buffer until the guard drops.
        /// Tasks spawned on a current-thread runtime are covered too.
        pub fn guard(&self) -> tracing::subscriber::DefaultGuard {
            let buffer = self.buffer.clone();
            let subscriber = tracing_subscriber::fmt()
                .with_env_filter("eod_quotes=debug")
                .with_ansi(false)
                .with_writer(move || CaptureWriter(buffer.clone()))
                .finish();
            tracing::subscriber::set_default(subscriber)
        }

        pub fn contents(&self) -> String {
            String::from_utf8_lossy(&self.buffer.lock().unwrap()).into_owned()
        }
    }
}

/// Write a ticker list file, one symbol per line
pub fn write_ticker_file(dir: &Path, lines: &[&str]) -> PathBuf {
    let path = dir.join("companylist.csv");
    let mut content = lines.join("\n");
    content.push('\n');
    std::fs::write(&path, content).expect("Failed to write ticker file");
    path
}
