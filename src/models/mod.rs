use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::{Map, Value};

/// Default quote-lookup endpoint
pub const DEFAULT_ENDPOINT: &str = "https://query.yahooapis.com/v1/public/yql";

/// Text written in place of a missing or null field
pub const MISSING_VALUE: &str = "None";

/// Bytes left unencoded in a ticker: letters, digits and `_.-~/`
const TICKER_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'_')
    .remove(b'.')
    .remove(b'-')
    .remove(b'~')
    .remove(b'/');

/// Ticker symbol as read from the input file
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ticker {
    symbol: String,
    encoded: String,
}

impl Ticker {
    /// Create a ticker from its raw symbol, URL-encoding it for query use
    pub fn new(symbol: impl Into<String>) -> Self {
        let symbol = symbol.into();
        let encoded = utf8_percent_encode(&symbol, TICKER_ENCODE_SET).to_string();
        Self { symbol, encoded }
    }

    /// Unencoded symbol, used for display and logging
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Encoded symbol, safe to embed in a URL query
    pub fn encoded(&self) -> &str {
        &self.encoded
    }
}

impl std::fmt::Display for Ticker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.symbol)
    }
}

/// All fields returned by the API for one ticker.
///
/// Field order is the order the API sent them in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuoteRecord {
    fields: Map<String, Value>,
}

impl QuoteRecord {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Look up a field by name. JSON `null` counts as absent.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name).filter(|value| !value.is_null())
    }

    /// Field rendered as output text, or `None` when absent
    pub fn text(&self, name: &str) -> Option<String> {
        self.get(name).map(|value| match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }

    /// Field names in their natural order
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Fetch outcome for one input ticker
#[derive(Debug, Clone, PartialEq)]
pub struct TickerResult {
    pub ticker: Ticker,
    pub quote: Option<QuoteRecord>,
}

/// Fetch outcomes for every input ticker, in input order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    entries: Vec<TickerResult>,
}

impl ResultSet {
    pub fn new(entries: Vec<TickerResult>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TickerResult> {
        self.entries.iter()
    }

    /// Result for a symbol. Duplicated symbols resolve to their first entry.
    pub fn get(&self, symbol: &str) -> Option<&TickerResult> {
        self.entries.iter().find(|entry| entry.ticker.symbol() == symbol)
    }

    /// Number of tickers that produced a quote
    pub fn fetched_count(&self) -> usize {
        self.entries.iter().filter(|entry| entry.quote.is_some()).count()
    }

    /// Number of tickers without a quote
    pub fn missing_count(&self) -> usize {
        self.len() - self.fetched_count()
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a TickerResult;
    type IntoIter = std::slice::Iter<'a, TickerResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Configuration for the application
#[derive(Debug, Clone)]
pub struct Config {
    pub endpoint: String,
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            user_agent: default_user_agent(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if it exists

        let endpoint = std::env::var("EOD_QUOTES_ENDPOINT")
            .unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string());
        url::Url::parse(&endpoint)
            .map_err(|e| anyhow::anyhow!("EOD_QUOTES_ENDPOINT is not a valid URL ({}): {}", endpoint, e))?;

        Ok(Config {
            endpoint,
            user_agent: std::env::var("EOD_QUOTES_USER_AGENT")
                .unwrap_or_else(|_| default_user_agent()),
        })
    }
}

fn default_user_agent() -> String {
    format!("eod-quotes/{}", env!("CARGO_PKG_VERSION"))
}
