use anyhow::Result;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::models::{Config, QuoteRecord, Ticker};
use super::{FetchError, QuoteSource};

/// Query string sent for every ticker; `{symbol}` is replaced with the encoded ticker
const QUOTE_QUERY_TEMPLATE: &str = "q=select%20*%20from%20yahoo.finance.quotes%20where%20symbol%20in%20(%22{symbol}%22)&format=json&env=store%3A%2F%2Fdatatables.org%2Falltableswithkeys&callback=";

/// Top-level response envelope: `{ query: { results: { quote: ... } } }`
#[derive(Debug, Deserialize)]
struct YqlResponse {
    query: Option<YqlQuery>,
}

#[derive(Debug, Deserialize)]
struct YqlQuery {
    results: Option<YqlResults>,
}

#[derive(Debug, Deserialize)]
struct YqlResults {
    quote: Option<QuotePayload>,
}

/// The endpoint sends a bare object when a single symbol matches
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum QuotePayload {
    Many(Vec<Value>),
    One(Map<String, Value>),
}

/// Quote-lookup client for the public YQL endpoint
pub struct YqlClient {
    client: Client,
    endpoint: String,
}

impl YqlClient {
    /// Create a new client. No timeout is set on requests.
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }

    /// Full request URL for one ticker
    pub fn quote_url(&self, ticker: &Ticker) -> String {
        format!(
            "{}?{}",
            self.endpoint,
            QUOTE_QUERY_TEMPLATE.replace("{symbol}", ticker.encoded())
        )
    }
}

#[async_trait::async_trait]
impl QuoteSource for YqlClient {
    async fn get_quote(&self, ticker: &Ticker) -> Result<Option<QuoteRecord>, FetchError> {
        let url = self.quote_url(ticker);
        debug!("Making request to: {}", url);

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status { status, body });
        }

        let body = response.text().await?;
        debug!("API response received for {}: {} bytes", ticker, body.len());

        parse_quote_response(&body)
    }
}

/// Extract the first quote entry from a response body.
///
/// Missing or `null` levels, an empty quote list, a first entry that is not
/// an object, and an object with no fields all mean "no data".
pub fn parse_quote_response(body: &str) -> Result<Option<QuoteRecord>, FetchError> {
    let response: YqlResponse = serde_json::from_str(body)?;

    let payload = response
        .query
        .and_then(|query| query.results)
        .and_then(|results| results.quote);

    let quote = match payload {
        Some(QuotePayload::Many(entries)) => match entries.into_iter().next() {
            Some(Value::Object(entry)) => Some(entry),
            _ => None,
        },
        Some(QuotePayload::One(entry)) => Some(entry),
        None => None,
    };

    Ok(quote.map(QuoteRecord::new).filter(|quote| !quote.is_empty()))
}
