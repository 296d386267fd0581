use reqwest::StatusCode;
use thiserror::Error;

use crate::models::{QuoteRecord, Ticker};

pub mod yql_client;
pub use yql_client::YqlClient;

/// Failure while looking up a single ticker
#[derive(Debug, Error)]
pub enum FetchError {
    /// Endpoint answered with a 4xx/5xx status
    #[error("API request failed with status {status}")]
    Status { status: StatusCode, body: String },

    /// Connection, TLS or body transfer failure
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Body is not JSON or does not have the expected shape
    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl FetchError {
    /// Raw response body, when the endpoint sent one with an error status
    pub fn response_body(&self) -> Option<&str> {
        match self {
            FetchError::Status { body, .. } => Some(body),
            _ => None,
        }
    }
}

/// Source of end-of-day quotes
///
/// `Ok(None)` means the endpoint answered but had no quote for the ticker.
#[async_trait::async_trait]
pub trait QuoteSource: Send + Sync {
    async fn get_quote(&self, ticker: &Ticker) -> Result<Option<QuoteRecord>, FetchError>;
}
