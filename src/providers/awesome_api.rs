use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error, instrument};

use crate::core::{Deadline, FetchError, Quote, QuoteProvider};

/// Nested object found under the pair key. Only `bid` is kept; high, low,
/// variation and the upstream timestamps are dropped.
#[derive(Debug, Deserialize)]
struct PairQuote {
    bid: String,
}

// AwesomeApiProvider implementation for QuoteProvider
pub struct AwesomeApiProvider {
    base_url: String,
    pair: String,
    client: reqwest::Client,
}

impl AwesomeApiProvider {
    pub fn new(base_url: &str, pair: &str) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent("cotacao/1.0")
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        Ok(AwesomeApiProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            pair: pair.to_string(),
            client,
        })
    }

    /// `USD-BRL` is requested as `/json/last/USD-BRL` and answered under `USDBRL`.
    fn envelope_key(&self) -> String {
        self.pair.replace('-', "")
    }

    async fn request(&self) -> Result<Quote, FetchError> {
        let url = format!("{}/json/last/{}", self.base_url, self.pair);
        debug!("Requesting quote from {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        debug!(response = ?response, "Received upstream response");

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status().as_u16()));
        }

        let text = response
            .text()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        decode_quote(&text, &self.envelope_key())
    }
}

fn decode_quote(text: &str, key: &str) -> Result<Quote, FetchError> {
    let envelope: Value = serde_json::from_str(text).map_err(|e| {
        error!(error = ?e, response = %text, "Failed to parse upstream response");
        FetchError::Decode(e.to_string())
    })?;

    let pair = envelope
        .get(key)
        .cloned()
        .ok_or_else(|| FetchError::Decode(format!("missing `{key}` in response")))?;

    let pair: PairQuote = serde_json::from_value(pair)
        .map_err(|e| FetchError::Decode(format!("invalid `{key}` object: {e}")))?;

    if pair.bid.is_empty() {
        return Err(FetchError::Decode(format!("empty `bid` in `{key}` object")));
    }

    Ok(Quote { bid: pair.bid })
}

#[async_trait]
impl QuoteProvider for AwesomeApiProvider {
    #[instrument(
        name = "AwesomeApiFetch",
        skip(self),
        fields(pair = %self.pair, budget = %deadline)
    )]
    async fn fetch_quote(&self, deadline: Deadline) -> Result<Quote, FetchError> {
        deadline
            .run(self.request())
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?
    }
}
