//! Quote abstractions and core types

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::deadline::Deadline;
use super::error::{FetchError, StoreError};

/// A single fetched bid. The bid is kept exactly as the upstream formatted it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Quote {
    pub bid: String,
}

/// Wire representation returned by the quote service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteResponse {
    pub bid: String,
}

impl From<Quote> for QuoteResponse {
    fn from(quote: Quote) -> Self {
        QuoteResponse { bid: quote.bid }
    }
}

/// A persisted quote as read back from the store.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct QuoteRecord {
    pub id: i64,
    pub bid: String,
    pub timestamp: DateTime<Utc>,
}

#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Fetches the current quote, giving up once `deadline` passes.
    async fn fetch_quote(&self, deadline: Deadline) -> Result<Quote, FetchError>;
}

#[async_trait]
pub trait QuoteStore: Send + Sync {
    /// Appends `quote` with the current time, giving up once `deadline` passes.
    async fn append(&self, deadline: Deadline, quote: &Quote) -> Result<(), StoreError>;
}
