use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::PipelineError;

/// Configuration for rate limiting
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub requests_per_second: u32,
    pub burst_size: u32,
}

/// Blob storage holding backtest exports.
///
/// Implementations own transport concerns (timeouts, retries). The pipeline
/// never retries: a failed call fails the batch.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store name for logs (e.g., "local", "s3")
    fn store_name(&self) -> &str;

    /// Keys under `prefix`
    async fn list(&self, prefix: &str) -> Result<Vec<String>, PipelineError>;

    /// Raw bytes stored at `key`
    async fn fetch(&self, key: &str) -> Result<Vec<u8>, PipelineError>;
}

/// Spot price for an instrument
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: String,
    pub price: f64,
    pub fetched_at: DateTime<Utc>,
}

/// Source of current prices shown next to backtest results
#[async_trait]
pub trait QuoteSource: Send + Sync {
    fn source_name(&self) -> &str;

    /// Latest price for a 3-letter instrument symbol (e.g., "BTC")
    async fn quote(&self, symbol: &str) -> Result<Quote, PipelineError>;
}
