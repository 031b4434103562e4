use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;

use super::client::{Quote, QuoteSource, RateLimitConfig};
use super::error::PipelineError;
use super::rate_limiter::RateLimiter;
use crate::models::PipelineSettings;

const QUOTE_CURRENCY: &str = "USDT";

/// `GET /api/v3/ticker/price?symbol=BTCUSDT` response body
#[derive(Debug, Deserialize)]
struct TickerPrice {
    symbol: String,
    price: String,
}

/// Quote source for Binance-style public ticker endpoints
pub struct HttpQuoteSource {
    base_url: String,
    http_client: reqwest::Client,
    rate_limiter: RateLimiter,
}

impl HttpQuoteSource {
    pub fn new(base_url: impl Into<String>, rate_limit: RateLimitConfig) -> Self {
        Self {
            base_url: base_url.into(),
            http_client: reqwest::Client::new(),
            rate_limiter: RateLimiter::new(rate_limit),
        }
    }

    pub fn from_settings(settings: &PipelineSettings) -> Self {
        Self::new(
            settings.quote_base_url.clone(),
            RateLimitConfig {
                requests_per_second: settings.quote_requests_per_second,
                burst_size: settings.quote_requests_per_second,
            },
        )
    }

    fn quote_error(symbol: &str, message: impl Into<String>) -> PipelineError {
        PipelineError::QuoteError {
            symbol: symbol.to_string(),
            message: message.into(),
        }
    }
}

#[async_trait]
impl QuoteSource for HttpQuoteSource {
    fn source_name(&self) -> &str {
        "http-ticker"
    }

    async fn quote(&self, symbol: &str) -> Result<Quote, PipelineError> {
        self.rate_limiter.acquire().await;

        let market = format!("{}{}", symbol, QUOTE_CURRENCY);
        let response = self
            .http_client
            .get(&self.base_url)
            .query(&[("symbol", market.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::quote_error(symbol, format!("HTTP {}", status)));
        }

        let ticker: TickerPrice = response.json().await?;
        if ticker.symbol != market {
            return Err(Self::quote_error(
                symbol,
                format!("expected {} but got {}", market, ticker.symbol),
            ));
        }
        let price = ticker
            .price
            .parse::<f64>()
            .map_err(|e| Self::quote_error(symbol, format!("Invalid price '{}': {}", ticker.price, e)))?;

        Ok(Quote {
            symbol: symbol.to_string(),
            price,
            fetched_at: Utc::now(),
        })
    }
}
