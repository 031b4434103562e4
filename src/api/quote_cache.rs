use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

use super::client::{Quote, QuoteSource};
use super::error::PipelineError;
use crate::models::PipelineSettings;

struct CachedQuote {
    quote: Quote,
    stored_at: Instant,
}

/// Read-through, size-bounded quote cache with a short TTL.
///
/// The lock is not held across the upstream call, so concurrent misses for
/// the same symbol may each hit the source.
pub struct QuoteCache<S: QuoteSource> {
    source: S,
    ttl: Duration,
    capacity: usize,
    entries: RwLock<HashMap<String, CachedQuote>>,
}

impl<S: QuoteSource> QuoteCache<S> {
    pub fn new(source: S, ttl: Duration, capacity: usize) -> Self {
        Self {
            source,
            ttl,
            capacity: capacity.max(1),
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn from_settings(source: S, settings: &PipelineSettings) -> Self {
        Self::new(
            source,
            Duration::from_secs(settings.quote_cache_ttl_secs),
            settings.quote_cache_capacity,
        )
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Cached quote if still fresh, otherwise a new one from the source
    pub async fn get(&self, symbol: &str) -> Result<Quote, PipelineError> {
        {
            let entries = self.entries.read().await;
            if let Some(cached) = entries.get(symbol) {
                if cached.stored_at.elapsed() < self.ttl {
                    return Ok(cached.quote.clone());
                }
            }
        }

        log::debug!("Quote cache miss for {} ({})", symbol, self.source.source_name());
        let quote = self.source.quote(symbol).await?;

        let mut entries = self.entries.write().await;
        if !entries.contains_key(symbol) && entries.len() >= self.capacity {
            self.evict(&mut entries);
        }
        entries.insert(
            symbol.to_string(),
            CachedQuote {
                quote: quote.clone(),
                stored_at: Instant::now(),
            },
        );

        Ok(quote)
    }

    /// Drop expired entries; if none expired, drop the oldest one
    fn evict(&self, entries: &mut HashMap<String, CachedQuote>) {
        let before = entries.len();
        entries.retain(|_, cached| cached.stored_at.elapsed() < self.ttl);
        if entries.len() < before {
            return;
        }
        let oldest = entries
            .iter()
            .min_by_key(|(_, cached)| cached.stored_at)
            .map(|(symbol, _)| symbol.clone());
        if let Some(symbol) = oldest {
            entries.remove(&symbol);
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }
}
