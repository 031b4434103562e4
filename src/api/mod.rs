pub mod client;
pub mod error;
pub mod local_store;
pub mod quote_cache;
pub mod quote_http;
pub mod rate_limiter;

pub use client::{ObjectStore, Quote, QuoteSource, RateLimitConfig};
pub use error::PipelineError;
pub use local_store::LocalDirStore;
pub use quote_cache::QuoteCache;
pub use quote_http::HttpQuoteSource;
pub use rate_limiter::RateLimiter;
