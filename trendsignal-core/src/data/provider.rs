//! Market-data provider trait and structured error types.
//!
//! `MarketDataProvider` abstracts over bar sources (Binance REST, the seeded
//! synthetic generator, test fakes) so the pipeline never knows which venue it
//! is talking to.

use crate::domain::{Bar, Cadence, Instrument};
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Structured error types for data operations.
///
/// Displayable in both CLI output and HTTP error bodies.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("hard stop: data provider has blocked requests (circuit breaker tripped)")]
    CircuitBreakerTripped,

    #[error("unsupported exchange '{0}'")]
    UnsupportedExchange(String),

    #[error("canonicalization failed: {0}")]
    Canonicalize(String),

    #[error("data error: {0}")]
    Other(String),
}

/// Source of paged OHLCV bars.
pub trait MarketDataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch at most `limit` bars whose open time is at or after `since`.
    ///
    /// Pages may overlap earlier pages; an empty page means no more data.
    fn fetch_page(
        &self,
        instrument: &Instrument,
        cadence: Cadence,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Bar>, DataError>;

    /// Current-time probe used to detect the live edge during pagination.
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    /// Check if the provider is currently available (not rate-limited, not blocked).
    fn is_available(&self) -> bool {
        true
    }
}
