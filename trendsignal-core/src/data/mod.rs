//! Market data: providers, pagination, canonicalization, symbol resolution

pub mod binance;
pub mod canonicalize;
pub mod catalog;
pub mod circuit_breaker;
pub mod fetch;
pub mod provider;
pub mod synthetic;

pub use binance::BinanceClient;
pub use canonicalize::Canonicalizer;
pub use catalog::{is_leveraged, resolve_instruments, MarketCatalog, DEFAULT_LEVERAGED_PATTERNS};
pub use circuit_breaker::{BreakerState, CircuitBreaker};
pub use fetch::{fetch_series, window_start, FetchWindow};
pub use provider::{DataError, MarketDataProvider};
pub use synthetic::SyntheticProvider;
