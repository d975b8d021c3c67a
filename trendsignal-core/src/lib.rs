//! TrendSignal Core — Supertrend-on-Heikin-Ashi trend flip signals.
//!
//! This crate contains the whole signal path:
//! - Domain types (bars, series, instruments, cadences, output rows)
//! - Market data: paged providers (Binance REST, seeded synthetic), symbol
//!   resolution, canonicalization, circuit breaker
//! - Indicators: Heikin-Ashi, ATR, the Supertrend band engine
//! - Flip extraction and per-instrument pipeline orchestration
//! - Serializable configuration

pub mod config;
pub mod data;
pub mod domain;
pub mod indicators;
pub mod pipeline;
pub mod signals;

pub use config::{ConfigError, SignalConfig};
pub use pipeline::{
    evaluate_series, process_instrument, resolve_universe, run_batch, run_signals, Evaluation,
    InstrumentReport, Outcome, PipelineError,
};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: everything handed to worker threads is Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<domain::Bar>();
        require_sync::<domain::Bar>();
        require_send::<domain::Series>();
        require_sync::<domain::Series>();
        require_send::<domain::Instrument>();
        require_sync::<domain::Instrument>();
        require_send::<domain::InstrumentSignal>();
        require_sync::<domain::InstrumentSignal>();

        require_send::<SignalConfig>();
        require_sync::<SignalConfig>();
        require_send::<InstrumentReport>();
        require_sync::<InstrumentReport>();
        require_send::<Evaluation>();
        require_sync::<Evaluation>();

        require_send::<data::BinanceClient>();
        require_sync::<data::BinanceClient>();
        require_send::<data::SyntheticProvider>();
        require_sync::<data::SyntheticProvider>();
        require_send::<data::CircuitBreaker>();
        require_sync::<data::CircuitBreaker>();

        require_send::<indicators::Atr>();
        require_sync::<indicators::Atr>();
        require_send::<indicators::Supertrend>();
        require_sync::<indicators::Supertrend>();
    }
}
