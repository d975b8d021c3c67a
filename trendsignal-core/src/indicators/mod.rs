//! Indicator implementations.
//!
//! Indicators are pure functions: bar history in, an output aligned to the
//! input index out. Nothing here holds state between calls.
//!
//! - `heikin_ashi`: optional smoothing transform applied before the others
//! - `atr`: true range and Wilder smoothing
//! - `supertrend`: the band/direction recurrence built on ATR

pub mod atr;
pub mod heikin_ashi;
pub mod supertrend;

pub use atr::Atr;
pub use heikin_ashi::HeikinAshi;
pub use supertrend::{BandError, BandState, Supertrend, SupertrendOutput};

use crate::domain::Bar;

/// Trait for indicators.
///
/// `compute` must return an output aligned position-wise with `bars`. Positions
/// inside the warm-up span (`lookback() - 1` leading bars) are absent.
///
/// # Look-ahead guard
/// No output at index t may depend on bars after t. Truncating the input at
/// any index must leave the outputs before that index unchanged.
pub trait Indicator: Send + Sync {
    type Output;

    /// Human-readable name (e.g., "atr_10", "supertrend_10_2").
    fn name(&self) -> &str;

    /// Number of bars needed before the first defined value.
    fn lookback(&self) -> usize;

    fn compute(&self, bars: &[Bar]) -> Self::Output;
}

/// Create synthetic bars from close prices for testing.
///
/// open = previous close (or close for the first bar),
/// high = max(open, close) + 1, low = min(open, close) - 1, 4h cadence.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<Bar> {
    let data: Vec<(f64, f64, f64, f64)> = closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            (open, open.max(close) + 1.0, open.min(close) - 1.0, close)
        })
        .collect();
    make_ohlc_bars(&data)
}

/// Create bars from explicit (open, high, low, close) tuples, 4h apart.
#[cfg(test)]
pub fn make_ohlc_bars(data: &[(f64, f64, f64, f64)]) -> Vec<Bar> {
    use chrono::TimeZone;
    let base = chrono::Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    data.iter()
        .enumerate()
        .map(|(i, &(open, high, low, close))| Bar {
            timestamp: base + chrono::Duration::hours(4 * i as i64),
            open,
            high,
            low,
            close,
            volume: 1000.0,
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
