//! Heikin-Ashi candle transform.
//!
//! close' = (open + high + low + close) / 4
//! open'[0] = (open[0] + close[0]) / 2, open'[i] = (open'[i-1] + close'[i-1]) / 2
//! high' = max(high, open', close'), low' = min(low, open', close')
//!
//! `open'` depends on the previous derived candle, so the transform is a scan
//! in index order.

use crate::domain::{Bar, Series};

/// Heikin-Ashi transform over a whole series.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeikinAshi;

impl HeikinAshi {
    pub fn new() -> Self {
        Self
    }

    /// Same length and timestamps as the input; empty in, empty out.
    pub fn transform(&self, series: &Series) -> Series {
        Series::from_ordered(heikin_ashi(series.bars()))
    }
}

/// Compute Heikin-Ashi candles. Timestamps and volume carry over unchanged.
pub fn heikin_ashi(bars: &[Bar]) -> Vec<Bar> {
    bars.iter()
        .scan(None::<(f64, f64)>, |prev, bar| {
            let close = (bar.open + bar.high + bar.low + bar.close) / 4.0;
            let open = match *prev {
                None => (bar.open + bar.close) / 2.0,
                Some((prev_open, prev_close)) => (prev_open + prev_close) / 2.0,
            };
            *prev = Some((open, close));
            Some(Bar {
                timestamp: bar.timestamp,
                open,
                high: bar.high.max(open).max(close),
                low: bar.low.min(open).min(close),
                close,
                volume: bar.volume,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_ohlc_bars, DEFAULT_EPSILON};

    #[test]
    fn empty_input_yields_empty_output() {
        assert!(heikin_ashi(&[]).is_empty());
        assert!(HeikinAshi::new().transform(&Series::default()).is_empty());
    }

    #[test]
    fn first_candle_is_seeded_from_raw_open_close() {
        let bars = make_ohlc_bars(&[(100.0, 110.0, 90.0, 104.0)]);
        let ha = heikin_ashi(&bars);
        assert_approx(ha[0].open, 102.0, DEFAULT_EPSILON);
        assert_approx(ha[0].close, 101.0, DEFAULT_EPSILON);
        assert_approx(ha[0].high, 110.0, DEFAULT_EPSILON);
        assert_approx(ha[0].low, 90.0, DEFAULT_EPSILON);
    }

    #[test]
    fn open_follows_previous_derived_candle() {
        let bars = make_ohlc_bars(&[
            (100.0, 110.0, 90.0, 104.0), // o'=102, c'=101
            (104.0, 108.0, 103.0, 107.0), // o'=(102+101)/2=101.5, c'=105.5
            (107.0, 109.0, 100.0, 101.0), // o'=(101.5+105.5)/2=103.5, c'=104.25
        ]);
        let ha = heikin_ashi(&bars);
        assert_approx(ha[1].open, 101.5, DEFAULT_EPSILON);
        assert_approx(ha[1].close, 105.5, DEFAULT_EPSILON);
        // low' = min(103, 101.5, 105.5) = 101.5: derived open pierces the raw low
        assert_approx(ha[1].low, 101.5, DEFAULT_EPSILON);
        assert_approx(ha[2].open, 103.5, DEFAULT_EPSILON);
        assert_approx(ha[2].close, 104.25, DEFAULT_EPSILON);
    }

    #[test]
    fn constant_series_is_a_fixed_point() {
        let bars = make_ohlc_bars(&[(50.0, 50.0, 50.0, 50.0); 8]);
        for bar in heikin_ashi(&bars) {
            assert_eq!(bar.open, 50.0);
            assert_eq!(bar.high, 50.0);
            assert_eq!(bar.low, 50.0);
            assert_eq!(bar.close, 50.0);
        }
    }

    #[test]
    fn preserves_index_and_volume() {
        let bars = make_ohlc_bars(&[(1.0, 2.0, 0.5, 1.5), (1.5, 2.5, 1.0, 2.0)]);
        let ha = heikin_ashi(&bars);
        assert_eq!(ha.len(), bars.len());
        for (raw, derived) in bars.iter().zip(&ha) {
            assert_eq!(raw.timestamp, derived.timestamp);
            assert_eq!(raw.volume, derived.volume);
        }
    }
}
