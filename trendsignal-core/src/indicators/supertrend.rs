//! Supertrend — ATR-based trend bands with direction flips on breakout.
//!
//! Inherently sequential: each bar's final bands and direction depend on the
//! previous bar's final bands, close and direction. Computed as a scan from
//! the anchor (first bar with a defined ATR).
//!
//! Per bar i after the anchor:
//! - final_upper[i] = basic_upper[i] if basic_upper[i] < final_upper[i-1]
//!   or close[i-1] > final_upper[i-1], else final_upper[i-1]
//! - final_lower[i] = basic_lower[i] if basic_lower[i] > final_lower[i-1]
//!   or close[i-1] < final_lower[i-1], else final_lower[i-1]
//! - direction flips up when close[i] > final_upper[i-1], down when
//!   close[i] < final_lower[i-1]; the *previous* final bands are the test.
//!
//! All comparisons are strict. Equality carries the previous value forward.

use super::atr::Atr;
use super::Indicator;
use crate::domain::{Bar, Direction};
use thiserror::Error;

/// Per-bar state of the band recurrence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandState {
    pub basic_upper: f64,
    pub basic_lower: f64,
    pub final_upper: f64,
    pub final_lower: f64,
    pub direction: Direction,
    /// Active band: final_lower when up, final_upper when down.
    pub trend: f64,
}

impl BandState {
    fn anchor(bar: &Bar, atr: f64, multiplier: f64) -> Self {
        let (basic_upper, basic_lower) = basic_bands(bar, atr, multiplier);
        Self {
            basic_upper,
            basic_lower,
            final_upper: basic_upper,
            final_lower: basic_lower,
            direction: Direction::Up,
            trend: basic_lower,
        }
    }

    fn next(&self, prev_bar: &Bar, bar: &Bar, atr: f64, multiplier: f64) -> Self {
        let (basic_upper, basic_lower) = basic_bands(bar, atr, multiplier);

        let final_upper =
            if basic_upper < self.final_upper || prev_bar.close > self.final_upper {
                basic_upper
            } else {
                self.final_upper
            };

        let final_lower =
            if basic_lower > self.final_lower || prev_bar.close < self.final_lower {
                basic_lower
            } else {
                self.final_lower
            };

        let direction = if bar.close > self.final_upper {
            Direction::Up
        } else if bar.close < self.final_lower {
            Direction::Down
        } else {
            self.direction
        };

        let trend = match direction {
            Direction::Up => final_lower,
            Direction::Down => final_upper,
        };

        Self {
            basic_upper,
            basic_lower,
            final_upper,
            final_lower,
            direction,
            trend,
        }
    }
}

fn basic_bands(bar: &Bar, atr: f64, multiplier: f64) -> (f64, f64) {
    let mid = bar.mid();
    (mid + multiplier * atr, mid - multiplier * atr)
}

/// Band states from the anchor to the end of the input.
///
/// Empty when ATR never becomes defined.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SupertrendOutput {
    len: usize,
    anchor: Option<usize>,
    states: Vec<BandState>,
}

impl SupertrendOutput {
    fn empty(len: usize) -> Self {
        Self {
            len,
            anchor: None,
            states: Vec::new(),
        }
    }

    /// Index of the first bar with a defined state.
    pub fn anchor(&self) -> Option<usize> {
        self.anchor
    }

    /// Length of the input series the output is aligned to.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True when no bar has a defined state.
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// States from the anchor onwards.
    pub fn states(&self) -> &[BandState] {
        &self.states
    }

    /// State at input index `i`, absent before the anchor.
    pub fn state(&self, i: usize) -> Option<&BandState> {
        let anchor = self.anchor?;
        i.checked_sub(anchor).and_then(|k| self.states.get(k))
    }

    /// Full-length direction series, absent before the anchor.
    pub fn directions(&self) -> Vec<Option<Direction>> {
        (0..self.len)
            .map(|i| self.state(i).map(|s| s.direction))
            .collect()
    }

    /// Full-length trend line, absent before the anchor.
    pub fn trend(&self) -> Vec<Option<f64>> {
        (0..self.len).map(|i| self.state(i).map(|s| s.trend)).collect()
    }
}

/// ATR input the band engine cannot run on.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BandError {
    #[error("ATR has {atr} values for {bars} bars")]
    LengthMismatch { bars: usize, atr: usize },

    #[error("ATR undefined at index {index}, after the first defined value")]
    AtrGap { index: usize },
}

/// Run the band recurrence over `bars` using a precomputed ATR series.
///
/// `atr` must be aligned with `bars` and, once defined, defined for every
/// later bar. Either violation is an error rather than a truncated output.
pub fn supertrend(
    bars: &[Bar],
    atr: &[Option<f64>],
    multiplier: f64,
) -> Result<SupertrendOutput, BandError> {
    if atr.len() != bars.len() {
        return Err(BandError::LengthMismatch {
            bars: bars.len(),
            atr: atr.len(),
        });
    }
    if let Some(anchor) = atr.iter().position(Option::is_some) {
        if let Some(gap) = atr[anchor..].iter().position(Option::is_none) {
            return Err(BandError::AtrGap {
                index: anchor + gap,
            });
        }
    }
    Ok(band_scan(bars, atr, multiplier))
}

/// Band recurrence without input checks; `atr` comes from `Atr::compute`
/// over the same bars.
pub(crate) fn band_scan(bars: &[Bar], atr: &[Option<f64>], multiplier: f64) -> SupertrendOutput {
    let len = bars.len();
    let anchor_atr = atr
        .iter()
        .take(len)
        .enumerate()
        .find_map(|(i, v)| v.map(|v| (i, v)));

    let Some((anchor, anchor_atr)) = anchor_atr else {
        return SupertrendOutput::empty(len);
    };

    let seed = BandState::anchor(&bars[anchor], anchor_atr, multiplier);
    let rest = bars[anchor..]
        .windows(2)
        .zip(atr.iter().skip(anchor + 1))
        .scan(seed, |prev, (pair, atr_i)| {
            let next = prev.next(&pair[0], &pair[1], (*atr_i)?, multiplier);
            *prev = next;
            Some(next)
        });

    SupertrendOutput {
        len,
        anchor: Some(anchor),
        states: std::iter::once(seed).chain(rest).collect(),
    }
}

#[derive(Debug, Clone)]
pub struct Supertrend {
    period: usize,
    multiplier: f64,
    name: String,
}

impl Supertrend {
    pub fn new(period: usize, multiplier: f64) -> Self {
        assert!(period >= 1, "Supertrend period must be >= 1");
        Self {
            period,
            multiplier,
            name: format!("supertrend_{period}_{multiplier}"),
        }
    }
}

impl Indicator for Supertrend {
    type Output = SupertrendOutput;

    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, bars: &[Bar]) -> SupertrendOutput {
        let atr = Atr::new(self.period).compute(bars);
        band_scan(bars, &atr, self.multiplier)
    }
}
