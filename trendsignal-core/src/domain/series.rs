//! Series — a time-ordered run of bars with unique timestamps.

use super::Bar;
use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum SeriesError {
    #[error("timestamps must be strictly increasing (violated at index {index})")]
    NotStrictlyIncreasing { index: usize },
}

/// Ordered sequence of bars. Timestamps are strictly increasing.
///
/// Derived series (Heikin-Ashi, ATR, band states) are aligned position-wise:
/// index `i` in any derived output refers to `bars()[i]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Series {
    bars: Vec<Bar>,
}

impl Series {
    /// Build a series, rejecting unordered or duplicated timestamps.
    pub fn new(bars: Vec<Bar>) -> Result<Self, SeriesError> {
        if let Some(i) = bars
            .windows(2)
            .position(|w| w[1].timestamp <= w[0].timestamp)
        {
            return Err(SeriesError::NotStrictlyIncreasing { index: i + 1 });
        }
        Ok(Self { bars })
    }

    /// Wrap bars already known to be ordered (canonicalized or derived).
    pub(crate) fn from_ordered(bars: Vec<Bar>) -> Self {
        debug_assert!(bars.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
        Self { bars }
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn timestamps(&self) -> impl Iterator<Item = DateTime<Utc>> + '_ {
        self.bars.iter().map(|b| b.timestamp)
    }

    pub fn last_timestamp(&self) -> Option<DateTime<Utc>> {
        self.bars.last().map(|b| b.timestamp)
    }

    /// BLAKE3 hash over timestamps and OHLCV values.
    ///
    /// Two series with the same fingerprint produce the same signal.
    pub fn fingerprint(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        for bar in &self.bars {
            hasher.update(&bar.timestamp.timestamp_millis().to_le_bytes());
            hasher.update(&bar.open.to_le_bytes());
            hasher.update(&bar.high.to_le_bytes());
            hasher.update(&bar.low.to_le_bytes());
            hasher.update(&bar.close.to_le_bytes());
            hasher.update(&bar.volume.to_le_bytes());
        }
        hasher.finalize().to_hex().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn bar_at(hours: i64, close: f64) -> Bar {
        Bar {
            timestamp: Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap() + Duration::hours(hours),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 1.0,
        }
    }

    #[test]
    fn accepts_increasing_timestamps() {
        let series = Series::new(vec![bar_at(0, 1.0), bar_at(4, 2.0), bar_at(8, 3.0)]).unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series.last_timestamp(), Some(bar_at(8, 0.0).timestamp));
    }

    #[test]
    fn rejects_duplicate_timestamp() {
        let err = Series::new(vec![bar_at(0, 1.0), bar_at(4, 2.0), bar_at(4, 3.0)]).unwrap_err();
        assert_eq!(err, SeriesError::NotStrictlyIncreasing { index: 2 });
    }

    #[test]
    fn rejects_descending_timestamp() {
        assert!(Series::new(vec![bar_at(4, 1.0), bar_at(0, 2.0)]).is_err());
    }

    #[test]
    fn fingerprint_tracks_content() {
        let a = Series::new(vec![bar_at(0, 1.0), bar_at(4, 2.0)]).unwrap();
        let b = Series::new(vec![bar_at(0, 1.0), bar_at(4, 2.0)]).unwrap();
        let c = Series::new(vec![bar_at(0, 1.0), bar_at(4, 2.5)]).unwrap();
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), c.fingerprint());
    }
}
