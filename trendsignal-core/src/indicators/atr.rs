//! Average True Range (ATR).
//!
//! True Range: max(high-low, |high-prev_close|, |low-prev_close|), with
//! TR[0] = high[0]-low[0].
//! ATR is Wilder's recursive average (alpha = 1/period) seeded from TR[0] and
//! reported from index period-1 onwards.

use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Atr {
    period: usize,
    name: String,
}

impl Atr {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "ATR period must be >= 1");
        Self {
            period,
            name: format!("atr_{period}"),
        }
    }
}

/// Compute the True Range series from bars.
pub fn true_range(bars: &[Bar]) -> Vec<f64> {
    let Some(first) = bars.first() else {
        return Vec::new();
    };

    std::iter::once(first.high - first.low)
        .chain(bars.windows(2).map(|w| {
            let (prev, bar) = (&w[0], &w[1]);
            (bar.high - bar.low)
                .max((bar.high - prev.close).abs())
                .max((bar.low - prev.close).abs())
        }))
        .collect()
}

/// Wilder smoothing: `s[0] = x[0]`, `s[i] = alpha*x[i] + (1-alpha)*s[i-1]`.
///
/// The recursion runs over every sample, but values before index `period-1`
/// are reported as absent.
pub fn wilder_smooth(values: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; values.len()];
    }
    let alpha = 1.0 / period as f64;

    values
        .iter()
        .enumerate()
        .scan(None::<f64>, |prev, (i, &x)| {
            let smoothed = match *prev {
                None => x,
                Some(p) => alpha * x + (1.0 - alpha) * p,
            };
            *prev = Some(smoothed);
            Some((i + 1 >= period).then_some(smoothed))
        })
        .collect()
}

impl Indicator for Atr {
    type Output = Vec<Option<f64>>;

    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, bars: &[Bar]) -> Vec<Option<f64>> {
        wilder_smooth(&true_range(bars), self.period)
    }
}
