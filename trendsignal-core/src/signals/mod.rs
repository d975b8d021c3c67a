//! Direction-flip signal extraction.
//!
//! A flip is a change in direction between consecutive bars:
//! - Down -> Up: `Buy`
//! - Up -> Down: `Sell`
//!
//! Anything else (first bar, either side absent, unchanged direction) is no
//! signal. The pipeline only reports the last bar; `scan_flips` exposes the
//! whole history.

use crate::domain::{Direction, SignalKind};

/// Classify the transition from `prev` to `cur`.
pub fn classify(prev: Option<Direction>, cur: Option<Direction>) -> Option<SignalKind> {
    match (prev?, cur?) {
        (Direction::Down, Direction::Up) => Some(SignalKind::Buy),
        (Direction::Up, Direction::Down) => Some(SignalKind::Sell),
        _ => None,
    }
}

/// Every flip in the series as `(index, signal)`, in index order.
pub fn scan_flips(directions: &[Option<Direction>]) -> Vec<(usize, SignalKind)> {
    directions
        .windows(2)
        .enumerate()
        .filter_map(|(i, w)| classify(w[0], w[1]).map(|s| (i + 1, s)))
        .collect()
}

/// Classification of the final bar only.
pub fn last_signal(directions: &[Option<Direction>]) -> Option<SignalKind> {
    match directions {
        [.., prev, cur] => classify(*prev, *cur),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const U: Option<Direction> = Some(Direction::Up);
    const D: Option<Direction> = Some(Direction::Down);

    #[test]
    fn classify_transitions() {
        assert_eq!(classify(D, U), Some(SignalKind::Buy));
        assert_eq!(classify(U, D), Some(SignalKind::Sell));
        assert_eq!(classify(U, U), None);
        assert_eq!(classify(D, D), None);
        assert_eq!(classify(None, U), None);
        assert_eq!(classify(U, None), None);
    }

    #[test]
    fn scan_reports_all_flips_with_indices() {
        let dirs = [None, None, U, U, D, D, U, D];
        assert_eq!(
            scan_flips(&dirs),
            vec![
                (4, SignalKind::Sell),
                (6, SignalKind::Buy),
                (7, SignalKind::Sell)
            ]
        );
    }

    #[test]
    fn last_signal_only_looks_at_final_pair() {
        assert_eq!(last_signal(&[U, D, U]), Some(SignalKind::Buy));
        assert_eq!(last_signal(&[U, D, D]), None);
        assert_eq!(last_signal(&[D]), None);
        assert_eq!(last_signal(&[]), None);
    }
}
