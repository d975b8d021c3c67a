//! Instrument catalog and symbol resolution.
//!
//! Turns a configured list of base assets into tradable spot pairs. Bases the
//! venue does not list are skipped with a warning; leveraged-token pairs are
//! dropped by a configurable substring blocklist.

use super::provider::DataError;
use crate::domain::Instrument;
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

/// Default leveraged-token patterns, matched as substrings of `BASE/QUOTE`.
pub const DEFAULT_LEVERAGED_PATTERNS: [&str; 10] = [
    "UP/", "DOWN/", "BULL/", "BEAR/", "3L/", "3S/", "4L/", "4S/", "5L/", "5S/",
];

/// Source of the set of tradable pairs on a venue.
pub trait MarketCatalog: Send + Sync {
    /// Every tradable spot pair in `BASE/QUOTE` form.
    fn load_markets(&self) -> Result<BTreeSet<String>, DataError>;
}

/// True if the pair matches any leveraged-token pattern.
pub fn is_leveraged(pair: &str, patterns: &[String]) -> bool {
    patterns.iter().any(|p| pair.contains(p.as_str()))
}

/// Resolve bases against the venue's markets, in input order, up to `target`.
pub fn resolve_instruments(
    markets: &BTreeSet<String>,
    bases: &[String],
    quote: &str,
    target: usize,
    leveraged_patterns: &[String],
) -> Vec<Instrument> {
    let mut out = Vec::new();

    for base in bases {
        if out.len() >= target {
            break;
        }
        let instrument = Instrument::new(base.as_str(), quote);
        let pair = instrument.pair();

        if !markets.contains(&pair) {
            warn!(pair = %pair, "symbol not listed, skipping");
            continue;
        }
        if is_leveraged(&pair, leveraged_patterns) {
            debug!(pair = %pair, "leveraged token filtered out");
            continue;
        }
        out.push(instrument);
    }

    if out.len() < target {
        info!(
            resolved = out.len(),
            target, "fewer symbols than target, continuing with what resolved"
        );
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn markets(pairs: &[&str]) -> BTreeSet<String> {
        pairs.iter().map(|s| s.to_string()).collect()
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn default_patterns() -> Vec<String> {
        DEFAULT_LEVERAGED_PATTERNS.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn resolves_listed_bases_in_order() {
        let m = markets(&["BTC/USDT", "ETH/USDT", "SOL/USDT"]);
        let out = resolve_instruments(&m, &strings(&["SOL", "BTC"]), "USDT", 10, &default_patterns());
        assert_eq!(
            out,
            vec![Instrument::new("SOL", "USDT"), Instrument::new("BTC", "USDT")]
        );
    }

    #[test]
    fn skips_unlisted_bases() {
        let m = markets(&["BTC/USDT"]);
        let out =
            resolve_instruments(&m, &strings(&["NOPE", "BTC"]), "USDT", 10, &default_patterns());
        assert_eq!(out, vec![Instrument::new("BTC", "USDT")]);
    }

    #[test]
    fn filters_leveraged_tokens() {
        let m = markets(&["BTCUP/USDT", "ETHBEAR/USDT", "XRP/USDT", "LINK3L/USDT"]);
        let out = resolve_instruments(
            &m,
            &strings(&["BTCUP", "ETHBEAR", "LINK3L", "XRP"]),
            "USDT",
            10,
            &default_patterns(),
        );
        assert_eq!(out, vec![Instrument::new("XRP", "USDT")]);
    }

    #[test]
    fn custom_patterns_replace_defaults() {
        let m = markets(&["BTCUP/USDT", "ETH2X/USDT"]);
        let out = resolve_instruments(
            &m,
            &strings(&["BTCUP", "ETH2X"]),
            "USDT",
            10,
            &strings(&["2X/"]),
        );
        assert_eq!(out, vec![Instrument::new("BTCUP", "USDT")]);
    }

    #[test]
    fn stops_at_target() {
        let m = markets(&["A/USDT", "B/USDT", "C/USDT"]);
        let out = resolve_instruments(&m, &strings(&["A", "B", "C"]), "USDT", 2, &[]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[1].base, "B");
    }

    #[test]
    fn nothing_resolved_is_empty() {
        let out = resolve_instruments(&markets(&[]), &strings(&["BTC"]), "USDT", 10, &[]);
        assert!(out.is_empty());
    }
}
