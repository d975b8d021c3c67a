//! Seeded random-walk provider for offline runs and tests.
//!
//! Bars are clearly fake. Each instrument gets its own walk, seeded from the
//! provider seed and the pair name, so the same `(seed, pair, now)` always
//! yields the same history regardless of request order or paging.

use super::catalog::MarketCatalog;
use super::provider::{DataError, MarketDataProvider};
use crate::domain::{Bar, Cadence, Instrument};
use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeSet;

pub struct SyntheticProvider {
    seed: u64,
    now: DateTime<Utc>,
    history: Duration,
    markets: BTreeSet<String>,
}

impl SyntheticProvider {
    /// Walks covering `history` before the fixed clock `now`.
    pub fn new(seed: u64, now: DateTime<Utc>, history: Duration) -> Self {
        Self {
            seed,
            now,
            history,
            markets: BTreeSet::new(),
        }
    }

    /// Pairs (`BASE/QUOTE`) reported by the catalog.
    pub fn with_markets<I, S>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.markets = pairs.into_iter().map(Into::into).collect();
        self
    }

    fn rng_for(&self, instrument: &Instrument, cadence: Cadence) -> StdRng {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.seed.to_le_bytes());
        hasher.update(instrument.pair().as_bytes());
        hasher.update(cadence.as_str().as_bytes());
        StdRng::from_seed(*hasher.finalize().as_bytes())
    }

    /// First bar open time: `now - history`, floored to the cadence grid.
    fn origin(&self, cadence: Cadence) -> DateTime<Utc> {
        let step = cadence.duration().num_milliseconds().max(1);
        let start = (self.now - self.history).timestamp_millis();
        DateTime::from_timestamp_millis(start - start.rem_euclid(step))
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// Full walk for one instrument, every bar opening at or before `now`.
    pub fn generate(&self, instrument: &Instrument, cadence: Cadence) -> Vec<Bar> {
        let mut rng = self.rng_for(instrument, cadence);
        let step = cadence.duration();
        let mut timestamp = self.origin(cadence);
        let mut price = rng.gen_range(1.0..1_000.0_f64);
        let mut bars = Vec::new();

        while timestamp <= self.now {
            let ret: f64 = rng.gen_range(-0.03..0.03);
            let open = price;
            let close = price * (1.0 + ret);
            let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
            let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
            let volume = rng.gen_range(1_000.0..100_000.0);

            bars.push(Bar {
                timestamp,
                open,
                high,
                low,
                close,
                volume,
            });

            price = close;
            timestamp += step;
        }

        bars
    }
}

impl MarketDataProvider for SyntheticProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn fetch_page(
        &self,
        instrument: &Instrument,
        cadence: Cadence,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Bar>, DataError> {
        if !self.markets.is_empty() && !self.markets.contains(&instrument.pair()) {
            return Err(DataError::SymbolNotFound {
                symbol: instrument.exchange_symbol(),
            });
        }
        Ok(self
            .generate(instrument, cadence)
            .into_iter()
            .filter(|b| b.timestamp >= since)
            .take(limit)
            .collect())
    }

    fn now(&self) -> DateTime<Utc> {
        self.now
    }
}

impl MarketCatalog for SyntheticProvider {
    fn load_markets(&self) -> Result<BTreeSet<String>, DataError> {
        Ok(self.markets.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 13, 30, 0).unwrap()
    }

    fn provider() -> SyntheticProvider {
        SyntheticProvider::new(42, now(), Duration::days(30))
    }

    #[test]
    fn same_seed_same_walk() {
        let btc = Instrument::new("BTC", "USDT");
        assert_eq!(
            provider().generate(&btc, Cadence::H4),
            provider().generate(&btc, Cadence::H4)
        );
    }

    #[test]
    fn different_pairs_different_walks() {
        let p = provider();
        let a = p.generate(&Instrument::new("BTC", "USDT"), Cadence::H4);
        let b = p.generate(&Instrument::new("ETH", "USDT"), Cadence::H4);
        assert_eq!(a.len(), b.len());
        assert_ne!(a[0].close, b[0].close);
    }

    #[test]
    fn bars_sit_on_cadence_grid_and_are_sane() {
        let bars = provider().generate(&Instrument::new("BTC", "USDT"), Cadence::H4);
        // 30 days of 4h bars starting from a floored origin
        assert_eq!(bars.len(), 30 * 6 + 1);
        for w in bars.windows(2) {
            assert_eq!(w[1].timestamp - w[0].timestamp, Duration::hours(4));
        }
        assert!(bars.iter().all(|b| b.timestamp.timestamp() % (4 * 3600) == 0));
        assert!(bars.iter().all(Bar::is_sane));
        assert!(bars.last().unwrap().timestamp <= now());
    }

    #[test]
    fn pages_respect_since_and_limit() {
        let p = provider();
        let btc = Instrument::new("BTC", "USDT");
        let all = p.generate(&btc, Cadence::H4);
        let page = p.fetch_page(&btc, Cadence::H4, all[10].timestamp, 5).unwrap();
        assert_eq!(page, all[10..15].to_vec());
    }

    #[test]
    fn unlisted_pair_is_rejected_when_markets_configured() {
        let p = provider().with_markets(["BTC/USDT"]);
        assert!(p
            .fetch_page(&Instrument::new("BTC", "USDT"), Cadence::H4, now(), 1)
            .is_ok());
        let err = p
            .fetch_page(&Instrument::new("ETH", "USDT"), Cadence::H4, now(), 1)
            .unwrap_err();
        assert!(matches!(err, DataError::SymbolNotFound { .. }));
    }

    #[test]
    fn catalog_lists_configured_markets() {
        let p = provider().with_markets(["ETH/USDT", "BTC/USDT"]);
        let markets = p.load_markets().unwrap();
        assert_eq!(markets.len(), 2);
        assert!(markets.contains("BTC/USDT"));
    }
}
