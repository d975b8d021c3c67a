//! Tradable spot pair.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A spot pair such as `BTC/USDT`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Instrument {
    pub base: String,
    pub quote: String,
}

impl Instrument {
    pub fn new(base: impl Into<String>, quote: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            quote: quote.into(),
        }
    }

    /// Unified pair notation, `BASE/QUOTE`.
    pub fn pair(&self) -> String {
        format!("{}/{}", self.base, self.quote)
    }

    /// Venue notation without separator, `BASEQUOTE`.
    pub fn exchange_symbol(&self) -> String {
        format!("{}{}", self.base, self.quote)
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_both_notations() {
        let inst = Instrument::new("BTC", "USDT");
        assert_eq!(inst.pair(), "BTC/USDT");
        assert_eq!(inst.exchange_symbol(), "BTCUSDT");
        assert_eq!(inst.to_string(), "BTC/USDT");
    }
}
