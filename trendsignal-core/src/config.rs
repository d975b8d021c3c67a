//! Serializable signal-run configuration.
//!
//! One immutable value built at startup (TOML file or defaults) and passed
//! explicitly to every pipeline call. Defaults mirror the production
//! deployment: Binance spot, USDT quote, 4h candles, three months of history,
//! ten large-cap bases, ATR(10) × 2.0 on Heikin-Ashi candles.

use crate::data::catalog::DEFAULT_LEVERAGED_PATTERNS;
use crate::data::fetch::FetchWindow;
use crate::domain::Cadence;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {field} {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialize(String),
}

/// Full configuration of a signal run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SignalConfig {
    /// Venue id (`binance` or `binanceus`).
    pub exchange: String,

    /// Quote asset every base is paired with.
    pub quote: String,

    /// Candle cadence, exchange notation.
    pub timeframe: Cadence,

    /// Calendar months of history to fetch.
    pub lookback_months: u32,

    /// Base assets, in output order.
    pub coins: Vec<String>,

    /// Stop resolving once this many instruments are found.
    pub target_count: usize,

    pub atr_period: usize,
    pub multiplier: f64,
    pub use_heikin_ashi: bool,

    /// Bars required beyond `atr_period` before a signal is reported.
    pub warmup_margin: usize,

    /// Bars requested per page.
    pub page_limit: usize,

    /// Delay after each non-empty page, milliseconds.
    pub pacing_ms: u64,

    /// Substrings of `BASE/QUOTE` that mark leveraged tokens.
    pub leveraged_patterns: Vec<String>,

    /// Evaluate instruments on a rayon pool instead of sequentially.
    pub parallel: bool,
    pub max_parallel: usize,

    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            exchange: "binance".to_string(),
            quote: "USDT".to_string(),
            timeframe: Cadence::H4,
            lookback_months: 3,
            coins: ["BTC", "ETH", "BNB", "XRP", "SOL", "DOGE", "ADA", "XLM", "SUI", "TRX"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            target_count: 10,
            atr_period: 10,
            multiplier: 2.0,
            use_heikin_ashi: true,
            warmup_margin: 5,
            page_limit: 1000,
            pacing_ms: 50,
            leveraged_patterns: DEFAULT_LEVERAGED_PATTERNS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            parallel: false,
            max_parallel: 4,
            server: ServerConfig::default(),
        }
    }
}

impl SignalConfig {
    /// Load and validate a TOML config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate TOML. Missing keys take their defaults.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |field: &'static str, reason: &str| {
            Err(ConfigError::Invalid {
                field,
                reason: reason.to_string(),
            })
        };

        if self.exchange.trim().is_empty() {
            return invalid("exchange", "must not be empty");
        }
        if self.quote.trim().is_empty() {
            return invalid("quote", "must not be empty");
        }
        if self.lookback_months == 0 {
            return invalid("lookback_months", "must be at least 1");
        }
        if self.atr_period == 0 {
            return invalid("atr_period", "must be at least 1");
        }
        if !self.multiplier.is_finite() || self.multiplier <= 0.0 {
            return invalid("multiplier", "must be a positive finite number");
        }
        if self.target_count == 0 {
            return invalid("target_count", "must be at least 1");
        }
        if self.page_limit == 0 || self.page_limit > 1000 {
            return invalid("page_limit", "must be between 1 and 1000");
        }
        if self.parallel && self.max_parallel == 0 {
            return invalid("max_parallel", "must be at least 1 when parallel is enabled");
        }
        if self.leveraged_patterns.iter().any(|p| p.is_empty()) {
            return invalid("leveraged_patterns", "must not contain empty patterns");
        }
        Ok(())
    }

    /// Shortest series that yields a signal.
    pub fn min_bars(&self) -> usize {
        self.atr_period + self.warmup_margin
    }

    pub fn pacing(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.pacing_ms)
    }

    /// Lookback window ending at `now`.
    pub fn fetch_window(&self, now: DateTime<Utc>) -> FetchWindow {
        FetchWindow::lookback(
            now,
            self.lookback_months,
            self.timeframe,
            self.page_limit,
            self.pacing(),
        )
    }

    /// BLAKE3 hash of the canonical JSON form; identical configs share it.
    pub fn fingerprint(&self) -> Result<String, ConfigError> {
        let json = serde_json::to_vec(self).map_err(|e| ConfigError::Serialize(e.to_string()))?;
        Ok(blake3::hash(&json).to_hex().to_string())
    }
}
