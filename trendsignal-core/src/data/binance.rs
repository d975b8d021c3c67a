//! Binance spot REST provider and market catalog.
//!
//! Klines: `GET /api/v3/klines?symbol=BTCUSDT&interval=4h&startTime=..&limit=..`,
//! each row `[open_time_ms, "open", "high", "low", "close", "volume", ...]`.
//! Catalog: `GET /api/v3/exchangeInfo`, filtered to spot pairs in `TRADING` status.
//!
//! HTTP 418/403 mean the IP is banned and trip the circuit breaker at once.
//! HTTP 429 counts toward the breaker threshold. No retries happen here; the
//! pipeline treats any error as a per-instrument failure.

use super::catalog::MarketCatalog;
use super::circuit_breaker::CircuitBreaker;
use super::provider::{DataError, MarketDataProvider};
use crate::domain::{Bar, Cadence, Instrument};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

pub const BINANCE_BASE_URL: &str = "https://api.binance.com";
pub const BINANCE_US_BASE_URL: &str = "https://api.binance.us";

/// Largest page the klines endpoint serves.
pub const MAX_PAGE_LIMIT: usize = 1000;

/// Binance "Invalid symbol." error code.
const INVALID_SYMBOL_CODE: i64 = -1121;

#[derive(Debug, Deserialize)]
struct ApiError {
    code: i64,
    msg: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExchangeInfo {
    symbols: Vec<SymbolInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SymbolInfo {
    status: String,
    base_asset: String,
    quote_asset: String,
    #[serde(default = "default_true")]
    is_spot_trading_allowed: bool,
}

fn default_true() -> bool {
    true
}

/// Blocking Binance REST client.
pub struct BinanceClient {
    client: reqwest::blocking::Client,
    base_url: String,
    circuit_breaker: Arc<CircuitBreaker>,
}

impl BinanceClient {
    pub fn new(
        base_url: impl Into<String>,
        circuit_breaker: Arc<CircuitBreaker>,
    ) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("trendsignal/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DataError::Other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            circuit_breaker,
        })
    }

    /// Client for a configured exchange id (`binance` or `binanceus`).
    pub fn for_exchange(
        exchange_id: &str,
        circuit_breaker: Arc<CircuitBreaker>,
    ) -> Result<Self, DataError> {
        match exchange_id.to_ascii_lowercase().as_str() {
            "binance" => Self::new(BINANCE_BASE_URL, circuit_breaker),
            "binanceus" => Self::new(BINANCE_US_BASE_URL, circuit_breaker),
            other => Err(DataError::UnsupportedExchange(other.to_string())),
        }
    }

    fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        symbol: &str,
    ) -> Result<T, DataError> {
        if !self.circuit_breaker.is_allowed() {
            return Err(DataError::CircuitBreakerTripped);
        }

        let url = format!("{}{path}", self.base_url);
        let resp = self
            .client
            .get(&url)
            .query(query)
            .send()
            .map_err(|e| {
                if e.is_connect() || e.is_timeout() {
                    DataError::NetworkUnreachable(e.to_string())
                } else {
                    DataError::Other(format!("request to {path} failed: {e}"))
                }
            })?;

        let status = resp.status();

        if status == reqwest::StatusCode::IM_A_TEAPOT || status == reqwest::StatusCode::FORBIDDEN {
            self.circuit_breaker.trip();
            return Err(DataError::CircuitBreakerTripped);
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            self.circuit_breaker.record_failure();
            let retry_after_secs = resp
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(60);
            return Err(DataError::RateLimited { retry_after_secs });
        }

        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            if let Ok(api) = serde_json::from_str::<ApiError>(&body) {
                if api.code == INVALID_SYMBOL_CODE {
                    return Err(DataError::SymbolNotFound {
                        symbol: symbol.to_string(),
                    });
                }
                return Err(DataError::Http {
                    status: status.as_u16(),
                    body: format!("{} ({})", api.msg, api.code),
                });
            }
            if status.is_server_error() {
                self.circuit_breaker.record_failure();
            }
            return Err(DataError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let parsed = resp.json::<T>().map_err(|e| {
            DataError::ResponseFormatChanged(format!("failed to parse {path} response: {e}"))
        })?;
        self.circuit_breaker.record_success();
        Ok(parsed)
    }
}

/// Parse raw kline rows into bars.
fn parse_klines(symbol: &str, rows: Vec<Vec<serde_json::Value>>) -> Result<Vec<Bar>, DataError> {
    rows.into_iter()
        .enumerate()
        .map(|(i, row)| {
            let malformed =
                |what: &str| DataError::ResponseFormatChanged(format!("{symbol} kline {i}: {what}"));

            if row.len() < 6 {
                return Err(malformed("fewer than 6 fields"));
            }
            let open_time = row[0].as_i64().ok_or_else(|| malformed("open time"))?;
            let timestamp =
                DateTime::from_timestamp_millis(open_time).ok_or_else(|| malformed("open time"))?;
            let price = |k: usize, name: &str| -> Result<f64, DataError> {
                row[k]
                    .as_str()
                    .and_then(|s| s.parse::<f64>().ok())
                    .ok_or_else(|| malformed(name))
            };

            Ok(Bar {
                timestamp,
                open: price(1, "open")?,
                high: price(2, "high")?,
                low: price(3, "low")?,
                close: price(4, "close")?,
                volume: price(5, "volume")?,
            })
        })
        .collect()
}

fn markets_from_exchange_info(info: ExchangeInfo) -> BTreeSet<String> {
    info.symbols
        .into_iter()
        .filter(|s| s.status == "TRADING" && s.is_spot_trading_allowed)
        .map(|s| format!("{}/{}", s.base_asset, s.quote_asset))
        .collect()
}

impl MarketDataProvider for BinanceClient {
    fn name(&self) -> &str {
        "binance"
    }

    fn fetch_page(
        &self,
        instrument: &Instrument,
        cadence: Cadence,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Bar>, DataError> {
        let symbol = instrument.exchange_symbol();
        let query = [
            ("symbol", symbol.clone()),
            ("interval", cadence.as_str().to_string()),
            ("startTime", since.timestamp_millis().to_string()),
            ("limit", limit.clamp(1, MAX_PAGE_LIMIT).to_string()),
        ];
        let rows: Vec<Vec<serde_json::Value>> = self.get_json("/api/v3/klines", &query, &symbol)?;
        parse_klines(&symbol, rows)
    }

    fn is_available(&self) -> bool {
        self.circuit_breaker.is_allowed()
    }
}

impl MarketCatalog for BinanceClient {
    fn load_markets(&self) -> Result<BTreeSet<String>, DataError> {
        let info: ExchangeInfo = self.get_json("/api/v3/exchangeInfo", &[], "*")?;
        Ok(markets_from_exchange_info(info))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_kline_rows() {
        let rows: Vec<Vec<serde_json::Value>> = serde_json::from_str(
            r#"[
                [1704067200000, "42283.58", "42554.57", "42261.02", "42475.23", "1271.68", 1704081599999, "0", 0, "0", "0", "0"],
                [1704081600000, "42475.23", "42775.00", "42431.65", "42613.56", "1196.37", 1704095999999, "0", 0, "0", "0", "0"]
            ]"#,
        )
        .unwrap();
        let bars = parse_klines("BTCUSDT", rows).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(
            bars[0].timestamp,
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
        );
        assert_eq!(bars[0].open, 42283.58);
        assert_eq!(bars[1].close, 42613.56);
        assert_eq!(bars[1].volume, 1196.37);
    }

    #[test]
    fn rejects_malformed_kline() {
        let rows: Vec<Vec<serde_json::Value>> =
            serde_json::from_str(r#"[[1704067200000, "1.0", "oops", "1.0", "1.0", "1.0"]]"#)
                .unwrap();
        let err = parse_klines("BTCUSDT", rows).unwrap_err();
        assert!(matches!(err, DataError::ResponseFormatChanged(msg) if msg.contains("high")));
    }

    #[test]
    fn rejects_short_kline() {
        let rows: Vec<Vec<serde_json::Value>> =
            serde_json::from_str(r#"[[1704067200000, "1.0"]]"#).unwrap();
        assert!(parse_klines("BTCUSDT", rows).is_err());
    }

    #[test]
    fn exchange_info_keeps_trading_spot_pairs() {
        let info: ExchangeInfo = serde_json::from_str(
            r#"{"symbols": [
                {"symbol": "BTCUSDT", "status": "TRADING", "baseAsset": "BTC", "quoteAsset": "USDT", "isSpotTradingAllowed": true},
                {"symbol": "LUNAUSDT", "status": "BREAK", "baseAsset": "LUNA", "quoteAsset": "USDT", "isSpotTradingAllowed": true},
                {"symbol": "ETHBTC", "status": "TRADING", "baseAsset": "ETH", "quoteAsset": "BTC"},
                {"symbol": "XYZUSDT", "status": "TRADING", "baseAsset": "XYZ", "quoteAsset": "USDT", "isSpotTradingAllowed": false}
            ]}"#,
        )
        .unwrap();
        let markets = markets_from_exchange_info(info);
        assert_eq!(
            markets.into_iter().collect::<Vec<_>>(),
            vec!["BTC/USDT".to_string(), "ETH/BTC".to_string()]
        );
    }

    #[test]
    fn unknown_exchange_is_rejected() {
        let cb = Arc::new(CircuitBreaker::default_exchange());
        let err = BinanceClient::for_exchange("kraken", cb).err().unwrap();
        assert!(matches!(err, DataError::UnsupportedExchange(id) if id == "kraken"));
    }

    #[test]
    fn tripped_breaker_short_circuits_requests() {
        let cb = Arc::new(CircuitBreaker::default_exchange());
        cb.trip();
        let client = BinanceClient::new("http://127.0.0.1:9", cb).unwrap();
        assert!(!client.is_available());
        let err = client
            .fetch_page(
                &Instrument::new("BTC", "USDT"),
                Cadence::H4,
                Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
                10,
            )
            .unwrap_err();
        assert!(matches!(err, DataError::CircuitBreakerTripped));
    }
}
