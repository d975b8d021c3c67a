//! Trend direction, flip classification and the per-instrument output row.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Discrete trend direction emitted by the band engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    /// Numeric form: +1 for up, -1 for down.
    pub fn value(self) -> i8 {
        match self {
            Direction::Up => 1,
            Direction::Down => -1,
        }
    }
}

/// A direction flip: `Buy` on -1 → +1, `Sell` on +1 → -1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalKind {
    Buy,
    Sell,
}

/// One output row per instrument and run.
///
/// Serializes as `{"SYMBOL": "BTC", "SIGNAL": "Buy" | "Sell" | null,
/// "TIMESTAMP": "2024-01-01T04:00:00Z" | null}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentSignal {
    #[serde(rename = "SYMBOL")]
    pub symbol: String,
    #[serde(rename = "SIGNAL", default)]
    pub signal: Option<SignalKind>,
    #[serde(rename = "TIMESTAMP", default, with = "iso_utc")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl InstrumentSignal {
    /// Row for an instrument that produced no usable result.
    pub fn null(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            signal: None,
            timestamp: None,
        }
    }
}

/// ISO-8601 UTC with a `Z` suffix; fractional seconds only when present.
mod iso_utc {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(ts) => serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        raw.map(|s| {
            DateTime::parse_from_rfc3339(&s)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(serde::de::Error::custom)
        })
        .transpose()
    }
}
