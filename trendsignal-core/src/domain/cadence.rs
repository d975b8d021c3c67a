//! Candle cadence (bar interval).

use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fixed bar interval, rendered in exchange notation (`"4h"`, `"1d"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Cadence {
    M1,
    M3,
    M5,
    M15,
    M30,
    H1,
    H2,
    H4,
    H6,
    H8,
    H12,
    D1,
    D3,
    W1,
}

impl Cadence {
    pub const ALL: [Cadence; 14] = [
        Cadence::M1,
        Cadence::M3,
        Cadence::M5,
        Cadence::M15,
        Cadence::M30,
        Cadence::H1,
        Cadence::H2,
        Cadence::H4,
        Cadence::H6,
        Cadence::H8,
        Cadence::H12,
        Cadence::D1,
        Cadence::D3,
        Cadence::W1,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Cadence::M1 => "1m",
            Cadence::M3 => "3m",
            Cadence::M5 => "5m",
            Cadence::M15 => "15m",
            Cadence::M30 => "30m",
            Cadence::H1 => "1h",
            Cadence::H2 => "2h",
            Cadence::H4 => "4h",
            Cadence::H6 => "6h",
            Cadence::H8 => "8h",
            Cadence::H12 => "12h",
            Cadence::D1 => "1d",
            Cadence::D3 => "3d",
            Cadence::W1 => "1w",
        }
    }

    pub fn minutes(&self) -> i64 {
        match self {
            Cadence::M1 => 1,
            Cadence::M3 => 3,
            Cadence::M5 => 5,
            Cadence::M15 => 15,
            Cadence::M30 => 30,
            Cadence::H1 => 60,
            Cadence::H2 => 120,
            Cadence::H4 => 240,
            Cadence::H6 => 360,
            Cadence::H8 => 480,
            Cadence::H12 => 720,
            Cadence::D1 => 1_440,
            Cadence::D3 => 4_320,
            Cadence::W1 => 10_080,
        }
    }

    pub fn duration(&self) -> Duration {
        Duration::minutes(self.minutes())
    }
}

impl fmt::Display for Cadence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Cadence {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Cadence::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown cadence '{s}'"))
    }
}

impl TryFrom<String> for Cadence {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Cadence> for String {
    fn from(value: Cadence) -> Self {
        value.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_exchange_notation() {
        assert_eq!("4h".parse::<Cadence>().unwrap(), Cadence::H4);
        assert_eq!("1w".parse::<Cadence>().unwrap(), Cadence::W1);
        assert!("4H".parse::<Cadence>().is_err());
    }

    #[test]
    fn display_matches_parse() {
        for cadence in Cadence::ALL {
            assert_eq!(cadence.to_string().parse::<Cadence>().unwrap(), cadence);
        }
    }

    #[test]
    fn four_hour_duration() {
        assert_eq!(Cadence::H4.duration(), Duration::hours(4));
    }
}
