//! Domain primitives: TimeMs, Address, Coin, Side, Direction.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Time in milliseconds since Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimeMs(pub i64);

impl TimeMs {
    pub fn new(ms: i64) -> Self {
        TimeMs(ms)
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }

    /// RFC 3339 rendering in UTC with millisecond precision.
    ///
    /// Returns `None` for timestamps chrono cannot represent.
    pub fn to_rfc3339(&self) -> Option<String> {
        DateTime::<Utc>::from_timestamp_millis(self.0)
            .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
    }
}

/// Wallet address (`0x` followed by up to 40 hex digits).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid address: {0}")]
pub struct AddressParseError(pub String);

impl Address {
    pub fn new(addr: String) -> Self {
        Address(addr)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Address {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex_part = s
            .strip_prefix("0x")
            .ok_or_else(|| AddressParseError(s.to_string()))?;
        if hex_part.is_empty()
            || hex_part.len() > 40
            || !hex_part.chars().all(|c| c.is_ascii_hexdigit())
        {
            return Err(AddressParseError(s.to_string()));
        }
        // The exchange treats addresses case-insensitively.
        Ok(Address(s.to_ascii_lowercase()))
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Coin/asset symbol (e.g., "BTC", "ETH", "@107").
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Coin(pub String);

impl Coin {
    pub fn new(coin: String) -> Self {
        Coin(coin)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Coin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Side of an individual fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Increases a long / reduces a short.
    Buy,
    /// Reduces a long / increases a short.
    Sell,
}

impl Side {
    /// Direction of a position opened by a fill on this side.
    pub fn opening_direction(&self) -> Direction {
        match self {
            Side::Buy => Direction::Long,
            Side::Sell => Direction::Short,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Buy => write!(f, "buy"),
            Side::Sell => write!(f, "sell"),
        }
    }
}

/// Direction of a round-trip position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Long,
    Short,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Long => write!(f, "long"),
            Direction::Short => write!(f, "short"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_opening_direction() {
        assert_eq!(Side::Buy.opening_direction(), Direction::Long);
        assert_eq!(Side::Sell.opening_direction(), Direction::Short);
    }

    #[test]
    fn test_side_and_direction_serialization() {
        assert_eq!(serde_json::to_string(&Side::Buy).unwrap(), "\"buy\"");
        assert_eq!(serde_json::to_string(&Side::Sell).unwrap(), "\"sell\"");
        assert_eq!(serde_json::to_string(&Direction::Long).unwrap(), "\"long\"");
        assert_eq!(serde_json::to_string(&Direction::Short).unwrap(), "\"short\"");
    }

    #[test]
    fn test_address_parse() {
        let addr: Address = "0xABCdef0123".parse().unwrap();
        assert_eq!(addr.as_str(), "0xabcdef0123");

        assert!("abcdef".parse::<Address>().is_err());
        assert!("0x".parse::<Address>().is_err());
        assert!("0xzz".parse::<Address>().is_err());
        assert!(format!("0x{}", "a".repeat(41)).parse::<Address>().is_err());
    }

    #[test]
    fn test_coin_display() {
        let coin = Coin::new("BTC".to_string());
        assert_eq!(coin.to_string(), "BTC");
    }

    #[test]
    fn test_timems_ordering() {
        assert!(TimeMs::new(1000) < TimeMs::new(2000));
    }

    #[test]
    fn test_timems_rfc3339() {
        assert_eq!(
            TimeMs::new(0).to_rfc3339().as_deref(),
            Some("1970-01-01T00:00:00.000Z")
        );
        assert_eq!(
            TimeMs::new(1_700_000_000_123).to_rfc3339().as_deref(),
            Some("2023-11-14T22:13:20.123Z")
        );
    }
}
