use crate::domain::{Coin, Decimal};
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_API_URL: &str = "https://api.hyperliquid.xyz";

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub hyperliquid_api_url: String,
    /// Coins kept fresh by the background book feed. Empty disables the feed.
    pub book_coins: Vec<Coin>,
    pub book_poll_interval: Duration,
    /// Default price grid for `/v1/book` when the request gives none.
    pub book_precision: Decimal,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let port = env_map
            .get("PORT")
            .map(|s| s.as_str())
            .unwrap_or("8080")
            .parse::<u16>()
            .map_err(|_| {
                ConfigError::InvalidValue("PORT".to_string(), "must be a valid u16".to_string())
            })?;

        let hyperliquid_api_url = env_map
            .get("HYPERLIQUID_API_URL")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        if !hyperliquid_api_url.starts_with("http://") && !hyperliquid_api_url.starts_with("https://")
        {
            return Err(ConfigError::InvalidValue(
                "HYPERLIQUID_API_URL".to_string(),
                format!("must be an http(s) URL, got {}", hyperliquid_api_url),
            ));
        }

        let book_coins = parse_coin_list(env_map.get("BOOK_COINS").map(|s| s.as_str()));

        let poll_ms = env_map
            .get("BOOK_POLL_MS")
            .map(|s| s.as_str())
            .unwrap_or("1000")
            .parse::<u64>()
            .ok()
            .filter(|ms| *ms > 0)
            .ok_or_else(|| {
                ConfigError::InvalidValue(
                    "BOOK_POLL_MS".to_string(),
                    "must be a positive integer".to_string(),
                )
            })?;

        let book_precision = env_map
            .get("BOOK_PRECISION")
            .map(|s| s.as_str())
            .unwrap_or("0.000001")
            .parse::<Decimal>()
            .ok()
            .filter(|p| p.is_positive())
            .ok_or_else(|| {
                ConfigError::InvalidValue(
                    "BOOK_PRECISION".to_string(),
                    "must be a positive decimal".to_string(),
                )
            })?;

        Ok(Config {
            port,
            hyperliquid_api_url,
            book_coins,
            book_poll_interval: Duration::from_millis(poll_ms),
            book_precision,
        })
    }
}

/// Comma-separated coins in first-seen order, blanks and repeats dropped.
fn parse_coin_list(raw: Option<&str>) -> Vec<Coin> {
    let mut seen = HashSet::new();
    raw.unwrap_or("")
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty() && seen.insert(*s))
        .map(|s| Coin::new(s.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_env_map(HashMap::new()).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.hyperliquid_api_url, DEFAULT_API_URL);
        assert!(config.book_coins.is_empty());
        assert_eq!(config.book_poll_interval, Duration::from_millis(1000));
        assert_eq!(
            config.book_precision,
            Decimal::from_str_canonical("0.000001").unwrap()
        );
    }

    #[test]
    fn test_book_coins_parsed() {
        let config = Config::from_env_map(env(&[("BOOK_COINS", " BTC, ETH,,SOL ")])).unwrap();
        let names: Vec<_> = config.book_coins.iter().map(|c| c.as_str()).collect();
        assert_eq!(names, vec!["BTC", "ETH", "SOL"]);
    }

    #[test]
    fn test_book_coins_non_adjacent_duplicates_dropped() {
        let config = Config::from_env_map(env(&[("BOOK_COINS", "BTC,ETH,BTC, ETH ,SOL")])).unwrap();
        let names: Vec<_> = config.book_coins.iter().map(|c| c.as_str()).collect();
        assert_eq!(names, vec!["BTC", "ETH", "SOL"]);
    }

    #[test]
    fn test_invalid_port() {
        let result = Config::from_env_map(env(&[("PORT", "not_a_number")]));
        match result {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "PORT"),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_invalid_api_url() {
        let result = Config::from_env_map(env(&[("HYPERLIQUID_API_URL", "ftp://x")]));
        match result {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "HYPERLIQUID_API_URL"),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_zero_poll_interval_rejected() {
        let result = Config::from_env_map(env(&[("BOOK_POLL_MS", "0")]));
        match result {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "BOOK_POLL_MS"),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_invalid_precision() {
        for bad in ["0", "-1", "abc"] {
            let result = Config::from_env_map(env(&[("BOOK_PRECISION", bad)]));
            match result {
                Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "BOOK_PRECISION"),
                _ => panic!("Expected InvalidValue error for {}", bad),
            }
        }
    }
}
