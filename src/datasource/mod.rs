//! Data source abstraction for fetching fills and book snapshots from the exchange.

use crate::domain::{Address, BookSnapshot, Coin, Fill};
use crate::error::ValidationError;
use async_trait::async_trait;
use std::fmt;

pub mod hyperliquid;
pub mod mock;

pub use hyperliquid::HyperliquidDataSource;
pub use mock::MockDataSource;

/// Read-only access to the exchange's account and market data.
///
/// Implementations handle retry/backoff themselves. Records that fail to parse
/// fail the whole call.
#[async_trait]
pub trait DataSource: Send + Sync + fmt::Debug {
    /// Fetch the fill history of one account, in no particular order.
    async fn fetch_fills(&self, user: &Address) -> Result<Vec<Fill>, DataSourceError>;

    /// Fetch the current visible book for a coin.
    async fn fetch_book(&self, coin: &Coin) -> Result<BookSnapshot, DataSourceError>;
}

/// Error type for data source operations.
#[derive(Debug, Clone)]
pub enum DataSourceError {
    /// Network error (e.g., connection timeout, DNS failure)
    NetworkError(String),
    /// HTTP error (e.g., 429 rate limit, 5xx server error)
    HttpError { status: u16, message: String },
    /// Response body was not the expected JSON shape
    ParseError(String),
    /// A record had the right shape but invalid values
    Validation(ValidationError),
    /// Rate limit exceeded
    RateLimited,
    /// Nothing available for the request (e.g., unknown coin)
    NotFound(String),
    /// The history could not be fetched without gaps
    Incomplete(String),
}

impl fmt::Display for DataSourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSourceError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            DataSourceError::HttpError { status, message } => {
                write!(f, "HTTP error {}: {}", status, message)
            }
            DataSourceError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            DataSourceError::Validation(err) => write!(f, "Invalid record: {}", err),
            DataSourceError::RateLimited => write!(f, "Rate limited"),
            DataSourceError::NotFound(msg) => write!(f, "Not found: {}", msg),
            DataSourceError::Incomplete(msg) => write!(f, "Incomplete history: {}", msg),
        }
    }
}

impl std::error::Error for DataSourceError {}

impl From<ValidationError> for DataSourceError {
    fn from(err: ValidationError) -> Self {
        DataSourceError::Validation(err)
    }
}
