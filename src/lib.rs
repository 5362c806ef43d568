pub mod api;
pub mod config;
pub mod datasource;
pub mod domain;
pub mod engine;
pub mod error;
pub mod feed;

pub use config::Config;
pub use datasource::{DataSource, DataSourceError, HyperliquidDataSource, MockDataSource};
pub use domain::{
    Address, BookSnapshot, BookView, Coin, Decimal, DepthRow, Direction, Fill, PriceLevel, Side,
    TimeMs,
};
pub use engine::{materialize, reconstruct, CompletedTrade};
pub use error::{AppError, ParseError, ValidationError};
pub use feed::{BookFeed, BookStore, ConnectionState};
