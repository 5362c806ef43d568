//! Domain types for the order-book viewer and trade reconstructor.
//!
//! This module provides:
//! - Lossless numeric handling via Decimal wrapper
//! - Domain primitives: TimeMs, Address, Coin, Side, Direction
//! - Fill and book snapshot types
//! - Wire shapes from the exchange API and their fail-fast conversion
//! - Stable fill ordering key helper for deterministic processing

pub mod book;
pub mod decimal;
pub mod fill;
pub mod ordering;
pub mod primitives;
pub mod wire;

pub use book::{BookSnapshot, BookView, DepthRow, PriceLevel};
pub use decimal::Decimal;
pub use fill::Fill;
pub use ordering::FillOrderingKey;
pub use primitives::{Address, AddressParseError, Coin, Direction, Side, TimeMs};
pub use wire::{RawBook, RawFill, RawLevel};
