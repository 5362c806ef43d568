//! Order book snapshot and display types.

use crate::domain::{Coin, Decimal, TimeMs};
use serde::{Deserialize, Serialize};

/// One entry on one side of a book snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceLevel {
    pub price: Decimal,
    pub size: Decimal,
}

impl PriceLevel {
    pub fn new(price: Decimal, size: Decimal) -> Self {
        Self { price, size }
    }
}

/// Complete visible book for one instrument at one point in time.
///
/// Bids are ordered by descending price, asks by ascending price, as delivered
/// by the exchange. A snapshot replaces any earlier one for the same instrument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookSnapshot {
    pub instrument: Coin,
    pub bids: Vec<PriceLevel>,
    pub asks: Vec<PriceLevel>,
    pub timestamp: TimeMs,
}

impl BookSnapshot {
    pub fn best_bid(&self) -> Option<&PriceLevel> {
        self.bids.first()
    }

    pub fn best_ask(&self) -> Option<&PriceLevel> {
        self.asks.first()
    }
}

/// A price level annotated with the running size from the best price outward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepthRow {
    pub price: Decimal,
    pub size: Decimal,
    pub cumulative_size: Decimal,
}

/// Display-ready book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookView {
    pub instrument: Coin,
    pub timestamp: TimeMs,
    /// Best bid first.
    pub bids: Vec<DepthRow>,
    /// Best ask first.
    pub asks: Vec<DepthRow>,
    /// `None` when either side is empty.
    pub mid_price: Option<Decimal>,
    pub spread: Option<Decimal>,
}

impl BookView {
    /// Asks worst-first, for a ladder that stacks asks above bids.
    ///
    /// Only the presentation order changes; cumulative sizes still run from
    /// the best ask.
    pub fn asks_top_down(&self) -> impl Iterator<Item = &DepthRow> {
        self.asks.iter().rev()
    }
}
