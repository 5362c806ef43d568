//! Latest book snapshot per coin.

use crate::domain::{BookSnapshot, Coin};
use std::collections::HashMap;
use std::sync::RwLock;

/// Last-write-wins store of book snapshots, shared between the feed task and
/// request handlers.
#[derive(Debug, Default)]
pub struct BookStore {
    books: RwLock<HashMap<Coin, BookSnapshot>>,
}

impl BookStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `snapshot` unless a strictly newer one is already held for its coin.
    ///
    /// Returns whether the snapshot was stored.
    pub fn apply(&self, snapshot: BookSnapshot) -> bool {
        let mut books = self.books.write().unwrap_or_else(|e| e.into_inner());
        match books.get(&snapshot.instrument) {
            Some(current) if current.timestamp > snapshot.timestamp => false,
            _ => {
                books.insert(snapshot.instrument.clone(), snapshot);
                true
            }
        }
    }

    pub fn latest(&self, coin: &Coin) -> Option<BookSnapshot> {
        self.books
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(coin)
            .cloned()
    }

    /// Coins with a stored snapshot, sorted.
    pub fn coins(&self) -> Vec<Coin> {
        let mut coins: Vec<Coin> = self
            .books
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .cloned()
            .collect();
        coins.sort();
        coins
    }
}
