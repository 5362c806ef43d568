//! Mock data source for testing without network calls.

use super::{DataSource, DataSourceError};
use crate::domain::{Address, BookSnapshot, Coin, Fill};
use async_trait::async_trait;
use std::collections::HashMap;

/// Mock data source that returns predefined test data.
#[derive(Debug, Clone, Default)]
pub struct MockDataSource {
    fills: HashMap<Address, Vec<Fill>>,
    books: HashMap<Coin, BookSnapshot>,
    failure: Option<DataSourceError>,
    stalled: bool,
}

impl MockDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add fills for a user.
    pub fn with_fills(mut self, user: Address, fills: Vec<Fill>) -> Self {
        self.fills.entry(user).or_default().extend(fills);
        self
    }

    /// Set the book returned for the snapshot's instrument.
    pub fn with_book(mut self, book: BookSnapshot) -> Self {
        self.books.insert(book.instrument.clone(), book);
        self
    }

    /// Make every call fail with `err`.
    pub fn failing(mut self, err: DataSourceError) -> Self {
        self.failure = Some(err);
        self
    }

    /// Make every call hang forever, like an upstream that never answers.
    pub fn stalled(mut self) -> Self {
        self.stalled = true;
        self
    }

    async fn check(&self) -> Result<(), DataSourceError> {
        if self.stalled {
            std::future::pending::<()>().await;
        }
        match &self.failure {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl DataSource for MockDataSource {
    async fn fetch_fills(&self, user: &Address) -> Result<Vec<Fill>, DataSourceError> {
        self.check().await?;
        Ok(self.fills.get(user).cloned().unwrap_or_default())
    }

    async fn fetch_book(&self, coin: &Coin) -> Result<BookSnapshot, DataSourceError> {
        self.check().await?;
        self.books
            .get(coin)
            .cloned()
            .ok_or_else(|| DataSourceError::NotFound(format!("No book for {}", coin)))
    }
}
