//! Background task keeping the [`BookStore`] fresh.

use std::sync::Arc;
use std::time::Duration;

use backoff::backoff::Backoff;
use backoff::ExponentialBackoff;
use futures::future::join_all;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::{BookStore, ConnectionState, FeedEvent};
use crate::datasource::{DataSource, DataSourceError};
use crate::domain::Coin;

const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

/// Polls the exchange for the configured coins and applies every snapshot to
/// the shared store.
///
/// The feed owns retry: give it a data source that fails fast (for example a
/// [`crate::HyperliquidDataSource`] with a zero retry window) so failures show up
/// as `Reconnecting` right away.
pub struct BookFeed {
    datasource: Arc<dyn DataSource>,
    store: Arc<BookStore>,
    coins: Vec<Coin>,
    poll_interval: Duration,
    state: ConnectionState,
    state_tx: watch::Sender<ConnectionState>,
}

impl BookFeed {
    pub fn new(
        datasource: Arc<dyn DataSource>,
        store: Arc<BookStore>,
        coins: Vec<Coin>,
        poll_interval: Duration,
    ) -> Self {
        let (state_tx, _) = watch::channel(ConnectionState::default());
        Self {
            datasource,
            store,
            coins,
            poll_interval,
            state: ConnectionState::default(),
            state_tx,
        }
    }

    /// Observe connection state changes.
    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.state_tx.subscribe()
    }

    /// Fetch every coin once and apply the results.
    ///
    /// Successful snapshots are applied even when other coins fail; the first
    /// failure is returned. Returns the number of snapshots stored.
    pub async fn poll_once(&self) -> Result<usize, DataSourceError> {
        let results = join_all(self.coins.iter().map(|c| self.datasource.fetch_book(c))).await;

        let mut applied = 0;
        let mut first_error = None;
        for (coin, result) in self.coins.iter().zip(results) {
            match result {
                Ok(snapshot) => {
                    if self.store.apply(snapshot) {
                        applied += 1;
                    } else {
                        debug!("Discarded stale snapshot for {}", coin);
                    }
                }
                Err(e) => {
                    warn!("Failed to fetch book for {}: {}", coin, e);
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(applied),
        }
    }

    /// Run until `shutdown` turns true or its sender is dropped.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        let mut retry = ExponentialBackoff {
            initial_interval: self.poll_interval,
            max_interval: MAX_RETRY_DELAY,
            max_elapsed_time: None,
            ..Default::default()
        };

        self.advance(FeedEvent::Start);

        'feed: loop {
            // Shutdown interrupts an in-flight poll as well as the wait after it.
            let polled = loop {
                tokio::select! {
                    polled = self.poll_once() => break polled,
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break 'feed;
                        }
                    }
                }
            };

            let delay = match polled {
                Ok(_) => {
                    self.advance(FeedEvent::Fetched);
                    retry.reset();
                    self.poll_interval
                }
                Err(_) => {
                    self.advance(FeedEvent::Failed);
                    retry.next_backoff().unwrap_or(MAX_RETRY_DELAY)
                }
            };

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        self.advance(FeedEvent::Stop);
    }

    fn advance(&mut self, event: FeedEvent) {
        let next = self.state.transition(event);
        if next != self.state {
            info!("Book feed {:?} -> {:?}", self.state, next);
            self.state = next;
        }
        self.state_tx.send_replace(next);
    }
}
