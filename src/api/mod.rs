pub mod book;
pub mod health;
pub mod trades;

use crate::config::Config;
use crate::datasource::DataSource;
use crate::feed::{BookStore, ConnectionState};
use axum::{routing::get, Router};
use std::sync::Arc;
use tokio::sync::watch;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub datasource: Arc<dyn DataSource>,
    pub store: Arc<BookStore>,
    /// Present when the background book feed runs.
    pub feed_state: Option<watch::Receiver<ConnectionState>>,
}

impl AppState {
    pub fn new(config: Config, datasource: Arc<dyn DataSource>, store: Arc<BookStore>) -> Self {
        Self {
            config,
            datasource,
            store,
            feed_state: None,
        }
    }

    pub fn with_feed_state(mut self, feed_state: watch::Receiver<ConnectionState>) -> Self {
        self.feed_state = Some(feed_state);
        self
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/v1/book", get(book::get_book))
        .route("/v1/trades", get(trades::get_trades))
        .layer(cors)
        .with_state(state)
}
