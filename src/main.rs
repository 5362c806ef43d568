use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tradelens::{api, BookFeed, BookStore, Config, DataSource, HyperliquidDataSource};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    let config = Config::from_env().context("Configuration error")?;
    let port = config.port;

    let datasource: Arc<dyn DataSource> =
        Arc::new(HyperliquidDataSource::new(config.hyperliquid_api_url.clone()));
    let store = Arc::new(BookStore::new());
    let mut state = api::AppState::new(config.clone(), datasource, store.clone());

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let feed_task = if config.book_coins.is_empty() {
        None
    } else {
        // The feed runs its own backoff, so its requests do not retry internally.
        let feed_source: Arc<dyn DataSource> = Arc::new(
            HyperliquidDataSource::new(config.hyperliquid_api_url.clone())
                .with_retry_window(Duration::ZERO),
        );
        let feed = BookFeed::new(
            feed_source,
            store,
            config.book_coins.clone(),
            config.book_poll_interval,
        );
        state = state.with_feed_state(feed.subscribe_state());
        tracing::info!("Starting book feed for {} coin(s)", config.book_coins.len());
        Some(tokio::spawn(feed.run(shutdown_rx)))
    };

    let app = api::create_router(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("Server error")?;

    let _ = shutdown_tx.send(true);
    if let Some(task) = feed_task {
        let _ = task.await;
    }

    Ok(())
}
