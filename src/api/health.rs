use axum::extract::State;
use axum::Json;

use super::AppState;

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Readiness plus the book feed's connection state and cached coins.
pub async fn ready(State(state): State<AppState>) -> Json<serde_json::Value> {
    let feed = state
        .feed_state
        .as_ref()
        .map(|rx| serde_json::json!(*rx.borrow()))
        .unwrap_or(serde_json::Value::Null);
    let coins: Vec<String> = state
        .store
        .coins()
        .into_iter()
        .map(|c| c.as_str().to_string())
        .collect();

    Json(serde_json::json!({
        "status": "ready",
        "feed": feed,
        "books": coins,
    }))
}
