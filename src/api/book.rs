use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::AppState;
use crate::domain::{BookView, Coin, Decimal, DepthRow};
use crate::engine::materialize;
use crate::error::AppError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookQuery {
    pub coin: String,
    pub precision: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookResponse {
    pub coin: String,
    pub time_ms: i64,
    pub precision: String,
    pub mid_price: Option<String>,
    pub spread: Option<String>,
    pub bids: Vec<DepthRowDto>,
    pub asks: Vec<DepthRowDto>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepthRowDto {
    pub px: String,
    pub sz: String,
    pub total: String,
}

impl From<&DepthRow> for DepthRowDto {
    fn from(row: &DepthRow) -> Self {
        Self {
            px: row.price.to_canonical_string(),
            sz: row.size.to_canonical_string(),
            total: row.cumulative_size.to_canonical_string(),
        }
    }
}

pub async fn get_book(
    Query(params): Query<BookQuery>,
    State(state): State<AppState>,
) -> Result<Json<BookResponse>, AppError> {
    let coin = params.coin.trim();
    if coin.is_empty() {
        return Err(AppError::BadRequest("coin is required".into()));
    }
    let coin = Coin::new(coin.to_string());

    let precision = match params.precision.as_deref() {
        Some(p) => Decimal::from_str_canonical(p)
            .map_err(|_| AppError::BadRequest("Invalid precision".into()))?,
        None => state.config.book_precision,
    };

    let snapshot = match state.store.latest(&coin) {
        Some(snapshot) => snapshot,
        None => {
            debug!("No cached book for {}, fetching", coin);
            let snapshot = state.datasource.fetch_book(&coin).await?;
            state.store.apply(snapshot.clone());
            snapshot
        }
    };

    let view = materialize(&snapshot, precision)?;
    Ok(Json(to_response(&view, precision)))
}

fn to_response(view: &BookView, precision: Decimal) -> BookResponse {
    BookResponse {
        coin: view.instrument.as_str().to_string(),
        time_ms: view.timestamp.as_i64(),
        precision: precision.to_canonical_string(),
        mid_price: view.mid_price.map(|p| p.to_canonical_string()),
        spread: view.spread.map(|s| s.to_canonical_string()),
        bids: view.bids.iter().map(DepthRowDto::from).collect(),
        asks: view.asks.iter().map(DepthRowDto::from).collect(),
    }
}
