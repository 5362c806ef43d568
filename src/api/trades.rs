use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::domain::Address;
use crate::engine::{reconstruct, summarize, CompletedTrade, TradeSummary};
use crate::error::AppError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradesQuery {
    pub user: String,
    pub coin: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TradesResponse {
    pub trades: Vec<TradeDto>,
    pub summary: SummaryDto,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeDto {
    pub coin: String,
    pub direction: String,
    pub open_time_ms: i64,
    pub close_time_ms: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub close_time: Option<String>,
    pub duration_ms: i64,
    pub realized_pnl: String,
    pub fill_count: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryDto {
    pub trade_count: usize,
    pub total_realized_pnl: String,
    pub winning: usize,
    pub losing: usize,
}

impl From<&CompletedTrade> for TradeDto {
    fn from(t: &CompletedTrade) -> Self {
        Self {
            coin: t.instrument.as_str().to_string(),
            direction: t.direction.to_string(),
            open_time_ms: t.open_time.as_i64(),
            close_time_ms: t.close_time.as_i64(),
            open_time: t.open_time.to_rfc3339(),
            close_time: t.close_time.to_rfc3339(),
            duration_ms: t.duration_ms,
            realized_pnl: t.realized_pnl.to_canonical_string(),
            fill_count: t.fill_count,
        }
    }
}

impl From<TradeSummary> for SummaryDto {
    fn from(s: TradeSummary) -> Self {
        Self {
            trade_count: s.trade_count,
            total_realized_pnl: s.total_realized_pnl.to_canonical_string(),
            winning: s.winning,
            losing: s.losing,
        }
    }
}

pub async fn get_trades(
    Query(params): Query<TradesQuery>,
    State(state): State<AppState>,
) -> Result<Json<TradesResponse>, AppError> {
    let user: Address = params
        .user
        .parse()
        .map_err(|_| AppError::BadRequest("Invalid user address".into()))?;

    let coin = params
        .coin
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());

    let fills = state.datasource.fetch_fills(&user).await?;

    // Reconstruct over the whole history; the coin filter only narrows the output.
    let mut trades = reconstruct(&fills)?;
    if let Some(coin) = coin {
        trades.retain(|t| t.instrument.as_str() == coin);
    }

    let summary = summarize(&trades)?.into();
    Ok(Json(TradesResponse {
        trades: trades.iter().map(TradeDto::from).collect(),
        summary,
    }))
}
