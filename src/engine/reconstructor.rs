//! Round-trip trade reconstruction from an account's fill history.
//!
//! Fills are grouped per coin, put into deterministic time order and replayed
//! through a [`PositionAccumulator`]. Every time the net position returns to flat
//! one [`CompletedTrade`] is emitted covering the whole cycle.

use std::collections::BTreeMap;

use rust_decimal::Decimal as RustDecimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::domain::ordering::sort_fill_refs_deterministic;
use crate::domain::{Coin, Decimal, Direction, Fill, TimeMs};
use crate::error::ValidationError;

/// Residual net size below which a position counts as flat.
pub fn flat_epsilon() -> Decimal {
    Decimal::new(RustDecimal::new(1, 4))
}

/// One flat-to-flat position cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedTrade {
    pub instrument: Coin,
    pub direction: Direction,
    pub open_time: TimeMs,
    pub close_time: TimeMs,
    pub duration_ms: i64,
    pub realized_pnl: Decimal,
    /// Number of fills in the cycle, opening and closing fill included.
    pub fill_count: usize,
}

/// Running position for one coin while replaying fills.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PositionAccumulator {
    /// Positive = long, negative = short.
    pub signed_size: Decimal,
    /// Set by the fill that moved the position off flat.
    pub open_time: Option<TimeMs>,
    /// Fixed by the first fill of the cycle.
    pub direction: Option<Direction>,
    pub accumulated_pnl: Decimal,
    pub fill_count: usize,
}

impl PositionAccumulator {
    pub fn is_flat(&self) -> bool {
        self.open_time.is_none()
    }

    /// Apply one fill. Returns the completed trade when the fill brings the
    /// position back to flat, after which the accumulator is reset.
    ///
    /// A sum that leaves the decimal range is an error and leaves the
    /// accumulator untouched.
    pub fn apply(&mut self, fill: &Fill) -> Result<Option<CompletedTrade>, ValidationError> {
        let overflow = |what: &str| {
            ValidationError::Overflow(format!("{} {} at fill {}", fill.coin, what, fill.fill_key()))
        };

        let old_size = self.signed_size;
        let new_size = old_size
            .checked_add(fill.signed_size())
            .ok_or_else(|| overflow("position size"))?;
        // The exchange only attributes PnL to size-reducing fills, so every
        // fill's contribution is simply added.
        let new_pnl = self
            .accumulated_pnl
            .checked_add(fill.closed_pnl)
            .ok_or_else(|| overflow("realized pnl"))?;

        let direction = *self
            .direction
            .get_or_insert_with(|| fill.side.opening_direction());
        self.signed_size = new_size;
        self.accumulated_pnl = new_pnl;
        self.fill_count += 1;

        if self.open_time.is_none() && !self.signed_size.is_zero() {
            self.open_time = Some(fill.time_ms);
        }

        let Some(open_time) = self.open_time else {
            return Ok(None);
        };

        if self.signed_size.abs() < flat_epsilon() {
            let duration_ms = fill
                .time_ms
                .as_i64()
                .checked_sub(open_time.as_i64())
                .ok_or_else(|| overflow("trade duration"))?;
            let trade = CompletedTrade {
                instrument: fill.coin.clone(),
                direction,
                open_time,
                close_time: fill.time_ms,
                duration_ms,
                realized_pnl: self.accumulated_pnl,
                fill_count: self.fill_count,
            };
            *self = PositionAccumulator::default();
            return Ok(Some(trade));
        }

        if old_size.is_positive() != self.signed_size.is_positive() && !old_size.is_zero() {
            debug!(
                "{} position flipped from {} to {} at {} without going flat; cycle stays {}",
                fill.coin,
                old_size,
                self.signed_size,
                fill.time_ms.as_i64(),
                direction
            );
        }

        Ok(None)
    }
}

/// Replays fills and collects completed trades across coins.
///
/// Fills for a coin must be fed in deterministic time order; [`reconstruct`]
/// takes care of that for arbitrary input.
#[derive(Debug, Default)]
pub struct TradeReconstructor {
    accumulators: BTreeMap<Coin, PositionAccumulator>,
    trades: Vec<CompletedTrade>,
}

impl TradeReconstructor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn process_fill(&mut self, fill: &Fill) -> Result<(), ValidationError> {
        let acc = self.accumulators.entry(fill.coin.clone()).or_default();
        trace!(
            "fill {} {} {} {} @ {} pnl={}",
            fill.fill_key(),
            fill.coin,
            fill.side,
            fill.sz,
            fill.time_ms.as_i64(),
            fill.closed_pnl
        );

        if let Some(trade) = acc.apply(fill)? {
            debug!(
                "completed {} {} trade open={} close={} pnl={}",
                trade.instrument,
                trade.direction,
                trade.open_time.as_i64(),
                trade.close_time.as_i64(),
                trade.realized_pnl
            );
            self.trades.push(trade);
        }
        Ok(())
    }

    /// Coins whose last cycle never returned to flat.
    pub fn open_positions(&self) -> impl Iterator<Item = (&Coin, &PositionAccumulator)> {
        self.accumulators.iter().filter(|(_, acc)| !acc.is_flat())
    }

    /// Completed trades, most recent open first.
    pub fn into_trades(self) -> Vec<CompletedTrade> {
        let mut trades = self.trades;
        sort_trades_most_recent_first(&mut trades);
        trades
    }
}

/// Reject fills that cannot take part in position accounting.
pub fn validate_fills(fills: &[Fill]) -> Result<(), ValidationError> {
    for fill in fills {
        if !fill.sz.is_positive() {
            return Err(ValidationError::NonPositiveSize {
                fill_key: fill.fill_key().to_string(),
                size: fill.sz.to_canonical_string(),
            });
        }
    }
    Ok(())
}

/// Order: open time descending, then instrument, then close time descending.
pub fn sort_trades_most_recent_first(trades: &mut [CompletedTrade]) {
    trades.sort_by(|a, b| {
        b.open_time
            .cmp(&a.open_time)
            .then_with(|| a.instrument.cmp(&b.instrument))
            .then_with(|| b.close_time.cmp(&a.close_time))
    });
}

/// Reconstruct completed round-trip trades from an unordered fill list.
///
/// Any invalid fill aborts the whole reconstruction. Open positions at the end
/// of the history produce no trade.
pub fn reconstruct(fills: &[Fill]) -> Result<Vec<CompletedTrade>, ValidationError> {
    validate_fills(fills)?;

    let mut by_coin: BTreeMap<&Coin, Vec<&Fill>> = BTreeMap::new();
    for fill in fills {
        by_coin.entry(&fill.coin).or_default().push(fill);
    }

    let mut reconstructor = TradeReconstructor::new();
    for (_, mut coin_fills) in by_coin {
        sort_fill_refs_deterministic(&mut coin_fills);
        for fill in coin_fills {
            reconstructor.process_fill(fill)?;
        }
    }

    for (coin, acc) in reconstructor.open_positions() {
        debug!(
            "{} still open with size {} since {:?}; not reported",
            coin,
            acc.signed_size,
            acc.open_time.map(|t| t.as_i64())
        );
    }

    Ok(reconstructor.into_trades())
}

/// Aggregate PnL over a set of completed trades.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeSummary {
    pub trade_count: usize,
    pub total_realized_pnl: Decimal,
    pub winning: usize,
    pub losing: usize,
}

pub fn summarize(trades: &[CompletedTrade]) -> Result<TradeSummary, ValidationError> {
    let total_realized_pnl = trades.iter().try_fold(Decimal::zero(), |acc, t| {
        acc.checked_add(t.realized_pnl)
            .ok_or_else(|| ValidationError::Overflow("total realized pnl".to_string()))
    })?;

    Ok(TradeSummary {
        trade_count: trades.len(),
        total_realized_pnl,
        winning: trades.iter().filter(|t| t.realized_pnl.is_positive()).count(),
        losing: trades.iter().filter(|t| t.realized_pnl.is_negative()).count(),
    })
}
