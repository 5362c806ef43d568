//! Cumulative-depth view of a book snapshot.

use tracing::trace;

use crate::domain::{BookSnapshot, BookView, Decimal, DepthRow, PriceLevel};
use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BookSide {
    Bid,
    Ask,
}

/// Build the display view of `snapshot` grouped on a `precision` price grid.
///
/// Levels are walked in provider order (best first) and never re-sorted.
/// Bid prices round down and ask prices round up onto the grid; neighbouring
/// levels landing on the same grid price are merged. Mid price and spread come
/// from the ungrouped best levels.
///
/// A precision so fine that a price no longer fits on its grid is rejected the
/// same way as a non-positive one.
pub fn materialize(
    snapshot: &BookSnapshot,
    precision: Decimal,
) -> Result<BookView, ValidationError> {
    if !precision.is_positive() {
        return Err(ValidationError::InvalidPrecision(
            precision.to_canonical_string(),
        ));
    }

    let bids = depth_rows(&snapshot.bids, precision, BookSide::Bid)?;
    let asks = depth_rows(&snapshot.asks, precision, BookSide::Ask)?;

    let (mid_price, spread) = match (snapshot.best_bid(), snapshot.best_ask()) {
        (Some(bid), Some(ask)) => {
            let mid = bid
                .price
                .checked_add(ask.price)
                .and_then(|sum| sum.checked_div(Decimal::two()))
                .ok_or_else(|| overflow(snapshot, "mid price"))?;
            let spread = ask
                .price
                .checked_sub(bid.price)
                .ok_or_else(|| overflow(snapshot, "spread"))?;
            (Some(mid), Some(spread))
        }
        _ => (None, None),
    };

    trace!(
        "materialized {} at {}: {} bid rows, {} ask rows, mid={:?}",
        snapshot.instrument,
        snapshot.timestamp.as_i64(),
        bids.len(),
        asks.len(),
        mid_price.map(|m| m.to_canonical_string())
    );

    Ok(BookView {
        instrument: snapshot.instrument.clone(),
        timestamp: snapshot.timestamp,
        bids,
        asks,
        mid_price,
        spread,
    })
}

fn overflow(snapshot: &BookSnapshot, what: &str) -> ValidationError {
    ValidationError::Overflow(format!("{} {}", snapshot.instrument, what))
}

fn depth_rows(
    levels: &[PriceLevel],
    precision: Decimal,
    side: BookSide,
) -> Result<Vec<DepthRow>, ValidationError> {
    let mut rows: Vec<DepthRow> = Vec::with_capacity(levels.len());
    let mut running = Decimal::zero();
    let depth_overflow = || ValidationError::Overflow(format!("{:?} depth", side));

    for level in levels {
        let price = match side {
            BookSide::Bid => level.price.floor_to_step(precision),
            BookSide::Ask => level.price.ceil_to_step(precision),
        }
        .ok_or_else(|| ValidationError::InvalidPrecision(precision.to_canonical_string()))?;
        running = running
            .checked_add(level.size)
            .ok_or_else(depth_overflow)?;

        match rows.last_mut().filter(|last| last.price == price) {
            Some(last) => {
                last.size = last
                    .size
                    .checked_add(level.size)
                    .ok_or_else(depth_overflow)?;
                last.cumulative_size = running;
            }
            None => rows.push(DepthRow {
                price,
                size: level.size,
                cumulative_size: running,
            }),
        }
    }

    Ok(rows)
}
