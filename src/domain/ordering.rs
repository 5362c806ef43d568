//! Stable fill ordering for deterministic processing.
//!
//! The exchange does not guarantee the order of fills sharing a millisecond, so
//! ties are broken by identifiers carried on the fill itself rather than by the
//! position in the input list.

use crate::domain::Fill;
use std::cmp::Ordering;

/// Ordering: time_ms -> tid -> oid -> fill_key
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct FillOrderingKey<'a> {
    pub time_ms: i64,
    pub tid: Option<i64>,
    pub oid: Option<i64>,
    pub fill_key: &'a str,
}

impl<'a> FillOrderingKey<'a> {
    pub fn from_fill(fill: &'a Fill) -> Self {
        FillOrderingKey {
            time_ms: fill.time_ms.as_i64(),
            tid: fill.tid,
            oid: fill.oid,
            fill_key: fill.fill_key(),
        }
    }
}

pub fn compare_fills(a: &Fill, b: &Fill) -> Ordering {
    FillOrderingKey::from_fill(a).cmp(&FillOrderingKey::from_fill(b))
}

/// Sort fills deterministically, independent of their incoming order.
pub fn sort_fills_deterministic(fills: &mut [Fill]) {
    fills.sort_by(compare_fills);
}

/// Same as [`sort_fills_deterministic`] for borrowed fills.
pub fn sort_fill_refs_deterministic(fills: &mut [&Fill]) {
    fills.sort_by(|a, b| compare_fills(a, b));
}
