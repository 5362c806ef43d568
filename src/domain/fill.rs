//! Fill type representing a single execution on the account.

use crate::domain::{Coin, Decimal, Side, TimeMs};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A single trade fill/execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fill {
    /// Stable unique identifier for this fill.
    pub fill_key: String,
    pub time_ms: TimeMs,
    pub coin: Coin,
    pub side: Side,
    pub px: Decimal,
    /// Unsigned size; the sign comes from `side`.
    pub sz: Decimal,
    pub fee: Decimal,
    /// Realized PnL the exchange attributed to this fill (0 if it reduced nothing).
    pub closed_pnl: Decimal,
    /// Trade ID.
    pub tid: Option<i64>,
    /// Order ID.
    pub oid: Option<i64>,
}

impl Fill {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        time_ms: TimeMs,
        coin: Coin,
        side: Side,
        px: Decimal,
        sz: Decimal,
        fee: Decimal,
        closed_pnl: Decimal,
        tid: Option<i64>,
        oid: Option<i64>,
    ) -> Self {
        let fill_key =
            Self::compute_fill_key(&coin, time_ms, side, &px, &sz, &closed_pnl, tid, oid);
        Fill {
            fill_key,
            time_ms,
            coin,
            side,
            px,
            sz,
            fee,
            closed_pnl,
            tid,
            oid,
        }
    }

    /// Generate a stable unique key for this fill.
    ///
    /// Priority: `tid` (if present) > hash of deterministic fields.
    #[allow(clippy::too_many_arguments)]
    pub fn compute_fill_key(
        coin: &Coin,
        time_ms: TimeMs,
        side: Side,
        px: &Decimal,
        sz: &Decimal,
        closed_pnl: &Decimal,
        tid: Option<i64>,
        oid: Option<i64>,
    ) -> String {
        if let Some(tid) = tid {
            return format!("tid:{}", tid);
        }

        let mut hasher = Sha256::new();
        hasher.update(coin.as_str());
        hasher.update(time_ms.as_i64().to_le_bytes());
        hasher.update(if side == Side::Buy { b"B" } else { b"S" });
        hasher.update(px.to_canonical_string());
        hasher.update(sz.to_canonical_string());
        hasher.update(closed_pnl.to_canonical_string());
        if let Some(oid) = oid {
            hasher.update(oid.to_le_bytes());
        }
        let hash = hasher.finalize();
        format!("hash:{}", hex::encode(&hash[..16]))
    }

    pub fn fill_key(&self) -> &str {
        &self.fill_key
    }

    /// Signed position change: `+sz` for Buy, `-sz` for Sell.
    pub fn signed_size(&self) -> Decimal {
        match self.side {
            Side::Buy => self.sz,
            Side::Sell => -self.sz,
        }
    }
}
