//! Wire shapes returned by the exchange Info API and their conversion into
//! domain types.
//!
//! Every numeric field arrives as a decimal string. Conversion is fail-fast:
//! the first malformed field aborts with a [`ValidationError`].

use crate::domain::{BookSnapshot, Coin, Decimal, Fill, PriceLevel, Side, TimeMs};
use crate::error::{ParseError, ValidationError};
use serde::{Deserialize, Serialize};

/// Parse a named decimal field.
pub fn parse_decimal(field: &str, input: &str) -> Result<Decimal, ParseError> {
    Decimal::from_str_canonical(input).map_err(|_| ParseError::new(field, input))
}

/// Exchange side codes: `B` (bid, buy) and `A` (ask, sell).
pub fn parse_side(code: &str) -> Result<Side, ValidationError> {
    match code {
        "B" | "b" | "buy" | "Buy" => Ok(Side::Buy),
        "A" | "a" | "sell" | "Sell" => Ok(Side::Sell),
        other => Err(ValidationError::UnknownSide(other.to_string())),
    }
}

/// One fill as returned by `{"type": "userFillsByTime"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawFill {
    pub coin: String,
    pub px: String,
    pub sz: String,
    pub side: String,
    pub time: i64,
    #[serde(default)]
    pub closed_pnl: Option<String>,
    #[serde(default)]
    pub fee: Option<String>,
    #[serde(default)]
    pub oid: Option<i64>,
    #[serde(default)]
    pub tid: Option<i64>,
}

impl RawFill {
    pub fn into_fill(self) -> Result<Fill, ValidationError> {
        let side = parse_side(&self.side)?;
        let px = parse_decimal("px", &self.px)?;
        let sz = parse_decimal("sz", &self.sz)?;
        let fee = match self.fee.as_deref() {
            Some(fee) => parse_decimal("fee", fee)?,
            None => Decimal::zero(),
        };
        let closed_pnl = match self.closed_pnl.as_deref() {
            Some(pnl) => parse_decimal("closedPnl", pnl)?,
            None => Decimal::zero(),
        };

        Ok(Fill::new(
            TimeMs::new(self.time),
            Coin::new(self.coin),
            side,
            px,
            sz,
            fee,
            closed_pnl,
            self.tid,
            self.oid,
        ))
    }
}

/// One price level in an `l2Book` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawLevel {
    pub px: String,
    pub sz: String,
    /// Number of resting orders at this level.
    #[serde(default)]
    pub n: Option<u32>,
}

impl RawLevel {
    /// Resting size must be strictly positive; empty levels are never sent.
    pub fn to_level(&self) -> Result<PriceLevel, ValidationError> {
        let price = parse_decimal("px", &self.px)?;
        let size = parse_decimal("sz", &self.sz)?;
        if !size.is_positive() {
            return Err(ValidationError::NonPositiveLevelSize {
                price: price.to_canonical_string(),
                size: size.to_canonical_string(),
            });
        }
        Ok(PriceLevel::new(price, size))
    }
}

/// Response of `{"type": "l2Book"}`: `levels[0]` are bids, `levels[1]` asks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawBook {
    pub coin: String,
    pub time: i64,
    pub levels: Vec<Vec<RawLevel>>,
}

impl RawBook {
    pub fn into_snapshot(self) -> Result<BookSnapshot, ValidationError> {
        let mut sides = self.levels.into_iter();
        let bids = sides
            .next()
            .ok_or_else(|| ValidationError::MissingField("levels[0]".to_string()))?;
        let asks = sides
            .next()
            .ok_or_else(|| ValidationError::MissingField("levels[1]".to_string()))?;

        Ok(BookSnapshot {
            instrument: Coin::new(self.coin),
            bids: bids
                .iter()
                .map(RawLevel::to_level)
                .collect::<Result<Vec<_>, _>>()?,
            asks: asks
                .iter()
                .map(RawLevel::to_level)
                .collect::<Result<Vec<_>, _>>()?,
            timestamp: TimeMs::new(self.time),
        })
    }
}
