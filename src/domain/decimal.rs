//! Lossless decimal numeric type backed by rust_decimal.
//!
//! Prices, sizes and PnL from the exchange arrive as decimal strings. They are
//! parsed once into [`Decimal`] and never touch binary floating point.

use rust_decimal::Decimal as RustDecimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lossless decimal numeric type for prices, sizes and PnL.
///
/// Serializes to a JSON number (not string).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Decimal(#[serde(with = "rust_decimal::serde::float")] RustDecimal);

impl Decimal {
    pub fn new(value: RustDecimal) -> Self {
        Decimal(value)
    }

    /// Parse a Decimal from a string losslessly.
    ///
    /// Accepts plain (`"29.45"`) and scientific (`"1e-4"`) notation.
    pub fn from_str_canonical(s: &str) -> Result<Self, rust_decimal::Error> {
        let trimmed = s.trim();
        RustDecimal::from_str(trimmed)
            .or_else(|_| RustDecimal::from_scientific(trimmed))
            .map(Decimal)
    }

    /// Format without exponent notation and without trailing zeros.
    pub fn to_canonical_string(&self) -> String {
        format!("{}", self.0.normalize())
    }

    pub fn inner(&self) -> RustDecimal {
        self.0
    }

    pub fn zero() -> Self {
        Decimal(RustDecimal::ZERO)
    }

    pub fn two() -> Self {
        Decimal(RustDecimal::TWO)
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Returns true if the value is > 0.
    pub fn is_positive(&self) -> bool {
        !self.is_zero() && self.0.is_sign_positive()
    }

    /// Returns true if the value is < 0.
    pub fn is_negative(&self) -> bool {
        !self.is_zero() && self.0.is_sign_negative()
    }

    pub fn abs(&self) -> Self {
        Decimal(self.0.abs())
    }

    pub fn checked_add(&self, rhs: Decimal) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Decimal)
    }

    pub fn checked_sub(&self, rhs: Decimal) -> Option<Self> {
        self.0.checked_sub(rhs.0).map(Decimal)
    }

    pub fn checked_div(&self, rhs: Decimal) -> Option<Self> {
        self.0.checked_div(rhs.0).map(Decimal)
    }

    /// Largest multiple of `step` that is <= self.
    ///
    /// `None` when `step` is zero or the quotient does not fit in 96 bits.
    pub fn floor_to_step(&self, step: Decimal) -> Option<Self> {
        let quotient = self.0.checked_div(step.0)?;
        quotient.floor().checked_mul(step.0).map(Decimal)
    }

    /// Smallest multiple of `step` that is >= self.
    pub fn ceil_to_step(&self, step: Decimal) -> Option<Self> {
        let quotient = self.0.checked_div(step.0)?;
        quotient.ceil().checked_mul(step.0).map(Decimal)
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_canonical_string())
    }
}

impl FromStr for Decimal {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_str_canonical(s)
    }
}

impl From<RustDecimal> for Decimal {
    fn from(value: RustDecimal) -> Self {
        Decimal(value)
    }
}

impl From<Decimal> for RustDecimal {
    fn from(value: Decimal) -> Self {
        value.0
    }
}

impl std::ops::Add for Decimal {
    type Output = Decimal;

    fn add(self, rhs: Decimal) -> Decimal {
        Decimal(self.0 + rhs.0)
    }
}

impl std::ops::Sub for Decimal {
    type Output = Decimal;

    fn sub(self, rhs: Decimal) -> Decimal {
        Decimal(self.0 - rhs.0)
    }
}

impl std::ops::Mul for Decimal {
    type Output = Decimal;

    fn mul(self, rhs: Decimal) -> Decimal {
        Decimal(self.0 * rhs.0)
    }
}

impl std::ops::Div for Decimal {
    type Output = Decimal;

    fn div(self, rhs: Decimal) -> Decimal {
        Decimal(self.0 / rhs.0)
    }
}

impl std::ops::Neg for Decimal {
    type Output = Decimal;

    fn neg(self) -> Decimal {
        Decimal(-self.0)
    }
}
