//! Cart Pricing
//!
//! Pure price computation for a list of cart lines. All arithmetic runs on
//! [`rust_decimal::Decimal`]; amounts are only turned into strings when they
//! are serialized.

use std::{fmt, str::FromStr};

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use super::models::CartItem;

/// Orders strictly above this subtotal ship for free.
pub const FREE_SHIPPING_THRESHOLD: Decimal = Decimal::ONE_HUNDRED;

/// Shipping charged at or below the free-shipping threshold.
pub const FLAT_SHIPPING: Decimal = Decimal::TEN;

/// Flat 15% tax.
pub const TAX_RATE: Decimal = Decimal::from_parts(15, 0, 0, false, 2);

/// Largest unit price accepted anywhere in the system: 99999999.99, stored
/// as the 96-bit mantissa 9_999_999_999 (`2 * 2^32 + 1_410_065_407`) at scale 2.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(1_410_065_407, 2, 0, false, 2);

/// Rounds half-up to two decimal places and pins the scale to 2.
pub fn round2(value: Decimal) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded
}

/// Reasons a textual amount is rejected.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AmountError {
    #[error("Price must be a number")]
    NotANumber,
    #[error("Price must not be negative")]
    Negative,
    #[error("Price must have exactly two decimal places (e.g., 49.99)")]
    TooPrecise,
    #[error("Price exceeds the maximum of 99999999.99")]
    TooLarge,
}

/// A non-negative money amount with exactly two fractional digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(Decimal);

impl Amount {
    pub const ZERO: Amount = Amount(Decimal::from_parts(0, 0, 0, false, 2));

    /// Wraps an arbitrary decimal, rounding it to cents.
    pub fn from_decimal(value: Decimal) -> Self {
        Self(round2(value))
    }

    pub fn value(self) -> Decimal {
        self.0
    }
}

impl Default for Amount {
    fn default() -> Self {
        Self::ZERO
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    /// Accepts `"25"`, `"25.5"` and `"25.50"`; rejects more than two
    /// fractional digits rather than silently rounding user input.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let value = Decimal::from_str(raw.trim()).map_err(|_| AmountError::NotANumber)?;

        if value < Decimal::ZERO {
            return Err(AmountError::Negative);
        }
        if value.normalize().scale() > 2 {
            return Err(AmountError::TooPrecise);
        }
        if value > MAX_AMOUNT {
            return Err(AmountError::TooLarge);
        }

        Ok(Self(round2(value)))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawAmount {
    Text(String),
    Number(serde_json::Number),
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = match RawAmount::deserialize(deserializer)? {
            RawAmount::Text(text) => text,
            RawAmount::Number(number) => number.to_string(),
        };

        text.parse().map_err(serde::de::Error::custom)
    }
}

/// Derived price fields of a cart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartTotals {
    pub items_price: Amount,
    pub shipping_price: Amount,
    pub tax_price: Amount,
    pub total_price: Amount,
}

/// Computes the totals of `items` under the fixed store policy:
/// free shipping above 100, flat 10 otherwise, 15% tax on the subtotal.
///
/// An empty list has nothing to ship and prices to zero across the board.
pub fn compute_totals(items: &[CartItem]) -> CartTotals {
    if items.is_empty() {
        return CartTotals::default();
    }

    let items_price = round2(items.iter().map(CartItem::line_total).sum());
    let shipping_price = if items_price > FREE_SHIPPING_THRESHOLD {
        Decimal::ZERO
    } else {
        FLAT_SHIPPING
    };
    let tax_price = round2(TAX_RATE * items_price);
    let total_price = items_price + shipping_price + tax_price;

    CartTotals {
        items_price: Amount::from_decimal(items_price),
        shipping_price: Amount::from_decimal(shipping_price),
        tax_price: Amount::from_decimal(tax_price),
        total_price: Amount::from_decimal(total_price),
    }
}
