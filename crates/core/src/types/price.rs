//! Type-safe price representation using decimal arithmetic.
//!
//! The backend sends prices either as JSON numbers or as numeric strings.
//! Both are accepted and normalized to two fraction digits for display.

use core::fmt;
use core::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Number of fraction digits prices are displayed with.
const DISPLAY_SCALE: u32 = 2;

/// Errors that can occur when parsing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The input is not a decimal number.
    #[error("invalid price: {0}")]
    Invalid(String),
}

/// A product price, always held with exactly two fraction digits.
///
/// ## Examples
///
/// ```
/// use savvy_core::Price;
///
/// assert_eq!(Price::parse("19.9").unwrap().to_string(), "19.90");
/// assert_eq!(Price::parse("5").unwrap().to_string(), "5.00");
/// assert_eq!(Price::parse("2.345").unwrap().to_string(), "2.35");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// Create a price, rounding half away from zero to two fraction digits.
    #[must_use]
    pub fn new(amount: Decimal) -> Self {
        let mut amount =
            amount.round_dp_with_strategy(DISPLAY_SCALE, RoundingStrategy::MidpointAwayFromZero);
        amount.rescale(DISPLAY_SCALE);
        Self(amount)
    }

    /// Parse a price from its textual form.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not a decimal number.
    pub fn parse(s: &str) -> Result<Self, PriceError> {
        Decimal::from_str(s.trim())
            .map(Self::new)
            .map_err(|_| PriceError::Invalid(s.to_owned()))
    }

    /// The normalized amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Price {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Wire form of a price: a JSON number or a numeric string.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawPrice {
    Number(serde_json::Number),
    Text(String),
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let text = match RawPrice::deserialize(deserializer)? {
            RawPrice::Number(n) => n.to_string(),
            RawPrice::Text(s) => s,
        };
        Self::parse(&text).map_err(serde::de::Error::custom)
    }
}
