//! Amount type
//!
//! Domain primitive for transfer amounts.
//! Amounts are validated at construction time, so a transfer can never
//! be built from a zero, negative or over-precise value.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum allowed amount for a single transfer (1 trillion)
const MAX_AMOUNT: i64 = 1_000_000_000_000;

/// Maximum decimal places, matching the NUMERIC(19, 2) columns
pub const MAX_SCALE: u32 = 2;

/// Reject values with more than `MAX_SCALE` significant decimal places.
///
/// Trailing zeros ("5.000") are not extra precision.
pub fn check_scale(value: Decimal) -> Result<(), AmountError> {
    let scale = value.normalize().scale();
    if scale > MAX_SCALE {
        return Err(AmountError::TooManyDecimals(scale));
    }
    Ok(())
}

/// Amount represents a validated, strictly positive monetary value.
///
/// # Invariants
/// - Value is always positive (> 0)
/// - At most 2 decimal places
/// - At most 1 trillion
///
/// # Example
/// ```
/// use rust_decimal::Decimal;
/// use simple_bank::domain::Amount;
///
/// let amount = Amount::new(Decimal::new(1050, 2)).unwrap();
/// assert_eq!(amount.value(), Decimal::new(1050, 2));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Amount(Decimal);

/// Errors that can occur when creating an Amount
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    #[error("Amount must be positive (got {0})")]
    NotPositive(Decimal),

    #[error("Amount has too many decimal places (max {MAX_SCALE}, got {0})")]
    TooManyDecimals(u32),

    #[error("Amount exceeds maximum allowed value ({MAX_AMOUNT})")]
    Overflow,

    #[error("Invalid amount format: {0}")]
    ParseError(String),
}

impl Amount {
    /// Create a new Amount with validation.
    ///
    /// # Errors
    /// - `AmountError::NotPositive` if value <= 0
    /// - `AmountError::TooManyDecimals` if more than 2 decimal places
    /// - `AmountError::Overflow` if value > 1 trillion
    pub fn new(value: Decimal) -> Result<Self, AmountError> {
        if value <= Decimal::ZERO {
            return Err(AmountError::NotPositive(value));
        }

        check_scale(value)?;

        if value > Decimal::from(MAX_AMOUNT) {
            return Err(AmountError::Overflow);
        }

        Ok(Self(value))
    }

    /// Create an Amount from a whole number.
    pub fn from_integer(value: i64) -> Result<Self, AmountError> {
        Self::new(Decimal::from(value))
    }

    /// Get the underlying Decimal value.
    pub fn value(&self) -> Decimal {
        self.0
    }

    /// The signed delta applied to the debited account.
    pub fn debit(&self) -> Decimal {
        -self.0
    }

    /// The signed delta applied to the credited account.
    pub fn credit(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let decimal =
            Decimal::from_str(s.trim()).map_err(|e| AmountError::ParseError(e.to_string()))?;
        Amount::new(decimal)
    }
}

impl TryFrom<String> for Amount {
    type Error = AmountError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Amount::from_str(&value)
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = AmountError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Amount::new(value)
    }
}

impl From<Amount> for String {
    fn from(amount: Amount) -> Self {
        format!("{:.2}", amount.0)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}
