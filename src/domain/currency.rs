//! Currency codes
//!
//! The fixed set of currencies an account can be opened in, each paired
//! with the numeric country code stored alongside it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported account currencies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Currency {
    Usd,
    Inr,
    Eur,
    Gbp,
    Jpy,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unsupported currency: {0}")]
pub struct UnsupportedCurrency(pub String);

impl Currency {
    pub const ALL: [Currency; 5] = [
        Currency::Usd,
        Currency::Inr,
        Currency::Eur,
        Currency::Gbp,
        Currency::Jpy,
    ];

    /// ISO 4217 code as stored in `accounts.currency`
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Inr => "INR",
            Currency::Eur => "EUR",
            Currency::Gbp => "GBP",
            Currency::Jpy => "JPY",
        }
    }

    /// Numeric country code stored in `accounts.country_code`
    pub fn country_code(&self) -> i32 {
        match self {
            Currency::Usd => 0,
            Currency::Inr => 1,
            Currency::Eur => 2,
            Currency::Gbp => 3,
            Currency::Jpy => 4,
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = UnsupportedCurrency;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Currency::ALL
            .into_iter()
            .find(|c| c.code().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnsupportedCurrency(s.to_string()))
    }
}

impl TryFrom<String> for Currency {
    type Error = UnsupportedCurrency;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Currency> for String {
    fn from(currency: Currency) -> Self {
        currency.code().to_string()
    }
}
