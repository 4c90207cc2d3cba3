//! Domain module
//!
//! Core money types shared by the store and the API.

pub mod amount;
pub mod currency;

pub use amount::{Amount, AmountError};
pub use currency::{Currency, UnsupportedCurrency};
