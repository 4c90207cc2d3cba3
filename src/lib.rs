//! simple_bank Library
//!
//! Re-exports modules for integration testing and external use.

pub mod api;
pub mod config;
pub mod db;
pub mod domain;
mod error;
pub mod store;
pub mod util;

pub use config::Config;
pub use domain::{Amount, AmountError, Currency};
pub use error::{AppError, ErrorResponse};
pub use store::{Store, StoreError, StoreResult};
