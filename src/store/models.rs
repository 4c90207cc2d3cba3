//! Ledger rows and query parameters

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::Currency;

use super::{StoreError, StoreResult};

/// Largest page a list query will return
pub const MAX_PAGE_SIZE: i64 = 100;

/// A customer account with a stored running balance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Account {
    pub id: Uuid,
    pub owner: String,
    pub balance: Decimal,
    pub currency: String,
    pub created_at: DateTime<Utc>,
    pub country_code: Option<i32>,
}

/// One append-only ledger line. Positive amounts are credits, negative are debits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Entry {
    pub id: Uuid,
    pub account_id: Uuid,
    pub amount: Decimal,
    pub created_at: DateTime<Utc>,
}

/// The record of a committed money movement between two accounts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Transfer {
    pub id: Uuid,
    pub from_account_id: Uuid,
    pub to_account_id: Uuid,
    pub amount: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateAccountParams {
    pub owner: String,
    pub balance: Decimal,
    pub currency: Currency,
    pub country_code: Option<i32>,
}

impl CreateAccountParams {
    /// Account in `currency` with its matching country code
    pub fn new(owner: impl Into<String>, balance: Decimal, currency: Currency) -> Self {
        Self {
            owner: owner.into(),
            balance,
            currency,
            country_code: Some(currency.country_code()),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct UpdateAccountParams {
    pub id: Uuid,
    pub balance: Decimal,
}

#[derive(Debug, Clone, Copy)]
pub struct CreateEntryParams {
    pub account_id: Uuid,
    pub amount: Decimal,
}

#[derive(Debug, Clone, Copy)]
pub struct CreateTransferParams {
    pub from_account_id: Uuid,
    pub to_account_id: Uuid,
    pub amount: Decimal,
}

/// Offset pagination. Rows come back ordered by `(created_at, id)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Page {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    20
}

impl Page {
    pub fn new(limit: i64, offset: i64) -> Self {
        Self { limit, offset }
    }

    pub(crate) fn validate(&self) -> StoreResult<()> {
        if self.limit < 1 || self.limit > MAX_PAGE_SIZE {
            return Err(StoreError::invalid_argument(format!(
                "limit must be between 1 and {}, got {}",
                MAX_PAGE_SIZE, self.limit
            )));
        }
        if self.offset < 0 {
            return Err(StoreError::invalid_argument(format!(
                "offset must not be negative, got {}",
                self.offset
            )));
        }
        Ok(())
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(default_limit(), 0)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ListAccountsParams {
    /// Only accounts held by this owner
    pub owner: Option<String>,
    pub page: Page,
}

#[derive(Debug, Clone, Default)]
pub struct ListEntriesParams {
    /// Only entries posted to one of these accounts; empty means all
    pub account_ids: Vec<Uuid>,
    pub page: Page,
}

/// Transfers sent from `from_account_id` or received by `to_account_id`
#[derive(Debug, Clone, Copy)]
pub struct ListTransfersParams {
    pub from_account_id: Uuid,
    pub to_account_id: Uuid,
    pub page: Page,
}

impl ListTransfersParams {
    /// Every transfer touching `account_id`, in either direction
    pub fn touching(account_id: Uuid, page: Page) -> Self {
        Self {
            from_account_id: account_id,
            to_account_id: account_id,
            page,
        }
    }
}

/// Input to the transfer use case. `amount` is validated before any write.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TransferParams {
    pub from_account_id: Uuid,
    pub to_account_id: Uuid,
    pub amount: Decimal,
}

/// Everything a committed transfer wrote
#[derive(Debug, Clone, Serialize)]
pub struct TransferResult {
    pub transfer: Transfer,
    pub from_account: Account,
    pub to_account: Account,
    pub from_entry: Entry,
    pub to_entry: Entry,
}
