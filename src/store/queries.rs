//! Ledger Queries
//!
//! Thin mapping from method calls to parameterized statements against the
//! `accounts`, `entries` and `transfers` tables. No business rules live here.
//!
//! `Queries` is implemented for `PgConnection`, so the same calls work on a
//! pooled connection (autocommit) and inside a transaction (`&mut *tx`).

use rust_decimal::Decimal;
use sqlx::PgConnection;
use uuid::Uuid;

use crate::domain::amount::check_scale;

use super::models::{
    Account, CreateAccountParams, CreateEntryParams, CreateTransferParams, Entry,
    ListAccountsParams, ListEntriesParams, ListTransfersParams, Transfer, UpdateAccountParams,
};
use super::{StoreError, StoreResult};

const ACCOUNT_COLUMNS: &str = "id, owner, balance, currency, created_at, country_code";
const ENTRY_COLUMNS: &str = "id, account_id, amount, created_at";
const TRANSFER_COLUMNS: &str = "id, from_account_id, to_account_id, amount, created_at";

/// Columns are NUMERIC(19,2); reject input Postgres would silently round
fn ensure_cents(field: &str, value: Decimal) -> StoreResult<()> {
    check_scale(value).map_err(|e| StoreError::invalid_argument(format!("{}: {}", field, e)))
}

/// CRUD capability set over the three ledger tables
#[allow(async_fn_in_trait)]
pub trait Queries {
    // Accounts
    async fn create_account(&mut self, params: &CreateAccountParams) -> StoreResult<Account>;
    async fn get_account(&mut self, id: Uuid) -> StoreResult<Account>;
    /// Read an account and hold a row lock on it until the transaction ends
    async fn get_account_for_update(&mut self, id: Uuid) -> StoreResult<Account>;
    async fn list_accounts(&mut self, params: &ListAccountsParams) -> StoreResult<Vec<Account>>;
    async fn update_account(&mut self, params: &UpdateAccountParams) -> StoreResult<Account>;
    /// Atomic `balance = balance + delta`
    async fn add_account_balance(&mut self, id: Uuid, delta: Decimal) -> StoreResult<Account>;
    async fn delete_account(&mut self, id: Uuid) -> StoreResult<()>;

    // Entries
    async fn create_entry(&mut self, params: &CreateEntryParams) -> StoreResult<Entry>;
    async fn get_entry(&mut self, id: Uuid) -> StoreResult<Entry>;
    async fn list_entries(&mut self, params: &ListEntriesParams) -> StoreResult<Vec<Entry>>;
    async fn delete_entry(&mut self, id: Uuid) -> StoreResult<()>;

    // Transfers
    async fn create_transfer(&mut self, params: &CreateTransferParams) -> StoreResult<Transfer>;
    async fn get_transfer(&mut self, id: Uuid) -> StoreResult<Transfer>;
    async fn list_transfers(&mut self, params: &ListTransfersParams) -> StoreResult<Vec<Transfer>>;
    async fn delete_transfer(&mut self, id: Uuid) -> StoreResult<()>;
}

impl Queries for PgConnection {
    // =========================================================================
    // Accounts
    // =========================================================================

    async fn create_account(&mut self, params: &CreateAccountParams) -> StoreResult<Account> {
        if params.owner.trim().is_empty() {
            return Err(StoreError::invalid_argument("owner is required"));
        }
        ensure_cents("balance", params.balance)?;

        let account = sqlx::query_as::<_, Account>(&format!(
            r#"
            INSERT INTO accounts (id, owner, balance, currency, country_code)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {ACCOUNT_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&params.owner)
        .bind(params.balance)
        .bind(params.currency.code())
        .bind(params.country_code)
        .fetch_one(&mut *self)
        .await?;

        tracing::debug!(account_id = %account.id, owner = %account.owner, "Account created");

        Ok(account)
    }

    async fn get_account(&mut self, id: Uuid) -> StoreResult<Account> {
        sqlx::query_as::<_, Account>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&mut *self)
        .await?
        .ok_or_else(|| StoreError::not_found("Account", id))
    }

    async fn get_account_for_update(&mut self, id: Uuid) -> StoreResult<Account> {
        // NO KEY UPDATE does not block the KEY SHARE locks taken by
        // foreign-key checks when other transfers insert entries for this account
        sqlx::query_as::<_, Account>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1 FOR NO KEY UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *self)
        .await?
        .ok_or_else(|| StoreError::not_found("Account", id))
    }

    async fn list_accounts(&mut self, params: &ListAccountsParams) -> StoreResult<Vec<Account>> {
        params.page.validate()?;

        let accounts = sqlx::query_as::<_, Account>(&format!(
            r#"
            SELECT {ACCOUNT_COLUMNS}
            FROM accounts
            WHERE ($1::text IS NULL OR owner = $1)
            ORDER BY created_at, id
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(params.owner.as_deref())
        .bind(params.page.limit)
        .bind(params.page.offset)
        .fetch_all(&mut *self)
        .await?;

        Ok(accounts)
    }

    async fn update_account(&mut self, params: &UpdateAccountParams) -> StoreResult<Account> {
        ensure_cents("balance", params.balance)?;

        sqlx::query_as::<_, Account>(&format!(
            "UPDATE accounts SET balance = $2 WHERE id = $1 RETURNING {ACCOUNT_COLUMNS}"
        ))
        .bind(params.id)
        .bind(params.balance)
        .fetch_optional(&mut *self)
        .await?
        .ok_or_else(|| StoreError::not_found("Account", params.id))
    }

    async fn add_account_balance(&mut self, id: Uuid, delta: Decimal) -> StoreResult<Account> {
        ensure_cents("delta", delta)?;

        sqlx::query_as::<_, Account>(&format!(
            "UPDATE accounts SET balance = balance + $2 WHERE id = $1 RETURNING {ACCOUNT_COLUMNS}"
        ))
        .bind(id)
        .bind(delta)
        .fetch_optional(&mut *self)
        .await?
        .ok_or_else(|| StoreError::not_found("Account", id))
    }

    async fn delete_account(&mut self, id: Uuid) -> StoreResult<()> {
        let rows_affected = sqlx::query("DELETE FROM accounts WHERE id = $1")
            .bind(id)
            .execute(&mut *self)
            .await?
            .rows_affected();

        if rows_affected == 0 {
            return Err(StoreError::not_found("Account", id));
        }
        Ok(())
    }

    // =========================================================================
    // Entries
    // =========================================================================

    async fn create_entry(&mut self, params: &CreateEntryParams) -> StoreResult<Entry> {
        ensure_cents("amount", params.amount)?;

        let entry = sqlx::query_as::<_, Entry>(&format!(
            r#"
            INSERT INTO entries (id, account_id, amount)
            VALUES ($1, $2, $3)
            RETURNING {ENTRY_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(params.account_id)
        .bind(params.amount)
        .fetch_one(&mut *self)
        .await?;

        Ok(entry)
    }

    async fn get_entry(&mut self, id: Uuid) -> StoreResult<Entry> {
        sqlx::query_as::<_, Entry>(&format!(
            "SELECT {ENTRY_COLUMNS} FROM entries WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&mut *self)
        .await?
        .ok_or_else(|| StoreError::not_found("Entry", id))
    }

    async fn list_entries(&mut self, params: &ListEntriesParams) -> StoreResult<Vec<Entry>> {
        params.page.validate()?;

        let entries = sqlx::query_as::<_, Entry>(&format!(
            r#"
            SELECT {ENTRY_COLUMNS}
            FROM entries
            WHERE cardinality($1::uuid[]) = 0 OR account_id = ANY($1)
            ORDER BY created_at, id
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(&params.account_ids)
        .bind(params.page.limit)
        .bind(params.page.offset)
        .fetch_all(&mut *self)
        .await?;

        Ok(entries)
    }

    async fn delete_entry(&mut self, id: Uuid) -> StoreResult<()> {
        let rows_affected = sqlx::query("DELETE FROM entries WHERE id = $1")
            .bind(id)
            .execute(&mut *self)
            .await?
            .rows_affected();

        if rows_affected == 0 {
            return Err(StoreError::not_found("Entry", id));
        }
        Ok(())
    }

    // =========================================================================
    // Transfers
    // =========================================================================

    async fn create_transfer(&mut self, params: &CreateTransferParams) -> StoreResult<Transfer> {
        ensure_cents("amount", params.amount)?;

        let transfer = sqlx::query_as::<_, Transfer>(&format!(
            r#"
            INSERT INTO transfers (id, from_account_id, to_account_id, amount)
            VALUES ($1, $2, $3, $4)
            RETURNING {TRANSFER_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(params.from_account_id)
        .bind(params.to_account_id)
        .bind(params.amount)
        .fetch_one(&mut *self)
        .await?;

        Ok(transfer)
    }

    async fn get_transfer(&mut self, id: Uuid) -> StoreResult<Transfer> {
        sqlx::query_as::<_, Transfer>(&format!(
            "SELECT {TRANSFER_COLUMNS} FROM transfers WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&mut *self)
        .await?
        .ok_or_else(|| StoreError::not_found("Transfer", id))
    }

    async fn list_transfers(&mut self, params: &ListTransfersParams) -> StoreResult<Vec<Transfer>> {
        params.page.validate()?;

        let transfers = sqlx::query_as::<_, Transfer>(&format!(
            r#"
            SELECT {TRANSFER_COLUMNS}
            FROM transfers
            WHERE from_account_id = $1 OR to_account_id = $2
            ORDER BY created_at, id
            LIMIT $3 OFFSET $4
            "#
        ))
        .bind(params.from_account_id)
        .bind(params.to_account_id)
        .bind(params.page.limit)
        .bind(params.page.offset)
        .fetch_all(&mut *self)
        .await?;

        Ok(transfers)
    }

    async fn delete_transfer(&mut self, id: Uuid) -> StoreResult<()> {
        let rows_affected = sqlx::query("DELETE FROM transfers WHERE id = $1")
            .bind(id)
            .execute(&mut *self)
            .await?
            .rows_affected();

        if rows_affected == 0 {
            return Err(StoreError::not_found("Transfer", id));
        }
        Ok(())
    }
}
