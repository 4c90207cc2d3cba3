//! Transfer use case
//!
//! Moves money between two accounts as a single unit of work: one transfer
//! record, one debit entry, one credit entry and two balance updates.

use rust_decimal::Decimal;
use sqlx::PgConnection;
use std::time::Duration;
use uuid::Uuid;

use crate::domain::Amount;

use super::models::{CreateEntryParams, CreateTransferParams, TransferParams, TransferResult};
use super::{Queries, Store, StoreError, StoreResult};

impl Store {
    /// Transfer `params.amount` from one account to another.
    ///
    /// Either everything commits or nothing is visible. Calling this twice
    /// with the same arguments performs two independent transfers.
    ///
    /// # Errors
    /// - `InvalidArgument` for a non-positive or over-precise amount, or when
    ///   both accounts are the same
    /// - `NotFound` if either account does not exist
    /// - `InsufficientFunds` if the source balance is below the amount
    pub async fn transfer(&self, params: TransferParams) -> StoreResult<TransferResult> {
        let request = TransferRequest::validate(params)?;
        self.exec_tx(move |conn| Box::pin(transfer_tx(conn, request)))
            .await
            .inspect(log_committed)
    }

    /// Same as `transfer`, bounded by a caller-supplied deadline
    pub async fn transfer_within(
        &self,
        params: TransferParams,
        timeout: Duration,
    ) -> StoreResult<TransferResult> {
        let request = TransferRequest::validate(params)?;
        self.exec_tx_within(timeout, move |conn| Box::pin(transfer_tx(conn, request)))
            .await
            .inspect(log_committed)
    }
}

fn log_committed(result: &TransferResult) {
    tracing::info!(
        transfer_id = %result.transfer.id,
        from_account_id = %result.transfer.from_account_id,
        to_account_id = %result.transfer.to_account_id,
        amount = %result.transfer.amount,
        "Transfer committed"
    );
}

/// Transfer input that passed validation
#[derive(Debug, Clone, Copy)]
struct TransferRequest {
    from_account_id: Uuid,
    to_account_id: Uuid,
    amount: Amount,
}

impl TransferRequest {
    fn validate(params: TransferParams) -> StoreResult<Self> {
        let amount = Amount::new(params.amount)?;

        if params.from_account_id == params.to_account_id {
            return Err(StoreError::invalid_argument(
                "cannot transfer to the same account",
            ));
        }

        Ok(Self {
            from_account_id: params.from_account_id,
            to_account_id: params.to_account_id,
            amount,
        })
    }

    /// Both balance deltas, lowest account id first.
    ///
    /// Every transfer locks and updates rows in this order, so two transfers
    /// running in opposite directions between the same accounts cannot deadlock.
    fn ordered_deltas(&self) -> [(Uuid, Decimal); 2] {
        let debit = (self.from_account_id, self.amount.debit());
        let credit = (self.to_account_id, self.amount.credit());
        if self.from_account_id < self.to_account_id {
            [debit, credit]
        } else {
            [credit, debit]
        }
    }
}

async fn transfer_tx(
    conn: &mut PgConnection,
    request: TransferRequest,
) -> StoreResult<TransferResult> {
    let deltas = request.ordered_deltas();

    // Lock both rows before writing anything
    for (account_id, _) in deltas {
        let account = conn.get_account_for_update(account_id).await?;
        if account_id == request.from_account_id && account.balance < request.amount.value() {
            return Err(StoreError::InsufficientFunds {
                account_id,
                required: request.amount.value(),
                available: account.balance,
            });
        }
    }

    let transfer = conn
        .create_transfer(&CreateTransferParams {
            from_account_id: request.from_account_id,
            to_account_id: request.to_account_id,
            amount: request.amount.value(),
        })
        .await?;

    let from_entry = conn
        .create_entry(&CreateEntryParams {
            account_id: request.from_account_id,
            amount: request.amount.debit(),
        })
        .await?;

    let to_entry = conn
        .create_entry(&CreateEntryParams {
            account_id: request.to_account_id,
            amount: request.amount.credit(),
        })
        .await?;

    let [(first_id, first_delta), (second_id, second_delta)] = deltas;
    let first = conn.add_account_balance(first_id, first_delta).await?;
    let second = conn.add_account_balance(second_id, second_delta).await?;

    let (from_account, to_account) = if first.id == request.from_account_id {
        (first, second)
    } else {
        (second, first)
    };

    Ok(TransferResult {
        transfer,
        from_account,
        to_account,
        from_entry,
        to_entry,
    })
}
