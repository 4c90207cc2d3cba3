//! Store Errors
//!
//! Error types for ledger store operations and the transaction executor.

use rust_decimal::Decimal;
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

use crate::domain::AmountError;

/// Result alias used throughout the store
pub type StoreResult<T> = Result<T, StoreError>;

/// Postgres SQLSTATE for serialization_failure
const SERIALIZATION_FAILURE: &str = "40001";
/// Postgres SQLSTATE for deadlock_detected
const DEADLOCK_DETECTED: &str = "40P01";

/// Point in the transaction lifecycle where the driver failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxStage {
    Begin,
    Commit,
    Rollback,
}

impl fmt::Display for TxStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TxStage::Begin => write!(f, "begin"),
            TxStage::Commit => write!(f, "commit"),
            TxStage::Rollback => write!(f, "rollback"),
        }
    }
}

/// Errors that can occur in the ledger store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Get/update/delete on a missing identity
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: Uuid },

    /// Rejected input (non-positive amount, missing field, bad page)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Debit would leave the source balance negative
    #[error("Insufficient funds in account {account_id}: required {required}, available {available}")]
    InsufficientFunds {
        account_id: Uuid,
        required: Decimal,
        available: Decimal,
    },

    /// Begin, commit or rollback failed.
    /// On a rollback failure `cause` holds the error that triggered the rollback.
    #[error("Transaction {stage} failed: {source}{}", describe_cause(.cause))]
    TransactionFailed {
        stage: TxStage,
        source: sqlx::Error,
        cause: Option<Box<StoreError>>,
    },

    /// Storage-level integrity failure (foreign key, check, unique)
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// The unit of work ran past its deadline and was rolled back
    #[error("Transaction deadline of {0:?} exceeded")]
    DeadlineExceeded(Duration),

    /// Any other driver error
    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

fn describe_cause(cause: &Option<Box<StoreError>>) -> String {
    match cause {
        Some(cause) => format!(" (after: {})", cause),
        None => String::new(),
    }
}

impl StoreError {
    pub fn not_found(entity: &'static str, id: Uuid) -> Self {
        Self::NotFound { entity, id }
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub(crate) fn transaction(stage: TxStage, source: sqlx::Error) -> Self {
        Self::TransactionFailed {
            stage,
            source,
            cause: None,
        }
    }

    /// Keep both the unit-of-work failure and the rollback failure
    pub(crate) fn rollback_failed(cause: StoreError, rollback: sqlx::Error) -> Self {
        Self::TransactionFailed {
            stage: TxStage::Rollback,
            source: rollback,
            cause: Some(Box::new(cause)),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }

    /// Serialization failures and deadlocks may succeed when the caller retries
    pub fn is_retryable(&self) -> bool {
        let db_error = match self {
            StoreError::Database(e) | StoreError::TransactionFailed { source: e, .. } => e,
            _ => return false,
        };
        match db_error {
            sqlx::Error::Database(db) => matches!(
                db.code().as_deref(),
                Some(SERIALIZATION_FAILURE) | Some(DEADLOCK_DETECTED)
            ),
            _ => false,
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db) = err {
            if db.is_foreign_key_violation() || db.is_unique_violation() || db.is_check_violation()
            {
                let detail = match db.constraint() {
                    Some(constraint) => format!("{} ({})", db.message(), constraint),
                    None => db.message().to_string(),
                };
                return StoreError::ConstraintViolation(detail);
            }
        }
        StoreError::Database(err)
    }
}

impl From<AmountError> for StoreError {
    fn from(err: AmountError) -> Self {
        StoreError::InvalidArgument(err.to_string())
    }
}
