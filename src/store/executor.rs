//! Transaction Executor
//!
//! Runs a unit of work inside one database transaction: commit when it
//! succeeds, roll back when it fails or runs past its deadline.

use futures::future::BoxFuture;
use sqlx::pool::PoolConnection;
use sqlx::{PgConnection, PgPool, Postgres};
use std::time::Duration;

use super::{StoreError, StoreResult, TxStage};

/// Shared handle to the ledger database
#[derive(Debug, Clone)]
pub struct Store {
    pool: PgPool,
    tx_timeout: Option<Duration>,
}

impl Store {
    /// Create a Store with no transaction deadline
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            tx_timeout: None,
        }
    }

    /// Default deadline applied by `exec_tx` and `transfer`
    pub fn with_tx_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.tx_timeout = timeout;
        self
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn tx_timeout(&self) -> Option<Duration> {
        self.tx_timeout
    }

    /// Check out a connection for autocommit queries
    pub async fn acquire(&self) -> StoreResult<PoolConnection<Postgres>> {
        Ok(self.pool.acquire().await?)
    }

    /// Run `work` in a transaction bounded by the store's default deadline.
    ///
    /// The closure receives a connection bound to the transaction; every
    /// `Queries` call made through it commits or rolls back together.
    ///
    /// ```ignore
    /// let entry = store
    ///     .exec_tx(move |conn| Box::pin(async move { conn.create_entry(&params).await }))
    ///     .await?;
    /// ```
    pub async fn exec_tx<F, T>(&self, work: F) -> StoreResult<T>
    where
        F: for<'c> FnOnce(&'c mut PgConnection) -> BoxFuture<'c, StoreResult<T>> + Send,
        T: Send,
    {
        self.run_tx(self.tx_timeout, work).await
    }

    /// Run `work` in a transaction that must finish within `timeout`
    pub async fn exec_tx_within<F, T>(&self, timeout: Duration, work: F) -> StoreResult<T>
    where
        F: for<'c> FnOnce(&'c mut PgConnection) -> BoxFuture<'c, StoreResult<T>> + Send,
        T: Send,
    {
        self.run_tx(Some(timeout), work).await
    }

    async fn run_tx<F, T>(&self, timeout: Option<Duration>, work: F) -> StoreResult<T>
    where
        F: for<'c> FnOnce(&'c mut PgConnection) -> BoxFuture<'c, StoreResult<T>> + Send,
        T: Send,
    {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::transaction(TxStage::Begin, e))?;

        let outcome = match timeout {
            Some(limit) => match tokio::time::timeout(limit, work(&mut *tx)).await {
                Ok(outcome) => outcome,
                Err(_) => Err(StoreError::DeadlineExceeded(limit)),
            },
            None => work(&mut *tx).await,
        };

        match outcome {
            Ok(value) => {
                tx.commit()
                    .await
                    .map_err(|e| StoreError::transaction(TxStage::Commit, e))?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::error!(
                        error = %err,
                        rollback_error = %rollback_err,
                        "Transaction rollback failed"
                    );
                    return Err(StoreError::rollback_failed(err, rollback_err));
                }
                tracing::warn!(error = %err, "Transaction rolled back");
                Err(err)
            }
        }
    }
}
