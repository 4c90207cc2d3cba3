//! Ledger Store module
//!
//! Persistence for accounts, entries and transfers, the transaction
//! executor, and the transfer use case built on top of them.

mod error;
mod executor;
pub mod models;
mod queries;
mod transfer;

pub use error::{StoreError, StoreResult, TxStage};
pub use executor::Store;
pub use models::{
    Account, CreateAccountParams, CreateEntryParams, CreateTransferParams, Entry,
    ListAccountsParams, ListEntriesParams, ListTransfersParams, Page, Transfer, TransferParams,
    TransferResult, UpdateAccountParams,
};
pub use queries::Queries;
