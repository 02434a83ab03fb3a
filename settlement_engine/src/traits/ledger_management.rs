use chrono::{DateTime, Utc};
use fgs_common::Pesewa;
use thiserror::Error;

use crate::{
    db_types::{EntryType, NewTransaction, Transaction, TransactionStatus},
    se_api::TransactionQueryFilter,
};

#[derive(Debug, Clone, Error)]
pub enum LedgerError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Cannot append transaction, since it already exists with txid {0}")]
    DuplicateTransaction(String),
    #[error("The requested transaction {0} does not exist")]
    UnknownTransaction(String),
    #[error("Illegal transaction status change. {0}")]
    IllegalTransactionTransition(String),
    #[error("Ledger amounts may not be negative, got {0}")]
    InvalidAmount(Pesewa),
}

impl From<sqlx::Error> for LedgerError {
    fn from(e: sqlx::Error) -> Self {
        LedgerError::DatabaseError(e.to_string())
    }
}

/// The `LedgerManagement` trait defines behaviour for the append-only transaction ledger, the
/// single source of truth for every monetary movement in the engine.
///
/// Entries are immutable once appended; only `status` and `completed_at` may change, and only
/// through [`LedgerManagement::finalize_transaction`]. No component may derive a balance except by
/// aggregating over the ledger.
#[allow(async_fn_in_trait)]
pub trait LedgerManagement {
    /// Appends a new entry to the ledger.
    ///
    /// The backend assigns the monotonic `id` and `created_at`; the caller supplies the `txid`
    /// idempotency key. A retried append with a `txid` that already exists fails with
    /// [`LedgerError::DuplicateTransaction`] and leaves exactly one stored row.
    async fn append_transaction(&self, entry: NewTransaction) -> Result<Transaction, LedgerError>;

    /// Transitions a `Pending` or `OnHold` entry to `Completed` or `Failed`, stamping
    /// `completed_at` with the caller-supplied instant (so provider-reported completion times are
    /// preserved).
    ///
    /// Fails with [`LedgerError::UnknownTransaction`] when the txid is absent, and with
    /// [`LedgerError::IllegalTransactionTransition`] when the entry is already terminal.
    async fn finalize_transaction(
        &self,
        txid: &str,
        status: TransactionStatus,
        completed_at: DateTime<Utc>,
    ) -> Result<Transaction, LedgerError>;

    /// Fetches a single entry by its txid.
    async fn fetch_transaction(&self, txid: &str) -> Result<Option<Transaction>, LedgerError>;

    /// Fetches entries matching the filter, ordered by `created_at`. Read-only.
    async fn search_transactions(&self, query: TransactionQueryFilter) -> Result<Vec<Transaction>, LedgerError>;

    /// Aggregate sum over all entries of the given type and status; the basis for revenue and
    /// commission reporting.
    async fn total_for_entry_type(&self, entry_type: EntryType, status: TransactionStatus) -> Result<Pesewa, LedgerError>;
}
