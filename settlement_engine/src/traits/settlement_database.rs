use chrono::{DateTime, Utc};
use fgs_common::{CommissionError, Pesewa};
use thiserror::Error;

use crate::{
    db_types::{Dispute, DisputeStatus, NewDispute, NewPayout, Payout, PayoutStatus, Transaction},
    traits::{DisputeManagement, LedgerError, LedgerManagement, PayoutManagement, SettlementAction},
};

#[derive(Debug, Clone, Error)]
pub enum SettlementError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Amounts must be positive, got {0}")]
    InvalidAmount(Pesewa),
    #[error("{0}")]
    InvalidRate(#[from] CommissionError),
    #[error("The requested payout {0} does not exist")]
    UnknownPayout(i64),
    #[error("Illegal payout transition for payout {id}: {from} -> {to}")]
    IllegalPayoutTransition { id: i64, from: PayoutStatus, to: PayoutStatus },
    #[error("The requested dispute {0} does not exist")]
    UnknownDispute(i64),
    #[error("Illegal dispute transition for dispute {id}: {from} -> {to}")]
    IllegalDisputeTransition { id: i64, from: DisputeStatus, to: DisputeStatus },
    #[error("Payout {id} is in its holding period until {release_date}")]
    HoldingPeriodNotElapsed { id: i64, release_date: DateTime<Utc> },
    #[error("Payout {id} is blocked by {open_disputes} unresolved dispute(s) against farmer {farmer_id}")]
    DisputeBlocksPayout { id: i64, farmer_id: String, open_disputes: i64 },
    #[error("{0}")]
    LedgerError(#[from] LedgerError),
    #[error("Actor {actor} is not authorized to {action}")]
    Unauthorized { actor: String, action: SettlementAction },
}

impl From<sqlx::Error> for SettlementError {
    fn from(e: sqlx::Error) -> Self {
        SettlementError::DatabaseError(e.to_string())
    }
}

/// This trait defines the highest level of behaviour for backends supporting the settlement
/// engine: the atomic lifecycle flows of payouts and disputes.
///
/// Every method here executes as a single store transaction. Status preconditions are enforced
/// with compare-and-swap updates, so of two callers racing on the same record exactly one
/// succeeds and the other receives the matching `Illegal*Transition` error; no record is ever
/// left half-updated. Callers supply ledger txids — the payout and dispute machinery never
/// invents ledger identifiers of its own.
#[allow(async_fn_in_trait)]
pub trait SettlementDatabase: Clone + LedgerManagement + PayoutManagement + DisputeManagement {
    /// The URL of the database.
    fn url(&self) -> &str;

    /// Stores a fully computed payout request and appends its `Payout`-type ledger entry
    /// (`Pending`, for the net amount, carrying the payout's txid) in one transaction.
    ///
    /// Returns the stored payout in `PendingApproval` status.
    async fn insert_payout_request(&self, payout: NewPayout) -> Result<Payout, SettlementError>;

    /// `PendingApproval -> Approved`, stamping `approved_at` and `approved_by`.
    ///
    /// Approval may precede the release date; the holding-period gate applies at processing
    /// time, not here.
    async fn approve_payout(&self, payout_id: i64, approved_by: &str) -> Result<Payout, SettlementError>;

    /// `Approved -> Processing`, stamping `processed_at`.
    ///
    /// Three gates are checked inside the transaction:
    /// * the current status must be `Approved`;
    /// * `now >= release_date`, else [`SettlementError::HoldingPeriodNotElapsed`];
    /// * no `Open`/`Investigating` dispute may name the payout's farmer, else
    ///   [`SettlementError::DisputeBlocksPayout`].
    ///
    /// The ledger entry stays `Pending`: `Processing` is the visible in-flight marker while the
    /// disbursement call happens outside the store, and a crash mid-call is recovered by polling
    /// the provider and then calling [`Self::complete_payout`] or [`Self::fail_payout`].
    async fn mark_payout_processing(&self, payout_id: i64) -> Result<Payout, SettlementError>;

    /// `Processing -> Completed`, stamping `completed_at`, finalizing the payout's ledger entry
    /// as `Completed`, and appending a `Commission`-type `Completed` entry (under the supplied
    /// txid) for the commission amount. Commissions are earned on completed payouts only, so a
    /// payout that never completes contributes nothing to commission totals.
    async fn complete_payout(&self, payout_id: i64, commission_txid: &str) -> Result<Payout, SettlementError>;

    /// `Processing -> Failed` (provider failure) or `PendingApproval -> Failed` (rejection).
    ///
    /// The reason is recorded in the payout's notes and the ledger entry is finalized as
    /// `Failed`. The net amount becomes payable again through a future request; the engine never
    /// auto-retries.
    async fn fail_payout(&self, payout_id: i64, reason: &str) -> Result<Payout, SettlementError>;

    /// Stores a new dispute in `Open` status.
    async fn insert_dispute(&self, dispute: NewDispute) -> Result<Dispute, SettlementError>;

    /// `Open -> Investigating` only.
    async fn begin_investigation(&self, dispute_id: i64) -> Result<Dispute, SettlementError>;

    /// Closes a dispute from `Open` or `Investigating`, stamping `resolved_at` and the
    /// resolution text.
    ///
    /// With a `refund_txid`, the dispute ends `Refunded` and a `Refund`-type `Completed` ledger
    /// entry is appended in the same transaction, for exactly the disputed amount, with
    /// `related_id` set to the disputed order. Without one, the dispute ends `Resolved` and the
    /// ledger is untouched. Returns the closed dispute and the refund entry, if any.
    async fn resolve_dispute(
        &self,
        dispute_id: i64,
        resolution: &str,
        refund_txid: Option<&str>,
    ) -> Result<(Dispute, Option<Transaction>), SettlementError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), SettlementError> {
        Ok(())
    }
}
