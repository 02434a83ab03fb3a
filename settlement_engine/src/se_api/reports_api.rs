//! Unified read-only reporting over the ledger, payouts and disputes.

use std::fmt::Debug;

use fgs_common::Pesewa;
use log::trace;

use crate::{
    db_types::{Dispute, EntryType, OrderId, Payout, PayoutStatus, Transaction, TransactionStatus},
    se_api::{PayoutQueryFilter, TransactionQueryFilter},
    traits::{DisputeManagement, LedgerError, LedgerManagement, PayoutManagement, SettlementError},
};

/// The `ReportsApi` answers the reporting queries external dashboards depend on. Every figure is
/// derived from the ledger or from entity rows — nothing here is cached or derived twice.
pub struct ReportsApi<B> {
    db: B,
}

impl<B: Debug> Debug for ReportsApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ReportsApi ({:?})", self.db)
    }
}

impl<B> ReportsApi<B>
where B: LedgerManagement + PayoutManagement + DisputeManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// Gross order revenue: the sum of all completed `Deposit` entries.
    pub async fn total_revenue(&self) -> Result<Pesewa, LedgerError> {
        self.db.total_for_entry_type(EntryType::Deposit, TransactionStatus::Completed).await
    }

    /// Platform earnings: the sum of all completed `Commission` entries. Commission entries are
    /// appended only when a payout completes, so this counts completed payouts exactly.
    pub async fn total_commissions(&self) -> Result<Pesewa, LedgerError> {
        self.db.total_for_entry_type(EntryType::Commission, TransactionStatus::Completed).await
    }

    /// The sum of all completed `Refund` entries.
    pub async fn total_refunds(&self) -> Result<Pesewa, LedgerError> {
        self.db.total_for_entry_type(EntryType::Refund, TransactionStatus::Completed).await
    }

    /// Payouts that are still in flight: requested, approved or processing.
    pub async fn pending_payouts(&self) -> Result<Vec<Payout>, SettlementError> {
        let query = PayoutQueryFilter::default()
            .with_status(PayoutStatus::PendingApproval)
            .with_status(PayoutStatus::Approved)
            .with_status(PayoutStatus::Processing);
        self.db.search_payouts(query).await
    }

    /// Payouts that reached `Completed`.
    pub async fn completed_payouts(&self) -> Result<Vec<Payout>, SettlementError> {
        let query = PayoutQueryFilter::default().with_status(PayoutStatus::Completed);
        self.db.search_payouts(query).await
    }

    pub async fn payout_by_id(&self, payout_id: i64) -> Result<Option<Payout>, SettlementError> {
        self.db.fetch_payout(payout_id).await
    }

    pub async fn payouts_for_farmer(&self, farmer_id: &str) -> Result<Vec<Payout>, SettlementError> {
        self.db.fetch_payouts_for_farmer(farmer_id).await
    }

    pub async fn search_payouts(&self, query: PayoutQueryFilter) -> Result<Vec<Payout>, SettlementError> {
        trace!("🧾️ Payout search: {query}");
        self.db.search_payouts(query).await
    }

    pub async fn transaction_by_txid(&self, txid: &str) -> Result<Option<Transaction>, LedgerError> {
        self.db.fetch_transaction(txid).await
    }

    pub async fn search_transactions(&self, query: TransactionQueryFilter) -> Result<Vec<Transaction>, LedgerError> {
        trace!("🧾️ Ledger search: {query}");
        self.db.search_transactions(query).await
    }

    pub async fn dispute_by_id(&self, dispute_id: i64) -> Result<Option<Dispute>, SettlementError> {
        self.db.fetch_dispute(dispute_id).await
    }

    pub async fn disputes_for_order(&self, order_id: &OrderId) -> Result<Vec<Dispute>, SettlementError> {
        self.db.fetch_disputes_for_order(order_id).await
    }

    pub async fn disputes_for_farmer(&self, farmer_id: &str) -> Result<Vec<Dispute>, SettlementError> {
        self.db.fetch_disputes_for_farmer(farmer_id).await
    }

    /// The number of disputes currently blocking the given farmer's payouts.
    pub async fn blocking_disputes_for_farmer(&self, farmer_id: &str) -> Result<i64, SettlementError> {
        self.db.count_blocking_disputes(farmer_id).await
    }
}
