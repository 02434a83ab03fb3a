//! `SqliteDatabase` is a concrete implementation of a settlement engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the
//! [`crate::traits`] module. Every lifecycle flow runs inside a single database transaction, and
//! every status precondition lives in the WHERE clause of its UPDATE, so racing callers cannot
//! both move the same record.
use std::fmt::Debug;

use chrono::{DateTime, Utc};
use fgs_common::Pesewa;
use log::*;
use sqlx::SqlitePool;

use super::db::{db_url, disputes, ledger, new_pool, payouts};
use crate::{
    db_types::{
        Dispute,
        DisputeStatus,
        EntryType,
        NewDispute,
        NewPayout,
        NewTransaction,
        OrderId,
        PaymentMethod,
        Payout,
        PayoutStatus,
        Transaction,
        TransactionStatus,
    },
    se_api::{PayoutQueryFilter, TransactionQueryFilter},
    traits::{DisputeManagement, LedgerError, LedgerManagement, PayoutManagement, SettlementDatabase, SettlementError},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object against the URL in `FGS_DATABASE_URL` (or the default).
    pub async fn new(max_connections: u32) -> Result<Self, SettlementError> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, SettlementError> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl LedgerManagement for SqliteDatabase {
    async fn append_transaction(&self, entry: NewTransaction) -> Result<Transaction, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let tx = ledger::append(entry, &mut conn).await?;
        debug!("🗃️ Ledger entry [{}] appended with id {}", tx.txid, tx.id);
        Ok(tx)
    }

    async fn finalize_transaction(
        &self,
        txid: &str,
        status: TransactionStatus,
        completed_at: DateTime<Utc>,
    ) -> Result<Transaction, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let tx = ledger::finalize(txid, status, completed_at, &mut conn).await?;
        debug!("🗃️ Ledger entry [{txid}] is now {status}");
        Ok(tx)
    }

    async fn fetch_transaction(&self, txid: &str) -> Result<Option<Transaction>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        ledger::fetch(txid, &mut conn).await
    }

    async fn search_transactions(&self, query: TransactionQueryFilter) -> Result<Vec<Transaction>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        ledger::search(query, &mut conn).await
    }

    async fn total_for_entry_type(&self, entry_type: EntryType, status: TransactionStatus) -> Result<Pesewa, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        ledger::total_for_entry_type(entry_type, status, &mut conn).await
    }
}

impl PayoutManagement for SqliteDatabase {
    async fn fetch_payout(&self, payout_id: i64) -> Result<Option<Payout>, SettlementError> {
        let mut conn = self.pool.acquire().await?;
        payouts::fetch(payout_id, &mut conn).await
    }

    async fn fetch_payouts_for_farmer(&self, farmer_id: &str) -> Result<Vec<Payout>, SettlementError> {
        let mut conn = self.pool.acquire().await?;
        payouts::fetch_for_farmer(farmer_id, &mut conn).await
    }

    async fn search_payouts(&self, query: PayoutQueryFilter) -> Result<Vec<Payout>, SettlementError> {
        let mut conn = self.pool.acquire().await?;
        payouts::search(query, &mut conn).await
    }
}

impl DisputeManagement for SqliteDatabase {
    async fn fetch_dispute(&self, dispute_id: i64) -> Result<Option<Dispute>, SettlementError> {
        let mut conn = self.pool.acquire().await?;
        disputes::fetch(dispute_id, &mut conn).await
    }

    async fn fetch_disputes_for_order(&self, order_id: &OrderId) -> Result<Vec<Dispute>, SettlementError> {
        let mut conn = self.pool.acquire().await?;
        disputes::fetch_for_order(order_id, &mut conn).await
    }

    async fn fetch_disputes_for_farmer(&self, farmer_id: &str) -> Result<Vec<Dispute>, SettlementError> {
        let mut conn = self.pool.acquire().await?;
        disputes::fetch_for_farmer(farmer_id, &mut conn).await
    }

    async fn count_blocking_disputes(&self, farmer_id: &str) -> Result<i64, SettlementError> {
        let mut conn = self.pool.acquire().await?;
        disputes::count_blocking(farmer_id, &mut conn).await
    }
}

impl SettlementDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn insert_payout_request(&self, payout: NewPayout) -> Result<Payout, SettlementError> {
        let mut tx = self.pool.begin().await?;
        let net = payout.net_amount;
        let method = payout.payment_method;
        let payout = payouts::insert(payout, &mut tx).await?;
        let entry = NewTransaction::new(payout.txid.clone(), EntryType::Payout, net, method)
            .with_related_id(payout.id.to_string())
            .with_description(format!("Payout to {}", payout.farmer_name));
        ledger::append(entry, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Payout #{} for {} saved with pending ledger entry [{}]", payout.id, payout.farmer_name, payout.txid);
        Ok(payout)
    }

    async fn approve_payout(&self, payout_id: i64, approved_by: &str) -> Result<Payout, SettlementError> {
        let mut tx = self.pool.begin().await?;
        match payouts::mark_approved(payout_id, approved_by, Utc::now(), &mut tx).await? {
            Some(payout) => {
                tx.commit().await?;
                debug!("🗃️ Payout #{payout_id} approved by {approved_by}");
                Ok(payout)
            },
            None => match payouts::fetch(payout_id, &mut tx).await? {
                Some(p) => {
                    Err(SettlementError::IllegalPayoutTransition { id: payout_id, from: p.status, to: PayoutStatus::Approved })
                },
                None => Err(SettlementError::UnknownPayout(payout_id)),
            },
        }
    }

    async fn mark_payout_processing(&self, payout_id: i64) -> Result<Payout, SettlementError> {
        let mut tx = self.pool.begin().await?;
        let payout = payouts::fetch(payout_id, &mut tx).await?.ok_or(SettlementError::UnknownPayout(payout_id))?;
        if payout.status != PayoutStatus::Approved {
            return Err(SettlementError::IllegalPayoutTransition {
                id: payout_id,
                from: payout.status,
                to: PayoutStatus::Processing,
            });
        }
        let now = Utc::now();
        if now < payout.release_date {
            return Err(SettlementError::HoldingPeriodNotElapsed { id: payout_id, release_date: payout.release_date });
        }
        let open_disputes = disputes::count_blocking(&payout.farmer_id, &mut tx).await?;
        if open_disputes > 0 {
            return Err(SettlementError::DisputeBlocksPayout {
                id: payout_id,
                farmer_id: payout.farmer_id.clone(),
                open_disputes,
            });
        }
        let updated = payouts::mark_processing(payout_id, now, &mut tx).await?.ok_or(
            // A racing caller moved the payout between our fetch and the update.
            SettlementError::IllegalPayoutTransition { id: payout_id, from: payout.status, to: PayoutStatus::Processing },
        )?;
        tx.commit().await?;
        debug!("🗃️ Payout #{payout_id} is now processing. {} owed to {}", updated.net_amount, updated.farmer_name);
        Ok(updated)
    }

    async fn complete_payout(&self, payout_id: i64, commission_txid: &str) -> Result<Payout, SettlementError> {
        let mut tx = self.pool.begin().await?;
        let now = Utc::now();
        let payout = match payouts::mark_completed(payout_id, now, &mut tx).await? {
            Some(p) => p,
            None => {
                return match payouts::fetch(payout_id, &mut tx).await? {
                    Some(p) => Err(SettlementError::IllegalPayoutTransition {
                        id: payout_id,
                        from: p.status,
                        to: PayoutStatus::Completed,
                    }),
                    None => Err(SettlementError::UnknownPayout(payout_id)),
                };
            },
        };
        ledger::finalize(&payout.txid, TransactionStatus::Completed, now, &mut tx).await?;
        if payout.commission.value() > 0 {
            let entry = NewTransaction::new(commission_txid.to_string(), EntryType::Commission, payout.commission, PaymentMethod::Internal)
                .completed()
                .with_related_id(payout.id.to_string())
                .with_description(format!("Platform commission on payout #{}", payout.id));
            ledger::append(entry, &mut tx).await?;
        } else {
            trace!("🗃️ Payout #{payout_id} carried no commission. No commission entry appended");
        }
        tx.commit().await?;
        debug!("🗃️ Payout #{payout_id} completed. Ledger entry [{}] finalized", payout.txid);
        Ok(payout)
    }

    async fn fail_payout(&self, payout_id: i64, reason: &str) -> Result<Payout, SettlementError> {
        let mut tx = self.pool.begin().await?;
        let payout = match payouts::mark_failed(payout_id, reason, &mut tx).await? {
            Some(p) => p,
            None => {
                return match payouts::fetch(payout_id, &mut tx).await? {
                    Some(p) => Err(SettlementError::IllegalPayoutTransition {
                        id: payout_id,
                        from: p.status,
                        to: PayoutStatus::Failed,
                    }),
                    None => Err(SettlementError::UnknownPayout(payout_id)),
                };
            },
        };
        ledger::finalize(&payout.txid, TransactionStatus::Failed, Utc::now(), &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Payout #{payout_id} failed. Ledger entry [{}] finalized", payout.txid);
        Ok(payout)
    }

    async fn insert_dispute(&self, dispute: NewDispute) -> Result<Dispute, SettlementError> {
        let mut conn = self.pool.acquire().await?;
        let dispute = disputes::insert(dispute, &mut conn).await?;
        debug!("🗃️ Dispute #{} against order {} saved", dispute.id, dispute.order_id);
        Ok(dispute)
    }

    async fn begin_investigation(&self, dispute_id: i64) -> Result<Dispute, SettlementError> {
        let mut conn = self.pool.acquire().await?;
        match disputes::mark_investigating(dispute_id, &mut conn).await? {
            Some(dispute) => {
                debug!("🗃️ Dispute #{dispute_id} moved to investigation");
                Ok(dispute)
            },
            None => match disputes::fetch(dispute_id, &mut conn).await? {
                Some(d) => Err(SettlementError::IllegalDisputeTransition {
                    id: dispute_id,
                    from: d.status,
                    to: DisputeStatus::Investigating,
                }),
                None => Err(SettlementError::UnknownDispute(dispute_id)),
            },
        }
    }

    async fn resolve_dispute(
        &self,
        dispute_id: i64,
        resolution: &str,
        refund_txid: Option<&str>,
    ) -> Result<(Dispute, Option<Transaction>), SettlementError> {
        let mut tx = self.pool.begin().await?;
        let target = if refund_txid.is_some() { DisputeStatus::Refunded } else { DisputeStatus::Resolved };
        let now = Utc::now();
        let dispute = match disputes::mark_closed(dispute_id, target, resolution, now, &mut tx).await? {
            Some(d) => d,
            None => {
                return match disputes::fetch(dispute_id, &mut tx).await? {
                    Some(d) => {
                        Err(SettlementError::IllegalDisputeTransition { id: dispute_id, from: d.status, to: target })
                    },
                    None => Err(SettlementError::UnknownDispute(dispute_id)),
                };
            },
        };
        let refund = match refund_txid {
            Some(txid) => {
                let entry = NewTransaction::new(txid.to_string(), EntryType::Refund, dispute.amount, PaymentMethod::Internal)
                    .completed()
                    .with_related_id(dispute.order_id.as_str().to_string())
                    .with_description(format!("Refund for dispute #{} on order {}", dispute.id, dispute.order_id));
                Some(ledger::append(entry, &mut tx).await?)
            },
            None => None,
        };
        tx.commit().await?;
        debug!("🗃️ Dispute #{dispute_id} closed as {}", dispute.status);
        Ok((dispute, refund))
    }

    async fn close(&mut self) -> Result<(), SettlementError> {
        self.pool.close().await;
        Ok(())
    }
}
