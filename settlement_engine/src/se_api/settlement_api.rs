use std::{fmt::Debug, sync::Arc};

use chrono::{Duration, Utc};
use fgs_common::{split_commission, CommissionRate, Pesewa};
use log::*;

use crate::{
    db_types::{Dispute, EntryType, NewDispute, NewPayout, NewTransaction, OrderId, PaymentMethod, Payout, Transaction},
    events::{DisputeResolvedEvent, EventProducers, PayoutCompletedEvent},
    helpers::new_txid,
    se_api::PayoutRequest,
    traits::{AllowAll, Authorizer, DisbursementInstruction, SettlementAction, SettlementDatabase, SettlementError},
};

/// `SettlementApi` is the settlement coordinator: the single façade external collaborators call
/// to drive payout and dispute lifecycles and to record ledger movements.
///
/// It owns nothing itself — all state lives behind the backend `B` — but it is the only place
/// ledger txids are minted, the only place commission splits are computed, and the boundary where
/// the [`Authorizer`] capability is consulted. Callers are expected to arrive already
/// authenticated; the default [`AllowAll`] authorizer trusts them outright.
pub struct SettlementApi<B> {
    db: B,
    producers: EventProducers,
    authorizer: Arc<dyn Authorizer>,
}

impl<B> Debug for SettlementApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SettlementApi")
    }
}

impl<B> SettlementApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers, authorizer: Arc::new(AllowAll) }
    }

    pub fn with_authorizer(mut self, authorizer: Arc<dyn Authorizer>) -> Self {
        self.authorizer = authorizer;
        self
    }
}

impl<B> SettlementApi<B>
where B: SettlementDatabase
{
    /// Submit a new payout request on behalf of a farmer.
    ///
    /// The commission split is computed here, once, from the supplied rate; later rate changes
    /// never touch this payout. The release date is `now + holding_period_days`. A `Payout`-type
    /// ledger entry for the net amount is appended as `Pending` in the same transaction that
    /// stores the payout.
    pub async fn request_payout(&self, request: PayoutRequest, rate: CommissionRate) -> Result<Payout, SettlementError> {
        if request.total_amount.value() <= 0 {
            return Err(SettlementError::InvalidAmount(request.total_amount));
        }
        let split = split_commission(request.total_amount, rate);
        let requested_at = Utc::now();
        let release_date = requested_at + Duration::days(i64::from(request.holding_period_days));
        let payout = NewPayout {
            txid: new_txid("payout", &request.farmer_id),
            farmer_id: request.farmer_id,
            farmer_name: request.farmer_name,
            email: request.email,
            total_amount: request.total_amount,
            commission: split.commission,
            net_amount: split.net,
            payment_method: request.payment_method,
            account_number: request.account_number,
            requested_at,
            holding_period_days: request.holding_period_days,
            release_date,
            notes: request.notes,
        };
        let payout = self.db.insert_payout_request(payout).await?;
        debug!(
            "💸️📦️ Payout #{} requested for {}: {} gross at {rate} = {} commission, {} net. Release on {}",
            payout.id, payout.farmer_name, payout.total_amount, payout.commission, payout.net_amount, payout.release_date
        );
        Ok(payout)
    }

    /// Approve a pending payout. Approval may happen before the release date; the holding-period
    /// gate only applies when processing starts.
    pub async fn approve_payout(&self, payout_id: i64, approved_by: &str) -> Result<Payout, SettlementError> {
        self.authorize(approved_by, SettlementAction::ApprovePayout, payout_id)?;
        let payout = self.db.approve_payout(payout_id, approved_by).await?;
        debug!("💸️✅️ Payout #{payout_id} approved by {approved_by}");
        Ok(payout)
    }

    /// Reject a payout that is still awaiting approval. A normal outcome, not a fault.
    pub async fn reject_payout(&self, payout_id: i64, rejected_by: &str, reason: &str) -> Result<Payout, SettlementError> {
        self.authorize(rejected_by, SettlementAction::ApprovePayout, payout_id)?;
        let payout = self.db.fail_payout(payout_id, reason).await?;
        info!("💸️🚫️ Payout #{payout_id} rejected by {rejected_by}: {reason}");
        Ok(payout)
    }

    /// Start disbursing an approved payout.
    ///
    /// Succeeds only when the holding period has elapsed and no open dispute names the payout's
    /// farmer. On success the payout is the visible `Processing` marker and the returned
    /// [`DisbursementInstruction`] should be forwarded to the disbursement provider — outside
    /// any lock, after this call returns. The provider outcome then drives
    /// [`Self::complete_payout`] or [`Self::fail_payout`].
    pub async fn process_payout(&self, payout_id: i64) -> Result<(Payout, DisbursementInstruction), SettlementError> {
        let payout = self.db.mark_payout_processing(payout_id).await?;
        let instruction = DisbursementInstruction::from(&payout);
        debug!(
            "💸️🏦️ Payout #{payout_id} handed to disbursement: {} to {} via {}",
            instruction.amount, instruction.account_number, instruction.payment_method
        );
        Ok((payout, instruction))
    }

    /// Record a successful disbursement.
    ///
    /// Finalizes the payout's ledger entry as `Completed` and appends the commission entry. The
    /// commission txid is deterministic per payout, so a redelivered provider confirmation
    /// cannot double-book the commission.
    pub async fn complete_payout(&self, payout_id: i64) -> Result<Payout, SettlementError> {
        let commission_txid = format!("commission-payout-{payout_id}");
        let payout = self.db.complete_payout(payout_id, &commission_txid).await?;
        debug!("💸️🎉️ Payout #{payout_id} completed. {} disbursed, {} commission earned", payout.net_amount, payout.commission);
        self.call_payout_completed_hook(&payout).await;
        Ok(payout)
    }

    /// Record a failed disbursement (or reject a pending payout).
    ///
    /// A normal terminal outcome: the ledger entry is finalized as `Failed` and the net amount
    /// becomes payable again through a future request. The engine never retries by itself.
    pub async fn fail_payout(&self, payout_id: i64, reason: &str) -> Result<Payout, SettlementError> {
        let payout = self.db.fail_payout(payout_id, reason).await?;
        info!("💸️❌️ Payout #{payout_id} failed: {reason}");
        Ok(payout)
    }

    /// File a buyer dispute against an order.
    ///
    /// While the dispute is `Open` or `Investigating`, payouts for the disputed farmer cannot
    /// enter `Processing`.
    pub async fn open_dispute(&self, dispute: NewDispute) -> Result<Dispute, SettlementError> {
        if dispute.amount.value() <= 0 {
            return Err(SettlementError::InvalidAmount(dispute.amount));
        }
        let dispute = self.db.insert_dispute(dispute).await?;
        debug!(
            "⚖️📦️ Dispute #{} opened by {} against order {} for {}",
            dispute.id, dispute.buyer_name, dispute.order_id, dispute.amount
        );
        Ok(dispute)
    }

    /// Move an open dispute into investigation.
    pub async fn begin_investigation(&self, dispute_id: i64) -> Result<Dispute, SettlementError> {
        let dispute = self.db.begin_investigation(dispute_id).await?;
        debug!("⚖️🔍️ Dispute #{dispute_id} is under investigation");
        Ok(dispute)
    }

    /// Close a dispute, from `Open` (fast-track) or `Investigating`.
    ///
    /// With `should_refund`, the dispute ends `Refunded` and a `Refund`-type `Completed` ledger
    /// entry is appended for exactly the disputed amount, related to the disputed order. The
    /// already-earned commission is not clawed back. Without it, the dispute ends `Resolved` and
    /// no money moves — also a normal outcome, not a fault.
    pub async fn resolve_dispute(
        &self,
        dispute_id: i64,
        resolved_by: &str,
        resolution: &str,
        should_refund: bool,
    ) -> Result<(Dispute, Option<Transaction>), SettlementError> {
        self.authorize(resolved_by, SettlementAction::ResolveDispute, dispute_id)?;
        let refund_txid = should_refund.then(|| format!("refund-dispute-{dispute_id}"));
        let (dispute, refund) = self.db.resolve_dispute(dispute_id, resolution, refund_txid.as_deref()).await?;
        match &refund {
            Some(tx) => info!("⚖️💰️ Dispute #{dispute_id} refunded: {} returned to {}", tx.amount, dispute.buyer_name),
            None => info!("⚖️✔️ Dispute #{dispute_id} resolved without refund: {resolution}"),
        }
        self.call_dispute_resolved_hook(&dispute, refund.clone()).await;
        Ok((dispute, refund))
    }

    /// Record gross order revenue received from a buyer as a completed `Deposit` entry.
    pub async fn record_order_payment(
        &self,
        order_id: &OrderId,
        buyer_id: &str,
        amount: Pesewa,
        payment_method: PaymentMethod,
    ) -> Result<Transaction, SettlementError> {
        if amount.value() <= 0 {
            return Err(SettlementError::InvalidAmount(amount));
        }
        let entry = NewTransaction::new(new_txid("deposit", buyer_id), EntryType::Deposit, amount, payment_method)
            .completed()
            .with_related_id(order_id.as_str().to_string())
            .with_description(format!("Order payment for {order_id}"));
        let tx = self.db.append_transaction(entry).await?;
        debug!("🧾️💰️ Recorded {} order revenue for {order_id}", tx.amount);
        Ok(tx)
    }

    /// Record funds leaving a buyer's wallet as a completed `Withdrawal` entry.
    pub async fn record_withdrawal(
        &self,
        actor_id: &str,
        amount: Pesewa,
        payment_method: PaymentMethod,
        description: &str,
    ) -> Result<Transaction, SettlementError> {
        if amount.value() <= 0 {
            return Err(SettlementError::InvalidAmount(amount));
        }
        let entry = NewTransaction::new(new_txid("withdrawal", actor_id), EntryType::Withdrawal, amount, payment_method)
            .completed()
            .with_description(description.to_string());
        let tx = self.db.append_transaction(entry).await?;
        debug!("🧾️🏧️ Recorded {} withdrawal for {actor_id}", tx.amount);
        Ok(tx)
    }

    fn authorize(&self, actor_id: &str, action: SettlementAction, resource_id: i64) -> Result<(), SettlementError> {
        if self.authorizer.authorize(actor_id, action, Some(&resource_id.to_string())) {
            Ok(())
        } else {
            warn!("🔐️ {actor_id} was refused permission to {action} on #{resource_id}");
            Err(SettlementError::Unauthorized { actor: actor_id.to_string(), action })
        }
    }

    async fn call_payout_completed_hook(&self, payout: &Payout) {
        for emitter in &self.producers.payout_completed_producer {
            debug!("💸️📬️ Notifying payout completed hook subscribers");
            let event = PayoutCompletedEvent::new(payout.clone());
            emitter.publish_event(event).await;
        }
    }

    async fn call_dispute_resolved_hook(&self, dispute: &Dispute, refund: Option<Transaction>) {
        for emitter in &self.producers.dispute_resolved_producer {
            debug!("⚖️📬️ Notifying dispute resolved hook subscribers");
            let event = DisputeResolvedEvent::new(dispute.clone(), refund.clone());
            emitter.publish_event(event).await;
        }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn db_mut(&mut self) -> &mut B {
        &mut self.db
    }
}
