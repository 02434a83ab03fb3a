//! Data types stored by the settlement engine backends.
//!
//! These are deliberately plain records. Lifecycle rules live in the backend transition methods
//! (see [`crate::traits::SettlementDatabase`]); the pure legality checks on the status enums here
//! are the single place the transition tables are written down.

use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

pub use fgs_common::Pesewa;

#[derive(Debug, Clone, Error)]
#[error("Invalid value: {0}")]
pub struct ConversionError(String);

//--------------------------------------       OrderId       ---------------------------------------------------------
/// A lightweight wrapper around the order identifier assigned by the marketplace's order system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(transparent)]
pub struct OrderId(pub String);

impl FromStr for OrderId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl OrderId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------      EntryType      ---------------------------------------------------------
/// The kind of monetary movement a ledger entry records. Direction is implied by the type; the
/// `amount` column is always non-negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum EntryType {
    /// Gross order revenue received from a buyer.
    Deposit,
    /// Funds leaving a buyer's wallet.
    Withdrawal,
    /// Money returned to a buyer after an upheld dispute.
    Refund,
    /// Net amount owed or paid to a farmer.
    Payout,
    /// The platform's cut of a completed payout.
    Commission,
}

impl Display for EntryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntryType::Deposit => write!(f, "Deposit"),
            EntryType::Withdrawal => write!(f, "Withdrawal"),
            EntryType::Refund => write!(f, "Refund"),
            EntryType::Payout => write!(f, "Payout"),
            EntryType::Commission => write!(f, "Commission"),
        }
    }
}

impl FromStr for EntryType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Deposit" => Ok(Self::Deposit),
            "Withdrawal" => Ok(Self::Withdrawal),
            "Refund" => Ok(Self::Refund),
            "Payout" => Ok(Self::Payout),
            "Commission" => Ok(Self::Commission),
            s => Err(ConversionError(format!("Invalid entry type: {s}"))),
        }
    }
}

//--------------------------------------  TransactionStatus  ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum TransactionStatus {
    /// Appended, awaiting the outcome of the movement it records.
    Pending,
    /// The movement settled. Terminal.
    Completed,
    /// The movement did not happen. Terminal.
    Failed,
    /// Deliberately parked, e.g. pending a manual review.
    OnHold,
}

impl TransactionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransactionStatus::Completed | TransactionStatus::Failed)
    }

    /// Whether an entry with this status may be finalized to `next`. Only `Pending` and `OnHold`
    /// entries may finalize, and only to a terminal status.
    pub fn can_finalize_to(&self, next: TransactionStatus) -> bool {
        !self.is_terminal() && next.is_terminal()
    }
}

impl Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionStatus::Pending => write!(f, "Pending"),
            TransactionStatus::Completed => write!(f, "Completed"),
            TransactionStatus::Failed => write!(f, "Failed"),
            TransactionStatus::OnHold => write!(f, "OnHold"),
        }
    }
}

impl FromStr for TransactionStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Completed" => Ok(Self::Completed),
            "Failed" => Ok(Self::Failed),
            "OnHold" => Ok(Self::OnHold),
            s => Err(ConversionError(format!("Invalid transaction status: {s}"))),
        }
    }
}

//--------------------------------------   PaymentMethod     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum PaymentMethod {
    MobileMoney,
    BankTransfer,
    /// Platform-side book entry (commissions, refunds); no external rail involved.
    Internal,
}

impl Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentMethod::MobileMoney => write!(f, "MobileMoney"),
            PaymentMethod::BankTransfer => write!(f, "BankTransfer"),
            PaymentMethod::Internal => write!(f, "Internal"),
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MobileMoney" => Ok(Self::MobileMoney),
            "BankTransfer" => Ok(Self::BankTransfer),
            "Internal" => Ok(Self::Internal),
            s => Err(ConversionError(format!("Invalid payment method: {s}"))),
        }
    }
}

//--------------------------------------     Transaction     ---------------------------------------------------------
/// A single entry in the append-only ledger.
///
/// `id` is the monotonic, database-assigned ordering key. `txid` is the caller-supplied
/// idempotency key; retrying an append with the same `txid` never creates a second row.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub txid: String,
    pub entry_type: EntryType,
    pub status: TransactionStatus,
    pub amount: Pesewa,
    pub description: Option<String>,
    /// The entity this movement relates to: an order id for deposits and refunds, a payout id for
    /// payout and commission entries.
    pub related_id: Option<String>,
    pub payment_method: PaymentMethod,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

//--------------------------------------   NewTransaction    ---------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub txid: String,
    pub entry_type: EntryType,
    /// `Pending` or `Completed`; entries that settle instantly are appended as `Completed`.
    pub status: TransactionStatus,
    pub amount: Pesewa,
    pub description: Option<String>,
    pub related_id: Option<String>,
    pub payment_method: PaymentMethod,
}

impl NewTransaction {
    pub fn new(txid: String, entry_type: EntryType, amount: Pesewa, payment_method: PaymentMethod) -> Self {
        Self {
            txid,
            entry_type,
            status: TransactionStatus::Pending,
            amount,
            description: None,
            related_id: None,
            payment_method,
        }
    }

    pub fn completed(mut self) -> Self {
        self.status = TransactionStatus::Completed;
        self
    }

    pub fn with_description(mut self, description: String) -> Self {
        self.description = Some(description);
        self
    }

    pub fn with_related_id(mut self, related_id: String) -> Self {
        self.related_id = Some(related_id);
        self
    }
}

//--------------------------------------    PayoutStatus     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum PayoutStatus {
    /// Requested, waiting for an admin decision.
    PendingApproval,
    /// Approved; may be processed once the holding period has elapsed.
    Approved,
    /// Handed to the disbursement provider; the in-flight marker.
    Processing,
    /// The provider confirmed the transfer. Terminal.
    Completed,
    /// Rejected, or the provider reported a failure. Terminal.
    Failed,
}

impl PayoutStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PayoutStatus::Completed | PayoutStatus::Failed)
    }

    /// The payout transition table. Everything not listed here is illegal.
    pub fn can_transition_to(&self, next: PayoutStatus) -> bool {
        use PayoutStatus::*;
        matches!(
            (self, next),
            (PendingApproval, Approved) | (PendingApproval, Failed) | (Approved, Processing) | (Processing, Completed) | (Processing, Failed)
        )
    }
}

impl Display for PayoutStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PayoutStatus::PendingApproval => write!(f, "PendingApproval"),
            PayoutStatus::Approved => write!(f, "Approved"),
            PayoutStatus::Processing => write!(f, "Processing"),
            PayoutStatus::Completed => write!(f, "Completed"),
            PayoutStatus::Failed => write!(f, "Failed"),
        }
    }
}

impl FromStr for PayoutStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PendingApproval" => Ok(Self::PendingApproval),
            "Approved" => Ok(Self::Approved),
            "Processing" => Ok(Self::Processing),
            "Completed" => Ok(Self::Completed),
            "Failed" => Ok(Self::Failed),
            s => Err(ConversionError(format!("Invalid payout status: {s}"))),
        }
    }
}

//--------------------------------------       Payout        ---------------------------------------------------------
/// A farmer payout record.
///
/// The commission split is computed once, when the payout is requested, and never recomputed.
/// `commission + net_amount == total_amount` holds for every stored row.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Payout {
    pub id: i64,
    pub farmer_id: String,
    pub farmer_name: String,
    pub email: String,
    pub total_amount: Pesewa,
    pub commission: Pesewa,
    pub net_amount: Pesewa,
    pub status: PayoutStatus,
    pub payment_method: PaymentMethod,
    pub account_number: String,
    /// txid of the ledger entry recording this payout.
    pub txid: String,
    pub requested_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
    pub approved_by: Option<String>,
    pub processed_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub holding_period_days: i64,
    /// `requested_at + holding_period_days`; processing is refused before this instant.
    pub release_date: DateTime<Utc>,
    pub notes: Option<String>,
}

//--------------------------------------      NewPayout      ---------------------------------------------------------
/// A fully computed payout, ready for insertion. Built by the settlement coordinator from a
/// [`crate::PayoutRequest`] and a commission split.
#[derive(Debug, Clone)]
pub struct NewPayout {
    pub farmer_id: String,
    pub farmer_name: String,
    pub email: String,
    pub total_amount: Pesewa,
    pub commission: Pesewa,
    pub net_amount: Pesewa,
    pub payment_method: PaymentMethod,
    pub account_number: String,
    pub txid: String,
    pub requested_at: DateTime<Utc>,
    pub holding_period_days: u32,
    pub release_date: DateTime<Utc>,
    pub notes: Option<String>,
}

//--------------------------------------    DisputeStatus    ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum DisputeStatus {
    /// Filed by the buyer, not yet looked at.
    Open,
    /// Under review by an admin.
    Investigating,
    /// Closed without a refund. Terminal.
    Resolved,
    /// Upheld; the disputed amount was refunded. Terminal.
    Refunded,
}

impl DisputeStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, DisputeStatus::Resolved | DisputeStatus::Refunded)
    }

    /// While a dispute is in a blocking state, payouts for the disputed farmer may not enter
    /// `Processing`.
    pub fn blocks_settlement(&self) -> bool {
        matches!(self, DisputeStatus::Open | DisputeStatus::Investigating)
    }

    /// The dispute transition table. `Open -> Refunded` is the fast-track refund.
    pub fn can_transition_to(&self, next: DisputeStatus) -> bool {
        use DisputeStatus::*;
        matches!((self, next), (Open, Investigating) | (Open, Resolved) | (Open, Refunded) | (Investigating, Resolved) | (Investigating, Refunded))
    }
}

impl Display for DisputeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DisputeStatus::Open => write!(f, "Open"),
            DisputeStatus::Investigating => write!(f, "Investigating"),
            DisputeStatus::Resolved => write!(f, "Resolved"),
            DisputeStatus::Refunded => write!(f, "Refunded"),
        }
    }
}

impl FromStr for DisputeStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Open" => Ok(Self::Open),
            "Investigating" => Ok(Self::Investigating),
            "Resolved" => Ok(Self::Resolved),
            "Refunded" => Ok(Self::Refunded),
            s => Err(ConversionError(format!("Invalid dispute status: {s}"))),
        }
    }
}

//--------------------------------------       Dispute       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Dispute {
    pub id: i64,
    pub order_id: OrderId,
    pub buyer_id: String,
    pub buyer_name: String,
    pub farmer_id: String,
    pub farmer_name: String,
    /// The contested amount. A refund, if granted, moves exactly this amount.
    pub amount: Pesewa,
    pub reason: String,
    pub status: DisputeStatus,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolution: Option<String>,
}

//--------------------------------------     NewDispute      ---------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewDispute {
    pub order_id: OrderId,
    pub buyer_id: String,
    pub buyer_name: String,
    pub farmer_id: String,
    pub farmer_name: String,
    pub amount: Pesewa,
    pub reason: String,
}

impl NewDispute {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        order_id: OrderId,
        buyer_id: String,
        buyer_name: String,
        farmer_id: String,
        farmer_name: String,
        amount: Pesewa,
        reason: String,
    ) -> Self {
        Self { order_id, buyer_id, buyer_name, farmer_id, farmer_name, amount, reason }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn payout_transition_table() {
        use PayoutStatus::*;
        let all = [PendingApproval, Approved, Processing, Completed, Failed];
        let legal = [(PendingApproval, Approved), (PendingApproval, Failed), (Approved, Processing), (Processing, Completed), (Processing, Failed)];
        for from in all {
            for to in all {
                assert_eq!(from.can_transition_to(to), legal.contains(&(from, to)), "{from} -> {to}");
            }
        }
        assert!(Completed.is_terminal());
        assert!(Failed.is_terminal());
        assert!(!Processing.is_terminal());
    }

    #[test]
    fn dispute_transition_table() {
        use DisputeStatus::*;
        let all = [Open, Investigating, Resolved, Refunded];
        let legal =
            [(Open, Investigating), (Open, Resolved), (Open, Refunded), (Investigating, Resolved), (Investigating, Refunded)];
        for from in all {
            for to in all {
                assert_eq!(from.can_transition_to(to), legal.contains(&(from, to)), "{from} -> {to}");
            }
        }
        assert!(Open.blocks_settlement());
        assert!(Investigating.blocks_settlement());
        assert!(!Resolved.blocks_settlement());
        assert!(!Refunded.blocks_settlement());
    }

    #[test]
    fn transaction_finalization_rules() {
        use TransactionStatus::*;
        assert!(Pending.can_finalize_to(Completed));
        assert!(Pending.can_finalize_to(Failed));
        assert!(OnHold.can_finalize_to(Completed));
        assert!(!Completed.can_finalize_to(Failed));
        assert!(!Failed.can_finalize_to(Completed));
        assert!(!Pending.can_finalize_to(OnHold));
    }

    #[test]
    fn status_strings_round_trip() {
        for s in ["PendingApproval", "Approved", "Processing", "Completed", "Failed"] {
            assert_eq!(s.parse::<PayoutStatus>().unwrap().to_string(), s);
        }
        for s in ["Open", "Investigating", "Resolved", "Refunded"] {
            assert_eq!(s.parse::<DisputeStatus>().unwrap().to_string(), s);
        }
        for s in ["Deposit", "Withdrawal", "Refund", "Payout", "Commission"] {
            assert_eq!(s.parse::<EntryType>().unwrap().to_string(), s);
        }
        assert!("Frozen".parse::<PayoutStatus>().is_err());
    }
}
