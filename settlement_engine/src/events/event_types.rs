use serde::{Deserialize, Serialize};

use crate::db_types::{Dispute, Payout, Transaction};

/// Emitted when a payout reaches `Completed` and its ledger entries have settled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutCompletedEvent {
    pub payout: Payout,
}

impl PayoutCompletedEvent {
    pub fn new(payout: Payout) -> Self {
        Self { payout }
    }
}

/// Emitted when a dispute reaches a terminal state. `refund` carries the ledger entry when the
/// dispute was upheld with a refund.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisputeResolvedEvent {
    pub dispute: Dispute,
    pub refund: Option<Transaction>,
}

impl DisputeResolvedEvent {
    pub fn new(dispute: Dispute, refund: Option<Transaction>) -> Self {
        Self { dispute, refund }
    }
}
