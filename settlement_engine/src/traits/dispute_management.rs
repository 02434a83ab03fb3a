use crate::{
    db_types::{Dispute, OrderId},
    traits::SettlementError,
};

/// Read access to dispute records.
///
/// Dispute rows are only ever *mutated* through the lifecycle flows on
/// [`crate::traits::SettlementDatabase`]; this trait is the query side.
#[allow(async_fn_in_trait)]
pub trait DisputeManagement {
    /// Fetches the dispute with the given id. If no dispute exists, `None` is returned.
    async fn fetch_dispute(&self, dispute_id: i64) -> Result<Option<Dispute>, SettlementError>;

    /// Fetches all disputes filed against the given order, oldest first.
    async fn fetch_disputes_for_order(&self, order_id: &OrderId) -> Result<Vec<Dispute>, SettlementError>;

    /// Fetches all disputes naming the given farmer, oldest first.
    async fn fetch_disputes_for_farmer(&self, farmer_id: &str) -> Result<Vec<Dispute>, SettlementError>;

    /// Counts the `Open`/`Investigating` disputes naming the given farmer. A non-zero count
    /// blocks that farmer's payouts from entering `Processing`.
    async fn count_blocking_disputes(&self, farmer_id: &str) -> Result<i64, SettlementError>;
}
