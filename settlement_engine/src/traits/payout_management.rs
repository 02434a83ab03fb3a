use crate::{
    db_types::Payout,
    se_api::PayoutQueryFilter,
    traits::SettlementError,
};

/// Read access to payout records.
///
/// Payout rows are only ever *mutated* through the lifecycle flows on
/// [`crate::traits::SettlementDatabase`]; this trait is the query side.
#[allow(async_fn_in_trait)]
pub trait PayoutManagement {
    /// Fetches the payout with the given id. If no payout exists, `None` is returned.
    async fn fetch_payout(&self, payout_id: i64) -> Result<Option<Payout>, SettlementError>;

    /// Fetches all payouts ever requested for the given farmer, oldest first.
    async fn fetch_payouts_for_farmer(&self, farmer_id: &str) -> Result<Vec<Payout>, SettlementError>;

    /// Fetches payouts according to criteria specified in the `PayoutQueryFilter`.
    async fn search_payouts(&self, query: PayoutQueryFilter) -> Result<Vec<Payout>, SettlementError>;
}
