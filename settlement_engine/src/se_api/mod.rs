//! The settlement engine public API.
//!
//! [`SettlementApi`] is the coordination façade external collaborators call: payout and dispute
//! lifecycles, plus direct ledger recording. [`ReportsApi`] carries the read-only reporting
//! queries. Both are generic over the backend traits in [`crate::traits`].

mod payout_objects;
mod reports_api;
mod settlement_api;
mod transaction_objects;

pub use payout_objects::{PayoutQueryFilter, PayoutRequest};
pub use reports_api::ReportsApi;
pub use settlement_api::SettlementApi;
pub use transaction_objects::TransactionQueryFilter;
