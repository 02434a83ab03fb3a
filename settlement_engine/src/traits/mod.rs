//! Interface contracts for settlement engine backends and collaborators.
//!
//! The engine never reaches a concrete store directly. Backends implement the repository traits
//! here, and the public API façades ([`crate::SettlementApi`], [`crate::ReportsApi`]) are generic
//! over them:
//!
//! * [`LedgerManagement`] owns the append-only transaction ledger.
//! * [`PayoutManagement`] and [`DisputeManagement`] provide read access to payout and dispute
//!   records.
//! * [`SettlementDatabase`] defines the atomic lifecycle flows (a transition either fully
//!   succeeds, mutating state and touching the ledger exactly once, or fully fails with no
//!   partial write).
//! * [`Authorizer`] and [`DisbursementProvider`] are the contracts of the external access-control
//!   and money-movement collaborators.

mod authorizer;
mod disbursement;
mod dispute_management;
mod ledger_management;
mod payout_management;
mod settlement_database;

pub use authorizer::{AllowAll, Authorizer, SettlementAction};
pub use disbursement::{DisbursementError, DisbursementInstruction, DisbursementProvider, SandboxProvider};
pub use dispute_management::DisputeManagement;
pub use ledger_management::{LedgerError, LedgerManagement};
pub use payout_management::PayoutManagement;
pub use settlement_database::{SettlementDatabase, SettlementError};
