//! FarmGate Settlement Engine
//!
//! The settlement engine turns gross order revenue owed to a farmer into a scheduled,
//! commission-adjusted, auditable payout, maintains the append-only transaction ledger that is
//! the source of truth for all reporting, and resolves buyer disputes that may claw funds back.
//! It is store-agnostic: backends implement the traits in [`mod@traits`], and SQLite support
//! ships in-tree.
//!
//! The library is divided into three main sections:
//! 1. Backend contracts and storage ([`mod@traits`], [`SqliteDatabase`]). You should never need
//!    to touch the database directly — use the public API instead. The exception is the data
//!    types stored by the backends, which live in [`mod@db_types`] and are public.
//! 2. The public API ([`SettlementApi`] for lifecycle flows, [`ReportsApi`] for read-only
//!    reporting). This is what external collaborators call; it enforces the cross-entity
//!    invariants (a payout cannot be released while an open dispute names its farmer) and is the
//!    only place ledger txids are minted.
//! 3. Events ([`mod@events`]): hooks that fire when a payout completes or a dispute is resolved,
//!    using a small async pub-sub channel.

pub mod config;
pub mod db_types;
pub mod events;
pub mod helpers;
mod se_api;
pub mod traits;

#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use se_api::{PayoutQueryFilter, PayoutRequest, ReportsApi, SettlementApi, TransactionQueryFilter};
pub use traits::{LedgerError, SettlementError};
