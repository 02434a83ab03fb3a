use fgs_common::Pesewa;
use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db_types::{PaymentMethod, Payout};

#[derive(Debug, Clone, Error)]
pub enum DisbursementError {
    #[error("The disbursement provider rejected the instruction: {0}")]
    Rejected(String),
    #[error("The disbursement provider could not be reached: {0}")]
    Unavailable(String),
}

/// The instruction handed to the external disbursement provider once a payout enters
/// `Processing`. Carries the *net* amount — the commission never leaves the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisbursementInstruction {
    pub payout_id: i64,
    pub account_number: String,
    pub amount: Pesewa,
    pub payment_method: PaymentMethod,
}

impl From<&Payout> for DisbursementInstruction {
    fn from(payout: &Payout) -> Self {
        Self {
            payout_id: payout.id,
            account_number: payout.account_number.clone(),
            amount: payout.net_amount,
            payment_method: payout.payment_method,
        }
    }
}

/// Contract of the external money-movement collaborator.
///
/// The provider reports success or failure asynchronously; whatever drives that outcome calls
/// `complete_payout` or `fail_payout` on the coordinator. The engine itself never retries a
/// failed disbursement — retry policy belongs to the provider integration.
#[allow(async_fn_in_trait)]
pub trait DisbursementProvider {
    async fn submit(&self, instruction: DisbursementInstruction) -> Result<(), DisbursementError>;
}

/// Provider stand-in that accepts every instruction. Used in tests and sandboxed deployments.
#[derive(Debug, Default, Clone, Copy)]
pub struct SandboxProvider;

impl DisbursementProvider for SandboxProvider {
    async fn submit(&self, instruction: DisbursementInstruction) -> Result<(), DisbursementError> {
        debug!(
            "🏦️ Sandbox disbursement of {} to {} via {} accepted",
            instruction.amount, instruction.account_number, instruction.payment_method
        );
        Ok(())
    }
}
