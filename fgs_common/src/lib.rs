mod commission;
mod helpers;
mod money;

pub mod op;
mod secret;

pub use commission::{split_commission, CommissionError, CommissionRate, CommissionSplit};
pub use helpers::parse_boolean_flag;
pub use money::{Pesewa, PesewaConversionError, CEDI_CURRENCY_CODE, CEDI_CURRENCY_CODE_LOWER, PESEWAS_PER_CEDI};
pub use secret::Secret;
