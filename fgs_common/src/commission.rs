use std::fmt::Display;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Pesewa;

const BPS_PER_PERCENT: f64 = 100.0;
const BPS_PER_WHOLE: i64 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum CommissionError {
    #[error("Commission rate must lie between 0% and 100%, got {0}")]
    InvalidRate(f64),
}

//--------------------------------------   CommissionRate    ---------------------------------------------------------
/// A platform commission rate, held in basis points so that splits can be computed in integer
/// arithmetic. Construct via [`CommissionRate::from_percent`], which rejects anything outside
/// `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionRate(i64);

impl CommissionRate {
    pub fn from_percent(percent: f64) -> Result<Self, CommissionError> {
        if !percent.is_finite() || !(0.0..=100.0).contains(&percent) {
            return Err(CommissionError::InvalidRate(percent));
        }
        #[allow(clippy::cast_possible_truncation)]
        Ok(Self((percent * BPS_PER_PERCENT).round() as i64))
    }

    pub fn basis_points(&self) -> i64 {
        self.0
    }

    pub fn as_percent(&self) -> f64 {
        self.0 as f64 / BPS_PER_PERCENT
    }
}

impl Display for CommissionRate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}%", self.as_percent())
    }
}

//--------------------------------------  CommissionSplit    ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionSplit {
    pub commission: Pesewa,
    pub net: Pesewa,
}

/// Splits a non-negative gross amount into the platform commission and the seller's net amount.
///
/// The commission is rounded half-up to the nearest pesewa. The net amount is `gross - commission`
/// exactly (it is never rounded independently), so `commission + net == gross` holds for every
/// input. Pure and idempotent.
pub fn split_commission(gross: Pesewa, rate: CommissionRate) -> CommissionSplit {
    let numerator = i128::from(gross.value()) * i128::from(rate.basis_points());
    let half = i128::from(BPS_PER_WHOLE / 2);
    #[allow(clippy::cast_possible_truncation)]
    let commission = Pesewa::from(((numerator + half) / i128::from(BPS_PER_WHOLE)) as i64);
    CommissionSplit { commission, net: gross - commission }
}

#[cfg(test)]
mod test {
    use rand::Rng;

    use super::*;

    #[test]
    fn five_percent_of_one_thousand() {
        let rate = CommissionRate::from_percent(5.0).unwrap();
        let split = split_commission(Pesewa::from(1000), rate);
        assert_eq!(split.commission, Pesewa::from(50));
        assert_eq!(split.net, Pesewa::from(950));
    }

    #[test]
    fn half_a_pesewa_rounds_up() {
        let rate = CommissionRate::from_percent(5.0).unwrap();
        // 5% of 10Gp is 0.5Gp, which rounds up to a whole pesewa.
        let split = split_commission(Pesewa::from(10), rate);
        assert_eq!(split.commission, Pesewa::from(1));
        assert_eq!(split.net, Pesewa::from(9));
    }

    #[test]
    fn boundary_rates_are_accepted() {
        let zero = CommissionRate::from_percent(0.0).unwrap();
        let all = CommissionRate::from_percent(100.0).unwrap();
        let gross = Pesewa::from(987);
        assert_eq!(split_commission(gross, zero).commission, Pesewa::from(0));
        assert_eq!(split_commission(gross, zero).net, gross);
        assert_eq!(split_commission(gross, all).commission, gross);
        assert_eq!(split_commission(gross, all).net, Pesewa::from(0));
    }

    #[test]
    fn out_of_range_rates_are_rejected() {
        assert_eq!(CommissionRate::from_percent(-0.01), Err(CommissionError::InvalidRate(-0.01)));
        assert_eq!(CommissionRate::from_percent(100.5), Err(CommissionError::InvalidRate(100.5)));
        assert!(CommissionRate::from_percent(f64::NAN).is_err());
        assert!(CommissionRate::from_percent(f64::INFINITY).is_err());
    }

    #[test]
    fn mini_fuzz_reconciliation() {
        let mut rng = rand::thread_rng();
        for _ in 0..1000 {
            let gross = Pesewa::from(rng.gen_range(0..=10_000_000_i64));
            let rate = CommissionRate::from_percent(rng.gen_range(0.0..=100.0)).unwrap();
            let split = split_commission(gross, rate);
            assert_eq!(split.commission + split.net, gross);
            assert!(!split.commission.is_negative());
            assert!(!split.net.is_negative());
        }
    }
}
