use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, Mul, Neg, Sub, SubAssign},
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

pub const CEDI_CURRENCY_CODE: &str = "GHS";
pub const CEDI_CURRENCY_CODE_LOWER: &str = "ghs";
/// Number of pesewas in one cedi.
pub const PESEWAS_PER_CEDI: i64 = 100;

//--------------------------------------       Pesewa        ---------------------------------------------------------
/// A monetary amount in pesewas, the minor unit of the Ghana cedi.
///
/// All engine arithmetic happens in whole pesewas. Direction of a movement (credit vs debit) is
/// carried by the owning record's type, not by the sign of the amount.
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct Pesewa(i64);

op!(binary Pesewa, Add, add);
op!(binary Pesewa, Sub, sub);
op!(inplace Pesewa, SubAssign, sub_assign);
op!(unary Pesewa, Neg, neg);

impl Mul<i64> for Pesewa {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self::from(self.value() * rhs)
    }
}

impl Sum for Pesewa {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented in pesewas: {0}")]
pub struct PesewaConversionError(String);

impl From<i64> for Pesewa {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl PartialEq for Pesewa {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Pesewa {}

impl TryFrom<u64> for Pesewa {
    type Error = PesewaConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        if value > i64::MAX as u64 {
            Err(PesewaConversionError(format!("Value {} is too large to convert to Pesewa", value)))
        } else {
            #[allow(clippy::cast_possible_wrap)]
            Ok(Self(value as i64))
        }
    }
}

impl Display for Pesewa {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0.abs() < PESEWAS_PER_CEDI {
            write!(f, "{}Gp", self.0)
        } else {
            let cedis = self.0 as f64 / PESEWAS_PER_CEDI as f64;
            write!(f, "GH₵{cedis:0.2}")
        }
    }
}

impl Pesewa {
    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn from_cedis(cedis: i64) -> Self {
        Self(cedis * PESEWAS_PER_CEDI)
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn arithmetic_on_pesewas() {
        let a = Pesewa::from(150);
        let b = Pesewa::from(75);
        assert_eq!(a + b, Pesewa::from(225));
        assert_eq!(a - b, Pesewa::from(75));
        assert_eq!(-b, Pesewa::from(-75));
        assert_eq!(b * 4, Pesewa::from(300));
        let mut c = a;
        c -= b;
        assert_eq!(c, b);
        let total: Pesewa = [a, b, c].into_iter().sum();
        assert_eq!(total, Pesewa::from(300));
    }

    #[test]
    fn display_switches_to_cedis() {
        assert_eq!(Pesewa::from(99).to_string(), "99Gp");
        assert_eq!(Pesewa::from_cedis(12).to_string(), "GH₵12.00");
        assert_eq!(Pesewa::from(1250).to_string(), "GH₵12.50");
    }

    #[test]
    fn u64_conversion_guards_overflow() {
        assert!(Pesewa::try_from(u64::MAX).is_err());
        assert_eq!(Pesewa::try_from(500u64).unwrap(), Pesewa::from(500));
    }
}
