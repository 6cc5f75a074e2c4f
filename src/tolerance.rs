use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;

use crate::error::Error;

/// Maximum absolute difference allowed between a group's sum and its target.
/// A zero tolerance is the exact regime.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Tolerance(Decimal);

impl Tolerance {
    pub const EXACT: Tolerance = Tolerance(Decimal::ZERO);

    /// Rejects negative tolerances.
    pub fn new(value: Decimal) -> Result<Self, Error> {
        if value < Decimal::ZERO {
            return Err(Error::InvalidTolerance(value));
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_exact(&self) -> bool {
        self.0.is_zero()
    }

    /// True if a residual is small enough to count as zero.
    #[inline(always)]
    pub fn covers(&self, residual: Decimal) -> bool {
        residual.abs() <= self.0
    }

    /// True if `a` and `b` are equal up to the tolerance.
    /// A difference past the decimal range is never within it.
    #[inline(always)]
    pub fn within(&self, a: Decimal, b: Decimal) -> bool {
        a.checked_sub(b).is_some_and(|d| self.covers(d))
    }

    /// Slack allowed between sum(X) and sum(Y) when there are `groups` groups.
    pub fn slack(&self, groups: usize) -> Decimal {
        self.0.saturating_mul(Decimal::from(groups))
    }
}

impl FromStr for Tolerance {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s
            .trim()
            .parse::<Decimal>()
            .map_err(|_| Error::BadTolerance(s.to_string()))?;
        Self::new(value)
    }
}

impl fmt::Display for Tolerance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_exact() {
            write!(f, "exact")
        } else {
            write!(f, "±{}", self.0)
        }
    }
}
