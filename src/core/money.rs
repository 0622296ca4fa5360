//! Fixed-point money amounts.
//!
//! A [`Money`] value is a whole number of minor currency units (cents, kopecks).
//! There is no floating point anywhere in the money path: parsing works on the
//! decimal digits directly, and the value is stored in the database as a plain
//! `BIGINT` through `SeaORM`'s value-type derive.
//!
//! Every `i64` is representable and round-trips through [`Money::parse`].
//! Addition saturates at the `i64` bounds; use [`Money::checked_add`] when an
//! overflow has to be reported.

use crate::errors::{Error, Result};
use sea_orm::DeriveValueType;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};
use std::str::FromStr;

const MINOR_PER_MAJOR: i64 = 100;

/// An amount of money in minor units.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, DeriveValueType,
)]
pub struct Money(i64);

impl Money {
    /// Zero minor units.
    pub const ZERO: Self = Self(0);

    /// Wraps a raw count of minor units.
    #[must_use]
    pub const fn from_minor(minor_units: i64) -> Self {
        Self(minor_units)
    }

    /// Builds an amount from a major part and a minor part, e.g. `(15, 99)` is 15.99.
    ///
    /// Returns `None` when the result does not fit in an `i64`.
    #[must_use]
    pub const fn from_major_minor(major: i64, minor: i64) -> Option<Self> {
        match major.checked_mul(MINOR_PER_MAJOR) {
            Some(scaled) => match scaled.checked_add(minor) {
                Some(total) => Some(Self(total)),
                None => None,
            },
            None => None,
        }
    }

    /// Exact sum, or `None` on overflow.
    #[must_use]
    pub const fn checked_add(self, rhs: Self) -> Option<Self> {
        match self.0.checked_add(rhs.0) {
            Some(total) => Some(Self(total)),
            None => None,
        }
    }

    /// Total amount in minor units.
    #[must_use]
    pub const fn minor_units(self) -> i64 {
        self.0
    }

    /// Whole major units, truncated toward zero.
    #[must_use]
    pub const fn major(self) -> i64 {
        self.0 / MINOR_PER_MAJOR
    }

    /// The minor part only, always in `0..100`.
    #[must_use]
    pub const fn minor_part(self) -> i64 {
        (self.0 % MINOR_PER_MAJOR).abs()
    }

    /// True when the amount is strictly greater than zero.
    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// True when the amount is exactly zero.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Parses user input such as `"15.99"`, `"15,9"` or `" 15 "`.
    ///
    /// Accepts at most one decimal separator (`.` or `,`) and at most two
    /// fractional digits. A single fractional digit is read as tenths, so
    /// `"15.9"` is 15.90.
    pub fn parse(input: &str) -> Result<Self> {
        let invalid = |reason: &str| Error::InvalidMoney {
            input: input.to_string(),
            reason: reason.to_string(),
        };

        let normalized = input.trim().replace(',', ".");
        if normalized.is_empty() {
            return Err(invalid("amount is empty"));
        }

        let (negative, unsigned) = match normalized.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, normalized.strip_prefix('+').unwrap_or(normalized.as_str())),
        };

        let mut parts = unsigned.split('.');
        let integer_part = parts.next().unwrap_or_default();
        let fraction_part = parts.next();
        if parts.next().is_some() {
            return Err(invalid("more than one decimal separator"));
        }

        let major = parse_digits(integer_part).ok_or_else(|| invalid("invalid whole part"))?;
        let major = i128::from(major);

        let minor = match fraction_part {
            None => 0,
            Some(fraction) if fraction.len() > 2 => {
                return Err(invalid("too many digits after the decimal point (max 2)"));
            }
            Some(fraction) => {
                let value = i128::from(parse_digits(fraction).ok_or_else(|| invalid("invalid fractional part"))?);
                if fraction.len() == 1 { value * 10 } else { value }
            }
        };

        // i64::MIN has no positive counterpart, so the sign is applied before narrowing
        let magnitude = major * i128::from(MINOR_PER_MAJOR) + minor;
        let signed = if negative { -magnitude } else { magnitude };
        i64::try_from(signed)
            .map(Self)
            .map_err(|_| invalid("amount is too large"))
    }
}

/// Parses a non-empty run of ASCII digits.
fn parse_digits(digits: &str) -> Option<i64> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

impl FromStr for Money {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let per = MINOR_PER_MAJOR.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / per, abs % per)
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}
