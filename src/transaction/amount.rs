//! A fixed-point money type stored as whole cents.

use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, AddAssign, Sub},
};

use rusqlite::types::{FromSql, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::Error;

/// The number of minor units (cents) in one major unit.
const CENTS_PER_UNIT: i64 = 100;

/// The largest amount, in major units, a client may submit.
const MAX_UNITS: f64 = 1e12;

/// An amount of money in minor units (cents).
///
/// Sums are exact, so the order transactions are added in never changes a
/// total. Amounts are only converted to decimals for display and JSON.
///
/// Arithmetic saturates at the bounds of `i64` instead of overflowing.
///
/// Transaction amounts are never negative, but totals derived from them (e.g., a
/// net balance) can be, so the inner value is signed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(i64);

impl Amount {
    /// Zero dollars and zero cents.
    pub const ZERO: Amount = Amount(0);

    /// Create an amount from a number of cents.
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Parse a decimal amount submitted by a client, e.g. `12.34`.
    ///
    /// The value is rounded to the nearest cent.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidAmount] if `value` is negative, not finite, or
    /// more than one trillion units.
    pub fn from_decimal(value: f64) -> Result<Self, Error> {
        if !value.is_finite() || !(0.0..=MAX_UNITS).contains(&value) {
            return Err(Error::InvalidAmount(value));
        }

        Ok(Self((value * CENTS_PER_UNIT as f64).round() as i64))
    }

    /// The amount in cents.
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// The amount as a decimal number of major units.
    pub fn as_f64(&self) -> f64 {
        self.0 as f64 / CENTS_PER_UNIT as f64
    }

    /// Whether the amount is below zero.
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// The whole units and the remaining cents of the absolute amount.
    pub(crate) const fn split_abs(&self) -> (u64, u64) {
        let abs = self.0.unsigned_abs();
        (abs / CENTS_PER_UNIT as u64, abs % CENTS_PER_UNIT as u64)
    }
}

impl Add for Amount {
    type Output = Amount;

    fn add(self, rhs: Self) -> Self::Output {
        Amount(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Amount {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Amount {
    type Output = Amount;

    fn sub(self, rhs: Self) -> Self::Output {
        Amount(self.0.saturating_sub(rhs.0))
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Amount::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Amount> for Amount {
    fn sum<I: Iterator<Item = &'a Amount>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (units, cents) = self.split_abs();
        let sign = if self.is_negative() { "-" } else { "" };

        write!(f, "{sign}{units}.{cents:02}")
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(self.as_f64())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = f64::deserialize(deserializer)?;
        Amount::from_decimal(value).map_err(serde::de::Error::custom)
    }
}

impl ToSql for Amount {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0))
    }
}

impl FromSql for Amount {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        i64::column_result(value).map(Amount)
    }
}
