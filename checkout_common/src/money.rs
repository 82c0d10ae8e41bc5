use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, AddAssign, Sub},
    str::FromStr,
};

use rust_decimal::{prelude::ToPrimitive, Decimal};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sqlx::Type;
use thiserror::Error;

use crate::op;

/// Number of decimal places carried by [`Money`].
pub const MONEY_SCALE: u32 = 2;

const MINOR_UNITS_PER_MAJOR: i64 = 100;

//--------------------------------------        Money        ---------------------------------------------------------
/// A currency-exact amount, stored as an integer number of minor units (cents).
///
/// All arithmetic is integer arithmetic, so summing line items never drifts. On the wire, amounts are exchanged as
/// decimals (`"499.00"`) and converted with [`Money::try_from`]; anything that does not fit in two decimal places is
/// rejected rather than rounded.
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd, PartialEq, Eq, Hash)]
#[sqlx(transparent)]
pub struct Money(i64);

op!(binary Money, Add, add);
op!(binary Money, Sub, sub);
op!(inplace Money, AddAssign, add_assign);

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoneyConversionError {
    #[error("{0} has more than {MONEY_SCALE} decimal places")]
    TooPrecise(Decimal),
    #[error("{0} is negative")]
    Negative(Decimal),
    #[error("{0} is too large to be represented")]
    OutOfRange(String),
    #[error("'{0}' is not a valid amount")]
    InvalidFormat(String),
}

impl Money {
    pub fn from_minor_units(value: i64) -> Self {
        Self(value)
    }

    pub fn zero() -> Self {
        Self(0)
    }

    /// The amount in minor units (cents)
    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn from_major_units(value: i64) -> Result<Self, MoneyConversionError> {
        value
            .checked_mul(MINOR_UNITS_PER_MAJOR)
            .map(Self)
            .ok_or_else(|| MoneyConversionError::OutOfRange(value.to_string()))
    }

    pub fn as_decimal(&self) -> Decimal {
        Decimal::new(self.0, MONEY_SCALE)
    }

    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    /// Line total for `quantity` units at this unit price. `None` on overflow.
    pub fn checked_mul(self, quantity: i64) -> Option<Self> {
        self.0.checked_mul(quantity).map(Self)
    }
}

impl TryFrom<Decimal> for Money {
    type Error = MoneyConversionError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(MoneyConversionError::Negative(value));
        }
        let minor = value
            .checked_mul(Decimal::from(MINOR_UNITS_PER_MAJOR))
            .ok_or_else(|| MoneyConversionError::OutOfRange(value.to_string()))?;
        if !minor.fract().is_zero() {
            return Err(MoneyConversionError::TooPrecise(value));
        }
        minor.to_i64().map(Self).ok_or_else(|| MoneyConversionError::OutOfRange(value.to_string()))
    }
}

impl FromStr for Money {
    type Err = MoneyConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = Decimal::from_str(s.trim()).map_err(|_| MoneyConversionError::InvalidFormat(s.to_string()))?;
        Self::try_from(value)
    }
}

impl From<Money> for Decimal {
    fn from(value: Money) -> Self {
        value.as_decimal()
    }
}

impl Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_decimal())
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        Serialize::serialize(&self.as_decimal(), serializer)
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = <Decimal as Deserialize>::deserialize(deserializer)?;
        Self::try_from(value).map_err(serde::de::Error::custom)
    }
}
