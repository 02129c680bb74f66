use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, Mul, Neg, Sub, SubAssign},
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::{
    decimal::{format_hundredths, parse_hundredths},
    op,
};

pub const IDR_CURRENCY_CODE: &str = "IDR";

const SEN_PER_RUPIAH: i64 = 100;

//--------------------------------------       Rupiah        ---------------------------------------------------------
/// An amount of Indonesian rupiah, held as a whole number of sen (1/100 rupiah).
///
/// Amounts are persisted as plain integers and serialised as fixed-point decimal strings (`"21000.00"`), so a
/// floating point value never touches a price.
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(try_from = "RupiahRepr", into = "String")]
pub struct Rupiah(i64);

op!(binary Rupiah, Add, add);
op!(binary Rupiah, Sub, sub);
op!(inplace Rupiah, SubAssign, sub_assign);
op!(unary Rupiah, Neg, neg);

impl Mul<i64> for Rupiah {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self(self.0 * rhs)
    }
}

impl Sum for Rupiah {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Value cannot be represented in rupiah: {0}")]
pub struct RupiahConversionError(String);

impl Rupiah {
    pub fn from_sen(sen: i64) -> Self {
        Self(sen)
    }

    pub fn from_rupiah(rupiah: i64) -> Self {
        Self(rupiah * SEN_PER_RUPIAH)
    }

    /// The raw value, in sen.
    pub fn value(&self) -> i64 {
        self.0
    }

    /// The whole-rupiah part of the amount. Payment gateways only accept integer rupiah.
    pub fn whole_rupiah(&self) -> i64 {
        self.0 / SEN_PER_RUPIAH
    }

    pub fn is_whole(&self) -> bool {
        self.0 % SEN_PER_RUPIAH == 0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Formats the amount as a plain fixed-point decimal, e.g. `21000.00`.
    pub fn to_decimal_string(&self) -> String {
        format_hundredths(self.0)
    }
}

impl FromStr for Rupiah {
    type Err = RupiahConversionError;

    /// Parses decimal strings such as `21000`, `21000.5` or `21000.00`. More than two decimal places are only
    /// accepted when the extra digits are zeros.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_hundredths(s).map(Self).map_err(RupiahConversionError)
    }
}

impl From<Rupiah> for String {
    fn from(value: Rupiah) -> Self {
        value.to_decimal_string()
    }
}

/// Wire representation: either a decimal string or a whole number of rupiah.
#[derive(Deserialize)]
#[serde(untagged)]
enum RupiahRepr {
    Text(String),
    Whole(i64),
}

impl TryFrom<RupiahRepr> for Rupiah {
    type Error = RupiahConversionError;

    fn try_from(value: RupiahRepr) -> Result<Self, Self::Error> {
        match value {
            RupiahRepr::Text(s) => s.parse(),
            RupiahRepr::Whole(v) => v
                .checked_mul(SEN_PER_RUPIAH)
                .map(Self)
                .ok_or_else(|| RupiahConversionError(format!("{v} is too large"))),
        }
    }
}

impl Display for Rupiah {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let whole = (abs / 100).to_string();
        let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
        for (i, c) in whole.chars().enumerate() {
            if i > 0 && (whole.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(c);
        }
        match abs % 100 {
            0 => write!(f, "{sign}Rp{grouped}"),
            sen => write!(f, "{sign}Rp{grouped},{sen:02}"),
        }
    }
}
