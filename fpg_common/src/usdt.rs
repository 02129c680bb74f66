use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::{
    decimal::{format_hundredths, parse_hundredths},
    Rupiah,
};

//--------------------------------------      UsdtAmount      ---------------------------------------------------------
/// An amount of USDT, held as a whole number of cents (0.01 USDT).
///
/// Same wire rules as [`Rupiah`]: persisted as an integer, serialised as a decimal string (`"25.50"`).
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(try_from = "UsdtRepr", into = "String")]
pub struct UsdtAmount(i64);

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Value cannot be represented in USDT: {0}")]
pub struct UsdtConversionError(String);

impl UsdtAmount {
    pub fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    pub fn from_usdt(usdt: i64) -> Self {
        Self(usdt * 100)
    }

    /// The raw value, in cents.
    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    pub fn to_decimal_string(&self) -> String {
        format_hundredths(self.0)
    }

    /// The rupiah value of this amount at `rate` rupiah per USDT, rounded down to the sen. `None` on overflow.
    pub fn to_rupiah(&self, rate: Rupiah) -> Option<Rupiah> {
        let sen = i128::from(self.0) * i128::from(rate.value()) / 100;
        i64::try_from(sen).ok().map(Rupiah::from_sen)
    }
}

impl FromStr for UsdtAmount {
    type Err = UsdtConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_hundredths(s).map(Self).map_err(UsdtConversionError)
    }
}

impl From<UsdtAmount> for String {
    fn from(value: UsdtAmount) -> Self {
        value.to_decimal_string()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum UsdtRepr {
    Text(String),
    Whole(i64),
}

impl TryFrom<UsdtRepr> for UsdtAmount {
    type Error = UsdtConversionError;

    fn try_from(value: UsdtRepr) -> Result<Self, Self::Error> {
        match value {
            UsdtRepr::Text(s) => s.parse(),
            UsdtRepr::Whole(v) => {
                v.checked_mul(100).map(Self).ok_or_else(|| UsdtConversionError(format!("{v} is too large")))
            },
        }
    }
}

impl Display for UsdtAmount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} USDT", self.to_decimal_string())
    }
}
