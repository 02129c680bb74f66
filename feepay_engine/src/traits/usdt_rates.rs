use thiserror::Error;

use crate::db_types::{NewUsdtRate, UsdtRate};

#[derive(Debug, Clone, Error)]
pub enum UsdtRateError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("No USDT rate has been set yet")]
    RateDoesNotExist,
    #[error("Invalid USDT rate: {0}")]
    InvalidRate(String),
}

impl From<sqlx::Error> for UsdtRateError {
    fn from(e: sqlx::Error) -> Self {
        UsdtRateError::DatabaseError(e.to_string())
    }
}

/// The USDT price table. Rows are only ever appended; the current rate is the most recent row.
#[allow(async_fn_in_trait)]
pub trait UsdtRates {
    /// Fetch the most recent rate. If no rate was ever set, [`UsdtRateError::RateDoesNotExist`] is returned.
    async fn fetch_current_rate(&self) -> Result<UsdtRate, UsdtRateError>;

    /// Append a new rate. It becomes the current rate immediately.
    async fn insert_rate(&self, rate: NewUsdtRate) -> Result<UsdtRate, UsdtRateError>;

    /// The most recent `limit` rates, newest first.
    async fn fetch_rate_history(&self, limit: i64) -> Result<Vec<UsdtRate>, UsdtRateError>;
}
