use std::fmt::Debug;

use fpg_common::Rupiah;
use log::*;

use crate::{
    db_types::{NewUsdtRate, UsdtRate},
    traits::{UsdtRateError, UsdtRates},
};

pub const MIN_USDT_RATE: i64 = 1_000;
pub const MAX_USDT_RATE: i64 = 100_000;
pub const MAX_RATE_NOTE_LENGTH: usize = 500;
pub const MAX_RATE_HISTORY: i64 = 100;

/// The rupiah price of one USDT. Every change appends a row; the latest row is the current rate.
pub struct UsdtRateApi<B> {
    db: B,
}

impl<B> Debug for UsdtRateApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "UsdtRateApi")
    }
}

impl<B> UsdtRateApi<B>
where B: UsdtRates
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub async fn current_rate(&self) -> Result<UsdtRate, UsdtRateError> {
        self.db.fetch_current_rate().await
    }

    /// Sets a new rate. The rate must be between Rp1.000 and Rp100.000 per USDT.
    pub async fn set_rate(
        &self,
        rate: Rupiah,
        note: Option<String>,
        admin_id: Option<i64>,
    ) -> Result<UsdtRate, UsdtRateError> {
        if rate < Rupiah::from_rupiah(MIN_USDT_RATE) || rate > Rupiah::from_rupiah(MAX_USDT_RATE) {
            return Err(UsdtRateError::InvalidRate(format!(
                "{rate} is outside the allowed range of {} to {}",
                Rupiah::from_rupiah(MIN_USDT_RATE),
                Rupiah::from_rupiah(MAX_USDT_RATE)
            )));
        }
        let note = note.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());
        if note.as_ref().map(|n| n.chars().count() > MAX_RATE_NOTE_LENGTH).unwrap_or(false) {
            return Err(UsdtRateError::InvalidRate(format!("The note is longer than {MAX_RATE_NOTE_LENGTH} characters")));
        }
        let rate = self.db.insert_rate(NewUsdtRate { rate, note, created_by: admin_id }).await?;
        info!("💱️ USDT rate is now {} (set by {:?})", rate.rate, rate.created_by);
        Ok(rate)
    }

    /// The most recent rates, newest first. `limit` is clamped to 1..=100.
    pub async fn history(&self, limit: i64) -> Result<Vec<UsdtRate>, UsdtRateError> {
        self.db.fetch_rate_history(limit.clamp(1, MAX_RATE_HISTORY)).await
    }
}
