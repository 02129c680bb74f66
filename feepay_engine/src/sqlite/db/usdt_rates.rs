use sqlx::SqliteConnection;

use crate::{
    db_types::{NewUsdtRate, UsdtRate},
    traits::UsdtRateError,
};

pub async fn fetch_last_rate(conn: &mut SqliteConnection) -> Result<UsdtRate, UsdtRateError> {
    let result = sqlx::query_as("SELECT * FROM usdt_rates ORDER BY id DESC LIMIT 1")
        .fetch_optional(conn)
        .await?
        .ok_or(UsdtRateError::RateDoesNotExist)?;
    Ok(result)
}

pub async fn insert_rate(rate: NewUsdtRate, conn: &mut SqliteConnection) -> Result<UsdtRate, UsdtRateError> {
    let result = sqlx::query_as("INSERT INTO usdt_rates (rate, note, created_by) VALUES ($1, $2, $3) RETURNING *")
        .bind(rate.rate.value())
        .bind(rate.note)
        .bind(rate.created_by)
        .fetch_one(conn)
        .await?;
    Ok(result)
}

pub async fn fetch_rate_history(limit: i64, conn: &mut SqliteConnection) -> Result<Vec<UsdtRate>, UsdtRateError> {
    let rows = sqlx::query_as("SELECT * FROM usdt_rates ORDER BY id DESC LIMIT $1").bind(limit).fetch_all(conn).await?;
    Ok(rows)
}
