use std::time::Duration;

use log::debug;
use sqlx::SqliteConnection;

use crate::db_types::OrderId;

/// Deletes `key` if it is older than `window`, so that it can be bound to a new order.
///
/// This is a write, so calling it first in a transaction also serialises concurrent submissions of the same key.
pub async fn expire_key(key: &str, window: Duration, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    let result = sqlx::query(
        "DELETE FROM idempotency_keys WHERE idem_key = $1 AND (unixepoch(CURRENT_TIMESTAMP) - unixepoch(created_at)) \
         >= $2",
    )
    .bind(key)
    .bind(window.as_secs() as i64)
    .execute(conn)
    .await?;
    if result.rows_affected() > 0 {
        debug!("🗃️ Idempotency key {key} had expired and was recycled");
    }
    Ok(())
}

/// The order bound to `key`, if any.
pub async fn fetch_order_id(key: &str, conn: &mut SqliteConnection) -> Result<Option<OrderId>, sqlx::Error> {
    let id: Option<(String,)> = sqlx::query_as("SELECT order_id FROM idempotency_keys WHERE idem_key = $1")
        .bind(key)
        .fetch_optional(conn)
        .await?;
    Ok(id.map(|(id,)| OrderId(id)))
}

pub async fn bind_key(key: &str, order_id: &OrderId, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO idempotency_keys (idem_key, order_id) VALUES ($1, $2)")
        .bind(key)
        .bind(order_id.as_str())
        .execute(conn)
        .await?;
    Ok(())
}
