use sqlx::SqliteConnection;

use crate::db_types::{OrderStatusType, StatusHistory};

/// Appends a row to the audit trail. Rows are never updated or deleted (the schema enforces it).
pub async fn append(
    order_id: i64,
    status: OrderStatusType,
    note: &str,
    changed_by: Option<i64>,
    conn: &mut SqliteConnection,
) -> Result<StatusHistory, sqlx::Error> {
    let row = sqlx::query_as(
        "INSERT INTO order_status_histories (order_id, status, note, changed_by) VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(order_id)
    .bind(status.to_string())
    .bind(note)
    .bind(changed_by)
    .fetch_one(conn)
    .await?;
    Ok(row)
}

pub async fn fetch_for_order(order_id: i64, conn: &mut SqliteConnection) -> Result<Vec<StatusHistory>, sqlx::Error> {
    let rows = sqlx::query_as("SELECT * FROM order_status_histories WHERE order_id = $1 ORDER BY id ASC")
        .bind(order_id)
        .fetch_all(conn)
        .await?;
    Ok(rows)
}
