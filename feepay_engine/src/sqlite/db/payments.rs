use log::trace;
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    db_types::{NewPayment, Payment, PaymentStatus},
    payment_objects::PaymentQueryFilter,
};
use fpg_common::Rupiah;

pub async fn insert_payment(
    order_id: i64,
    amount: Rupiah,
    payment: NewPayment,
    conn: &mut SqliteConnection,
) -> Result<Payment, sqlx::Error> {
    let payment = sqlx::query_as(
        r#"
            INSERT INTO payments (payment_id, order_id, payment_type, amount, proof_reference, status)
            VALUES ($1, $2, $3, $4, $5, 'pending')
            RETURNING *;
        "#,
    )
    .bind(payment.payment_id)
    .bind(order_id)
    .bind(payment.payment_type.to_string())
    .bind(amount.value())
    .bind(payment.proof_reference)
    .fetch_one(conn)
    .await?;
    Ok(payment)
}

pub async fn fetch_payment(payment_id: &str, conn: &mut SqliteConnection) -> Result<Option<Payment>, sqlx::Error> {
    let payment =
        sqlx::query_as("SELECT * FROM payments WHERE payment_id = $1").bind(payment_id).fetch_optional(conn).await?;
    Ok(payment)
}

pub async fn fetch_payment_for_order(order_id: i64, conn: &mut SqliteConnection) -> Result<Option<Payment>, sqlx::Error> {
    let payment =
        sqlx::query_as("SELECT * FROM payments WHERE order_id = $1").bind(order_id).fetch_optional(conn).await?;
    Ok(payment)
}

/// Takes the write lock (see [`super::orders::lock_order`]) and returns the payment as it is now.
pub async fn lock_payment(payment_id: &str, conn: &mut SqliteConnection) -> Result<Option<Payment>, sqlx::Error> {
    let payment = sqlx::query_as("UPDATE payments SET updated_at = updated_at WHERE payment_id = $1 RETURNING *")
        .bind(payment_id)
        .fetch_optional(conn)
        .await?;
    Ok(payment)
}

pub async fn resolve_payment(
    id: i64,
    status: PaymentStatus,
    admin_id: i64,
    note: Option<&str>,
    conn: &mut SqliteConnection,
) -> Result<Payment, sqlx::Error> {
    let payment = sqlx::query_as(
        r#"
            UPDATE payments SET
                status = $1,
                verified_by = $2,
                admin_note = $3,
                verified_at = CURRENT_TIMESTAMP,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $4
            RETURNING *;
        "#,
    )
    .bind(status.to_string())
    .bind(admin_id)
    .bind(note)
    .bind(id)
    .fetch_one(conn)
    .await?;
    Ok(payment)
}

/// Newest first.
pub async fn search_payments(
    query: PaymentQueryFilter,
    conn: &mut SqliteConnection,
) -> Result<Vec<Payment>, sqlx::Error> {
    let mut builder = QueryBuilder::new("SELECT * FROM payments ");
    if !query.is_empty() {
        builder.push("WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if let Some(status) = query.status {
        where_clause.push("status = ");
        where_clause.push_bind_unseparated(status.to_string());
    }
    if let Some(payment_type) = query.payment_type {
        where_clause.push("payment_type = ");
        where_clause.push_bind_unseparated(payment_type.to_string());
    }
    if let Some(order_id) = query.order_id {
        where_clause.push("order_id = ");
        where_clause.push_bind_unseparated(order_id);
    }
    builder.push(" ORDER BY created_at DESC, id DESC");
    trace!("🗃️ Executing query: {}", builder.sql());
    let payments = builder.build_query_as::<Payment>().fetch_all(conn).await?;
    Ok(payments)
}
