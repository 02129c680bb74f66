use log::{debug, trace};
use sqlx::{sqlite::SqliteRow, FromRow, QueryBuilder, SqliteConnection};

use super::sql_timestamp;
use crate::{
    db_types::{NewOrder, Order, OrderId},
    order_objects::OrderQueryFilter,
    traits::{LedgerError, OrderUpdate},
};

/// Inserts a new order using the given connection. This is not atomic on its own; call it inside a transaction
/// together with the initial history row.
pub async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Order, LedgerError> {
    let order: Order = sqlx::query_as(
        r#"
            INSERT INTO orders (
                order_id,
                sku,
                product_name,
                target_number,
                customer_email,
                total_price,
                status
            ) VALUES ($1, $2, $3, $4, $5, $6, 'pending')
            RETURNING *;
        "#,
    )
    .bind(order.order_id.as_str())
    .bind(order.sku)
    .bind(order.product_name)
    .bind(order.target_number)
    .bind(order.customer_email)
    .bind(order.total_price.value())
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Order [{}] inserted with id {}", order.order_id, order.id);
    Ok(order)
}

/// Returns the order with the given `order_id`, without locking.
pub async fn fetch_order_by_order_id(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order =
        sqlx::query_as("SELECT * FROM orders WHERE order_id = $1").bind(order_id.as_str()).fetch_optional(conn).await?;
    Ok(order)
}

pub async fn fetch_order_by_id(id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(order)
}

/// Takes the write lock on behalf of the current transaction and returns the order as it is now.
///
/// This must be the first statement of any transaction that changes the order. It writes `updated_at` back to
/// itself, which changes nothing but forces SQLite to take its write lock before the order is read.
pub async fn lock_order(order_id: &OrderId, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("UPDATE orders SET updated_at = updated_at WHERE order_id = $1 RETURNING *")
        .bind(order_id.as_str())
        .fetch_optional(conn)
        .await?;
    trace!("🗃️ Lock taken on order {order_id}");
    Ok(order)
}

/// Same as [`lock_order`], by internal id.
pub async fn lock_order_by_id(id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("UPDATE orders SET updated_at = updated_at WHERE id = $1 RETURNING *")
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(order)
}

/// Fetches orders according to the criteria in the `OrderQueryFilter`, oldest first.
pub async fn search_orders(query: OrderQueryFilter, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let mut builder = QueryBuilder::new("SELECT * FROM orders ");
    if !query.is_empty() {
        builder.push("WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if let Some(order_id) = query.order_id {
        where_clause.push("order_id = ");
        where_clause.push_bind_unseparated(order_id.to_string());
    }
    if let Some(email) = query.customer_email {
        where_clause.push("customer_email = ");
        where_clause.push_bind_unseparated(email);
        where_clause.push_unseparated(" COLLATE NOCASE");
    }
    if let Some(sku) = query.sku {
        where_clause.push("sku = ");
        where_clause.push_bind_unseparated(sku);
    }
    if let Some(statuses) = query.status.filter(|s| !s.is_empty()) {
        where_clause.push("status IN (");
        for (i, status) in statuses.iter().enumerate() {
            if i > 0 {
                where_clause.push_unseparated(", ");
            }
            where_clause.push_bind_unseparated(status.to_string());
        }
        where_clause.push_unseparated(")");
    }
    if let Some(since) = query.since {
        where_clause.push("created_at >= ");
        where_clause.push_bind_unseparated(sql_timestamp(&since));
    }
    if let Some(until) = query.until {
        where_clause.push("created_at <= ");
        where_clause.push_bind_unseparated(sql_timestamp(&until));
    }
    builder.push(" ORDER BY created_at ASC, id ASC");

    trace!("🗃️ Executing query: {}", builder.sql());
    let orders = builder.build_query_as::<Order>().fetch_all(conn).await?;
    trace!("🗃️ Result of search_orders: {:?}", orders.len());
    Ok(orders)
}

/// Applies the non-status columns of `update`, plus the status if one is given. Status legality is the caller's
/// business; this function only writes.
pub(crate) async fn update_order(
    id: i64,
    update: &OrderUpdate,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, LedgerError> {
    let mut builder = QueryBuilder::new("UPDATE orders SET updated_at = CURRENT_TIMESTAMP");
    if let Some(status) = update.new_status {
        builder.push(", status = ");
        builder.push_bind(status.to_string());
    }
    if let Some(sn) = &update.sn {
        builder.push(", sn = ");
        builder.push_bind(sn.clone());
    }
    if let Some(at) = &update.confirmed_at {
        builder.push(", confirmed_at = ");
        builder.push_bind(sql_timestamp(at));
    }
    if let Some(admin) = update.confirmed_by {
        builder.push(", confirmed_by = ");
        builder.push_bind(admin);
    }
    if let Some(at) = &update.dispatch_started_at {
        builder.push(", dispatch_started_at = ");
        builder.push_bind(sql_timestamp(at));
    }
    if let Some(token) = &update.checkout_token {
        builder.push(", checkout_token = ");
        builder.push_bind(token.clone());
    }
    if let Some(url) = &update.checkout_url {
        builder.push(", checkout_url = ");
        builder.push_bind(url.clone());
    }
    if let Some(gateway) = &update.gateway {
        // Only overwrite what the gateway actually sent
        let fields = [
            ("gateway_transaction_id", &gateway.transaction_id),
            ("gateway_payment_type", &gateway.payment_type),
            ("gateway_transaction_status", &gateway.transaction_status),
            ("gateway_transaction_time", &gateway.transaction_time),
        ];
        for (column, value) in fields {
            if let Some(value) = value {
                builder.push(format!(", {column} = "));
                builder.push_bind(value.clone());
            }
        }
    }
    builder.push(" WHERE id = ");
    builder.push_bind(id);
    builder.push(" RETURNING *");
    trace!("🗃️ Executing query: {}", builder.sql());
    let res = builder.build().fetch_optional(conn).await?.map(|row: SqliteRow| Order::from_row(&row)).transpose()?;
    Ok(res)
}

pub(crate) async fn link_payment(order_id: i64, payment_id: i64, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE orders SET payment_id = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2")
        .bind(payment_id)
        .bind(order_id)
        .execute(conn)
        .await?;
    Ok(())
}
