use fpg_common::Rupiah;
use log::trace;
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    db_types::{NewUsdtConversion, UsdtConversion, UsdtConversionStatus},
    usdt_exchange_objects::ConversionQueryFilter,
};

/// Inserts a `pending` conversion priced with the given rate row. Call inside the transaction that read the rate.
pub async fn insert_conversion(
    conversion: NewUsdtConversion,
    rate_id: i64,
    rate: Rupiah,
    idr_received: Rupiah,
    conn: &mut SqliteConnection,
) -> Result<UsdtConversion, sqlx::Error> {
    let conversion = sqlx::query_as(
        r#"
            INSERT INTO usdt_conversions (
                trx_id,
                amount,
                network,
                rate_id,
                rate,
                idr_received,
                bank_name,
                account_number,
                account_name,
                proof_reference,
                customer_email,
                customer_phone,
                status
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, 'pending')
            RETURNING *;
        "#,
    )
    .bind(conversion.trx_id)
    .bind(conversion.amount.value())
    .bind(conversion.network.to_string())
    .bind(rate_id)
    .bind(rate.value())
    .bind(idr_received.value())
    .bind(conversion.bank_details.bank_name)
    .bind(conversion.bank_details.account_number)
    .bind(conversion.bank_details.account_name)
    .bind(conversion.proof_reference)
    .bind(conversion.customer_email)
    .bind(conversion.customer_phone)
    .fetch_one(conn)
    .await?;
    Ok(conversion)
}

pub async fn fetch_conversion(trx_id: &str, conn: &mut SqliteConnection) -> Result<Option<UsdtConversion>, sqlx::Error> {
    let conversion =
        sqlx::query_as("SELECT * FROM usdt_conversions WHERE trx_id = $1").bind(trx_id).fetch_optional(conn).await?;
    Ok(conversion)
}

/// Takes the write lock (see [`super::orders::lock_order`]) and returns the conversion as it is now.
pub async fn lock_conversion(trx_id: &str, conn: &mut SqliteConnection) -> Result<Option<UsdtConversion>, sqlx::Error> {
    let conversion = sqlx::query_as("UPDATE usdt_conversions SET updated_at = updated_at WHERE trx_id = $1 RETURNING *")
        .bind(trx_id)
        .fetch_optional(conn)
        .await?;
    Ok(conversion)
}

pub async fn resolve_conversion(
    id: i64,
    status: UsdtConversionStatus,
    admin_id: i64,
    note: Option<&str>,
    conn: &mut SqliteConnection,
) -> Result<UsdtConversion, sqlx::Error> {
    let conversion = sqlx::query_as(
        r#"
            UPDATE usdt_conversions SET
                status = $1,
                approved_by = $2,
                admin_note = $3,
                approved_at = CURRENT_TIMESTAMP,
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
    Ok(conversion)
}

/// Newest first.
pub async fn search_conversions(
    query: ConversionQueryFilter,
    conn: &mut SqliteConnection,
) -> Result<Vec<UsdtConversion>, sqlx::Error> {
    let mut builder = QueryBuilder::new("SELECT * FROM usdt_conversions ");
    if !query.is_empty() {
        builder.push("WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if let Some(status) = query.status {
        where_clause.push("status = ");
        where_clause.push_bind_unseparated(status.to_string());
    }
    if let Some(network) = query.network {
        where_clause.push("network = ");
        where_clause.push_bind_unseparated(network.to_string());
    }
    if let Some(email) = query.customer_email {
        where_clause.push("LOWER(customer_email) = ");
        where_clause.push_bind_unseparated(email.trim().to_lowercase());
    }
    builder.push(" ORDER BY created_at DESC, id DESC");
    trace!("🗃️ Executing query: {}", builder.sql());
    let conversions = builder.build_query_as::<UsdtConversion>().fetch_all(conn).await?;
    Ok(conversions)
}
