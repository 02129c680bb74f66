use log::trace;
use sqlx::SqliteConnection;

use crate::db_types::{NewProduct, Product};

pub async fn fetch_product(sku: &str, conn: &mut SqliteConnection) -> Result<Option<Product>, sqlx::Error> {
    let product = sqlx::query_as("SELECT * FROM products WHERE sku = $1").bind(sku).fetch_optional(conn).await?;
    Ok(product)
}

pub async fn fetch_active_product(sku: &str, conn: &mut SqliteConnection) -> Result<Option<Product>, sqlx::Error> {
    let product = sqlx::query_as("SELECT * FROM products WHERE sku = $1 AND is_active = TRUE")
        .bind(sku)
        .fetch_optional(conn)
        .await?;
    Ok(product)
}

pub async fn upsert_product(product: NewProduct, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    trace!("🗃️ Upserting product {}", product.sku);
    sqlx::query(
        r#"
            INSERT INTO products (sku, name, category, brand, cost_price, selling_price, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (sku) DO UPDATE SET
                name = excluded.name,
                category = excluded.category,
                brand = excluded.brand,
                cost_price = excluded.cost_price,
                selling_price = excluded.selling_price,
                is_active = excluded.is_active,
                updated_at = CURRENT_TIMESTAMP;
        "#,
    )
    .bind(product.sku)
    .bind(product.name)
    .bind(product.category)
    .bind(product.brand)
    .bind(product.cost_price.value())
    .bind(product.selling_price.value())
    .bind(product.is_active)
    .execute(conn)
    .await?;
    Ok(())
}

/// Deactivates every active product whose SKU is not in `keep`. Returns the number of products switched off.
pub async fn deactivate_all_except(keep: &[String], conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
    let mut builder =
        sqlx::QueryBuilder::new("UPDATE products SET is_active = FALSE, updated_at = CURRENT_TIMESTAMP WHERE is_active");
    if !keep.is_empty() {
        builder.push(" AND sku NOT IN (");
        let mut list = builder.separated(", ");
        for sku in keep {
            list.push_bind(sku.clone());
        }
        list.push_unseparated(")");
    }
    let result = builder.build().execute(conn).await?;
    Ok(result.rows_affected())
}
