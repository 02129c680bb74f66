//! # SQLite database methods
//!
//! This module contains the "low-level" SQLite database interactions.
//!
//! Every interaction is a plain function that takes a `&mut SqliteConnection`. Callers can pass a pooled connection
//! for one-off reads, or `&mut *tx` to run several calls inside one atomic transaction.
//!
//! SQLite has no row locks. A transaction that intends to change an order therefore *starts* with a write to that
//! order's row (see [`orders::lock_order`]). The write takes the database's reserved lock, so any other writer blocks
//! (up to the busy timeout) until this transaction commits or rolls back, and everything read afterwards is current.
use std::{env, str::FromStr, time::Duration};

use chrono::{DateTime, Utc};
use log::info;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Error as SqlxError,
    SqlitePool,
};

pub mod history;
pub mod idempotency;
pub mod orders;
pub mod payments;
pub mod products;
pub mod usdt_conversions;
pub mod usdt_rates;

const SQLITE_DB_URL: &str = "sqlite://data/feepay.db";
/// How long a writer waits for another writer's transaction before giving up
const BUSY_TIMEOUT: Duration = Duration::from_secs(30);

pub fn db_url() -> String {
    let result = env::var("FPG_DATABASE_URL").unwrap_or_else(|_| {
        info!("🗃️ FPG_DATABASE_URL is not set. Using the default.");
        SQLITE_DB_URL.to_string()
    });
    info!("🗃️ Using database URL: {result}");
    result
}

pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, SqlxError> {
    let options = SqliteConnectOptions::from_str(url)?.busy_timeout(BUSY_TIMEOUT).foreign_keys(true);
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect_with(options).await?;
    Ok(pool)
}

/// Formats a timestamp the way SQLite's `CURRENT_TIMESTAMP` does, so that bound values and column defaults compare
/// correctly as text.
pub(crate) fn sql_timestamp(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d %H:%M:%S").to_string()
}
