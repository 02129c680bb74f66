//! `SqliteDatabase` is the concrete FeePay ledger backend.
//!
//! It implements every trait in [`crate::traits`] that needs storage: [`LedgerStore`], [`Catalog`] and
//! [`UsdtRates`] and [`UsdtConversions`].
use std::{fmt::Debug, time::Duration};

use log::*;
use sqlx::{migrate::MigrateError, SqliteConnection, SqlitePool};

use super::db::{db_url, history, idempotency, new_pool, orders, payments, products, usdt_conversions, usdt_rates};
use crate::{
    db_types::{
        NewOrder,
        NewPayment,
        NewProduct,
        NewUsdtConversion,
        NewUsdtRate,
        Order,
        OrderId,
        OrderStatusType,
        Payment,
        PaymentStatus,
        Product,
        StatusHistory,
        UsdtConversion,
        UsdtConversionStatus,
        UsdtRate,
    },
    order_objects::{OrderChanged, OrderQueryFilter},
    payment_objects::PaymentQueryFilter,
    traits::{
        Catalog,
        LedgerError,
        LedgerStore,
        OrderUpdate,
        PaymentResolution,
        UsdtConversions,
        UsdtRateError,
        UsdtRates,
    },
    usdt_exchange_objects::{ConversionQueryFilter, ConversionResolution},
};

const INITIAL_HISTORY_NOTE: &str = "Order created";

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

/// Checks the status move against the transition table, writes the update and appends the history row. Must run
/// inside the transaction that locked `order`.
async fn apply_update(order: &Order, update: &OrderUpdate, conn: &mut SqliteConnection) -> Result<Order, LedgerError> {
    if let Some(next) = update.new_status {
        order.status.transition(next)?;
    }
    let new_order = if update.is_empty() {
        order.clone()
    } else {
        orders::update_order(order.id, update, conn).await?.ok_or_else(|| LedgerError::OrderNotFound(order.order_id.clone()))?
    };
    if let Some(note) = &update.history {
        history::append(order.id, new_order.status, &note.note, note.changed_by, conn).await?;
        trace!("🗃️ History row '{}' appended for order {}", note.note, order.order_id);
    }
    if order.status != new_order.status {
        debug!("🗃️ Order {} moved from {} to {}", order.order_id, order.status, new_order.status);
    }
    Ok(new_order)
}

impl LedgerStore for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn insert_order(&self, order: NewOrder, idempotency_window: Duration) -> Result<(Order, bool), LedgerError> {
        let mut tx = self.pool.begin().await?;
        let key = order.idempotency_key.clone();
        if let Some(key) = &key {
            // The expiry delete is a write, so it also queues up concurrent submissions of the same key here
            idempotency::expire_key(key, idempotency_window, &mut tx).await?;
            if let Some(existing_id) = idempotency::fetch_order_id(key, &mut tx).await? {
                let existing = orders::fetch_order_by_order_id(&existing_id, &mut tx)
                    .await?
                    .ok_or_else(|| LedgerError::OrderNotFound(existing_id.clone()))?;
                tx.rollback().await?;
                debug!("🗃️ Idempotency key {key} already belongs to order {existing_id}. Returning it.");
                return Ok((existing, false));
            }
        }
        let order = orders::insert_order(order, &mut tx).await?;
        history::append(order.id, OrderStatusType::Pending, INITIAL_HISTORY_NOTE, None, &mut tx).await?;
        if let Some(key) = &key {
            idempotency::bind_key(key, &order.order_id, &mut tx).await?;
        }
        tx.commit().await?;
        debug!("🗃️ Order {} saved with price {}", order.order_id, order.total_price);
        Ok((order, true))
    }

    async fn fetch_order_by_order_id(&self, order_id: &OrderId) -> Result<Option<Order>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_order_id(order_id, &mut conn).await?;
        Ok(order)
    }

    async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::search_orders(query, &mut conn).await?;
        Ok(orders)
    }

    async fn fetch_status_history(&self, order_id: &OrderId) -> Result<Vec<StatusHistory>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_order_id(order_id, &mut conn)
            .await?
            .ok_or_else(|| LedgerError::OrderNotFound(order_id.clone()))?;
        let rows = history::fetch_for_order(order.id, &mut conn).await?;
        Ok(rows)
    }

    async fn update_order_locked<F>(&self, order_id: &OrderId, decide: F) -> Result<OrderChanged, LedgerError>
    where F: FnOnce(&Order) -> Result<Option<OrderUpdate>, LedgerError> + Send {
        let mut tx = self.pool.begin().await?;
        let order =
            orders::lock_order(order_id, &mut tx).await?.ok_or_else(|| LedgerError::OrderNotFound(order_id.clone()))?;
        // An error from `decide` drops `tx`, which rolls it back
        let update = match decide(&order)? {
            Some(update) if !update.is_empty() || update.history.is_some() => update,
            _ => {
                tx.rollback().await?;
                trace!("🗃️ Nothing to change on order {order_id}");
                return Ok(OrderChanged::unchanged(order));
            },
        };
        let new_order = apply_update(&order, &update, &mut tx).await?;
        tx.commit().await?;
        Ok(OrderChanged::new(order, new_order))
    }

    async fn insert_payment_for_order(
        &self,
        order_id: &OrderId,
        payment: NewPayment,
    ) -> Result<(Payment, Order), LedgerError> {
        let mut tx = self.pool.begin().await?;
        let order =
            orders::lock_order(order_id, &mut tx).await?.ok_or_else(|| LedgerError::OrderNotFound(order_id.clone()))?;
        if order.payment_id.is_some() || payments::fetch_payment_for_order(order.id, &mut tx).await?.is_some() {
            return Err(LedgerError::OrderAlreadyHasPayment(order_id.clone()));
        }
        if order.status != OrderStatusType::Pending {
            return Err(LedgerError::OrderNotPending(order_id.clone(), order.status));
        }
        let payment = payments::insert_payment(order.id, order.total_price, payment, &mut tx).await?;
        orders::link_payment(order.id, payment.id, &mut tx).await?;
        let order = orders::fetch_order_by_id(order.id, &mut tx)
            .await?
            .ok_or_else(|| LedgerError::OrderNotFound(order_id.clone()))?;
        tx.commit().await?;
        debug!("🗃️ Payment {} of {} recorded against order {order_id}", payment.payment_id, payment.amount);
        Ok((payment, order))
    }

    async fn fetch_payment(&self, payment_id: &str) -> Result<Option<Payment>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let payment = payments::fetch_payment(payment_id, &mut conn).await?;
        Ok(payment)
    }

    async fn search_payments(&self, query: PaymentQueryFilter) -> Result<Vec<Payment>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let payments = payments::search_payments(query, &mut conn).await?;
        Ok(payments)
    }

    async fn resolve_payment_locked<F>(
        &self,
        payment_id: &str,
        resolution: PaymentResolution,
        decide: F,
    ) -> Result<(Payment, OrderChanged), LedgerError>
    where
        F: FnOnce(&Payment, &Order) -> Result<Option<OrderUpdate>, LedgerError> + Send,
    {
        if !matches!(resolution.status, PaymentStatus::Verified | PaymentStatus::Rejected) {
            return Err(LedgerError::ValidationError("A payment can only be verified or rejected".into()));
        }
        let mut tx = self.pool.begin().await?;
        let payment = payments::lock_payment(payment_id, &mut tx)
            .await?
            .ok_or_else(|| LedgerError::PaymentNotFound(payment_id.to_string()))?;
        if payment.status != PaymentStatus::Pending {
            return Err(LedgerError::PaymentAlreadyResolved(payment_id.to_string(), payment.status));
        }
        let order = orders::lock_order_by_id(payment.order_id, &mut tx).await?.ok_or_else(|| {
            error!("🗃️ Payment {payment_id} points at order #{} which does not exist", payment.order_id);
            LedgerError::DatabaseError(format!("Payment {payment_id} is not linked to an order"))
        })?;
        let update = decide(&payment, &order)?;
        let payment = payments::resolve_payment(
            payment.id,
            resolution.status,
            resolution.admin_id,
            resolution.note.as_deref(),
            &mut tx,
        )
        .await?;
        let changed = match update {
            Some(update) => OrderChanged::new(order.clone(), apply_update(&order, &update, &mut tx).await?),
            None => OrderChanged::unchanged(order),
        };
        tx.commit().await?;
        debug!("🗃️ Payment {payment_id} is now {}", payment.status);
        Ok((payment, changed))
    }
}

impl Catalog for SqliteDatabase {
    async fn fetch_active_product(&self, sku: &str) -> Result<Option<Product>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let product = products::fetch_active_product(sku, &mut conn).await?;
        Ok(product)
    }

    async fn fetch_product(&self, sku: &str) -> Result<Option<Product>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let product = products::fetch_product(sku, &mut conn).await?;
        Ok(product)
    }

    async fn upsert_products(&self, items: Vec<NewProduct>) -> Result<usize, LedgerError> {
        let mut tx = self.pool.begin().await?;
        let count = items.len();
        for product in items {
            products::upsert_product(product, &mut tx).await?;
        }
        tx.commit().await?;
        debug!("🗃️ {count} products upserted");
        Ok(count)
    }

    async fn deactivate_products_except(&self, keep: Vec<String>) -> Result<u64, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let count = products::deactivate_all_except(&keep, &mut conn).await?;
        debug!("🗃️ {count} products deactivated");
        Ok(count)
    }
}

impl UsdtRates for SqliteDatabase {
    async fn fetch_current_rate(&self) -> Result<UsdtRate, UsdtRateError> {
        let mut conn = self.pool.acquire().await?;
        usdt_rates::fetch_last_rate(&mut conn).await
    }

    async fn insert_rate(&self, rate: NewUsdtRate) -> Result<UsdtRate, UsdtRateError> {
        let mut conn = self.pool.acquire().await?;
        let rate = usdt_rates::insert_rate(rate, &mut conn).await?;
        debug!("🗃️ USDT rate #{} set to {}", rate.id, rate.rate);
        Ok(rate)
    }

    async fn fetch_rate_history(&self, limit: i64) -> Result<Vec<UsdtRate>, UsdtRateError> {
        let mut conn = self.pool.acquire().await?;
        usdt_rates::fetch_rate_history(limit, &mut conn).await
    }
}

impl UsdtConversions for SqliteDatabase {
    async fn insert_conversion(&self, conversion: NewUsdtConversion) -> Result<UsdtConversion, LedgerError> {
        let mut tx = self.pool.begin().await?;
        let rate = usdt_rates::fetch_last_rate(&mut tx).await?;
        let idr_received = conversion.amount.to_rupiah(rate.rate).filter(|idr| idr.is_positive()).ok_or_else(|| {
            LedgerError::ValidationError(format!("{} cannot be converted at {}", conversion.amount, rate.rate))
        })?;
        let conversion = usdt_conversions::insert_conversion(conversion, rate.id, rate.rate, idr_received, &mut tx).await?;
        tx.commit().await?;
        debug!(
            "🗃️ USDT conversion {} of {} priced at {} (rate #{}) for {}",
            conversion.trx_id, conversion.amount, conversion.rate, conversion.rate_id, conversion.idr_received
        );
        Ok(conversion)
    }

    async fn fetch_conversion(&self, trx_id: &str) -> Result<Option<UsdtConversion>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let conversion = usdt_conversions::fetch_conversion(trx_id, &mut conn).await?;
        Ok(conversion)
    }

    async fn search_conversions(&self, query: ConversionQueryFilter) -> Result<Vec<UsdtConversion>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let conversions = usdt_conversions::search_conversions(query, &mut conn).await?;
        Ok(conversions)
    }

    async fn resolve_conversion_locked(
        &self,
        trx_id: &str,
        resolution: ConversionResolution,
    ) -> Result<UsdtConversion, LedgerError> {
        if !matches!(resolution.status, UsdtConversionStatus::Approved | UsdtConversionStatus::Rejected) {
            return Err(LedgerError::ValidationError("A USDT conversion can only be approved or rejected".into()));
        }
        let mut tx = self.pool.begin().await?;
        let conversion = usdt_conversions::lock_conversion(trx_id, &mut tx)
            .await?
            .ok_or_else(|| LedgerError::ConversionNotFound(trx_id.to_string()))?;
        if conversion.status != UsdtConversionStatus::Pending {
            return Err(LedgerError::ConversionAlreadyResolved(trx_id.to_string(), conversion.status));
        }
        let conversion = usdt_conversions::resolve_conversion(
            conversion.id,
            resolution.status,
            resolution.admin_id,
            resolution.note.as_deref(),
            &mut tx,
        )
        .await?;
        tx.commit().await?;
        debug!("🗃️ USDT conversion {trx_id} is now {}", conversion.status);
        Ok(conversion)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object, using `FPG_DATABASE_URL` or the default location.
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("🗃️ Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Brings the schema up to date.
    pub async fn migrate(&self) -> Result<(), MigrateError> {
        sqlx::migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
