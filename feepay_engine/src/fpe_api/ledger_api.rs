use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{Order, OrderId, Payment, StatusHistory},
    order_objects::OrderQueryFilter,
    payment_objects::PaymentQueryFilter,
    traits::{LedgerError, LedgerStore},
};

/// Read-only access to orders, payments and the audit trail. Nothing here takes a lock.
pub struct LedgerApi<B> {
    db: B,
}

impl<B: Debug> Debug for LedgerApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "LedgerApi ({:?})", self.db)
    }
}

impl<B> LedgerApi<B>
where B: LedgerStore
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub async fn order(&self, order_id: &OrderId) -> Result<Option<Order>, LedgerError> {
        self.db.fetch_order_by_order_id(order_id).await
    }

    /// The order, but only if `email` matches the one it was placed with (case-insensitive).
    pub async fn order_for_customer(&self, order_id: &OrderId, email: &str) -> Result<Option<Order>, LedgerError> {
        let order = self.db.fetch_order_by_order_id(order_id).await?;
        let result = order.filter(|o| o.customer_email.eq_ignore_ascii_case(email.trim()));
        if result.is_none() {
            debug!("🗃️ Order lookup for {order_id} did not match the supplied email");
        }
        Ok(result)
    }

    pub async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, LedgerError> {
        trace!("🗃️ Searching orders. {query}");
        self.db.search_orders(query).await
    }

    pub async fn status_history(&self, order_id: &OrderId) -> Result<Vec<StatusHistory>, LedgerError> {
        self.db.fetch_status_history(order_id).await
    }

    pub async fn payment(&self, payment_id: &str) -> Result<Option<Payment>, LedgerError> {
        self.db.fetch_payment(payment_id).await
    }

    pub async fn search_payments(&self, query: PaymentQueryFilter) -> Result<Vec<Payment>, LedgerError> {
        self.db.search_payments(query).await
    }
}
