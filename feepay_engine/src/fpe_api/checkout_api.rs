use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{OrderId, OrderStatusType},
    traits::{CheckoutProvider, CheckoutRequest, CheckoutToken, LedgerError, LedgerStore, OrderUpdate},
};

/// Issues payment gateway checkout tokens for pending orders.
///
/// The amount sent to the gateway is always the order's stored price. A token is only requested once per order;
/// later calls return the stored one.
pub struct CheckoutApi<B, C> {
    db: B,
    gateway: C,
}

impl<B, C> Debug for CheckoutApi<B, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CheckoutApi")
    }
}

impl<B, C> CheckoutApi<B, C>
where
    B: LedgerStore,
    C: CheckoutProvider,
{
    pub fn new(db: B, gateway: C) -> Self {
        Self { db, gateway }
    }

    /// `customer_email` must match the order (case-insensitive). A mismatch is reported as "not found" so that order
    /// references cannot be enumerated.
    pub async fn checkout(&self, order_id: &OrderId, customer_email: &str) -> Result<CheckoutToken, LedgerError> {
        let order = self
            .db
            .fetch_order_by_order_id(order_id)
            .await?
            .filter(|o| o.customer_email.eq_ignore_ascii_case(customer_email.trim()))
            .ok_or_else(|| LedgerError::OrderNotFound(order_id.clone()))?;
        if order.status != OrderStatusType::Pending {
            return Err(LedgerError::OrderNotPending(order_id.clone(), order.status));
        }
        if let Some(token) = order.checkout_token.clone() {
            debug!("💳️ Order {order_id} already has a checkout token");
            return Ok(CheckoutToken { token, redirect_url: order.checkout_url });
        }
        let request = CheckoutRequest {
            order_id: order.order_id.clone(),
            amount: order.total_price,
            customer_email: order.customer_email.clone(),
            item_id: order.sku.clone(),
            item_name: order.product_name.clone(),
        };
        let token = self.gateway.create_checkout_token(&request).await.map_err(|e| {
            error!("💳️ Could not create a checkout token for order {order_id}: {e}");
            LedgerError::from(e)
        })?;
        let issued = token.clone();
        let changed = self
            .db
            .update_order_locked(order_id, move |order| {
                // A concurrent request may have stored its token first. Keep that one.
                if order.checkout_token.is_some() {
                    return Ok(None);
                }
                Ok(Some(OrderUpdate {
                    checkout_token: Some(issued.token),
                    checkout_url: issued.redirect_url,
                    ..Default::default()
                }))
            })
            .await?;
        let order = changed.new_order;
        info!("💳️ Checkout token issued for order {order_id} ({})", order.total_price);
        match order.checkout_token {
            Some(token) => Ok(CheckoutToken { token, redirect_url: order.checkout_url }),
            None => Ok(token),
        }
    }
}
