use fpg_common::Rupiah;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db_types::OrderId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutRequest {
    pub order_id: OrderId,
    /// Always the order's stored price snapshot
    pub amount: Rupiah,
    pub customer_email: String,
    pub item_id: String,
    pub item_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutToken {
    pub token: String,
    pub redirect_url: Option<String>,
}

#[derive(Debug, Clone, Error)]
pub enum CheckoutError {
    #[error("Payment gateway rejected the checkout: {0}")]
    Rejected(String),
    #[error("Payment gateway unreachable: {0}")]
    Upstream(String),
}

/// The payment gateway's tokenised checkout.
#[allow(async_fn_in_trait)]
pub trait CheckoutProvider {
    async fn create_checkout_token(&self, request: &CheckoutRequest) -> Result<CheckoutToken, CheckoutError>;
}
