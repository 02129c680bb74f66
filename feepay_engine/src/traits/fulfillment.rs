use std::fmt::Display;

use fpg_common::Rupiah;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db_types::{Order, OrderId};

/// What the supplier says about a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SupplierStatus {
    /// Delivered. The transaction carries the serial number.
    Success,
    /// The supplier gave up.
    Failed,
    /// Still in progress, or a status we do not recognise. Never acted upon.
    Pending(String),
}

impl Display for SupplierStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SupplierStatus::Success => write!(f, "success"),
            SupplierStatus::Failed => write!(f, "failed"),
            SupplierStatus::Pending(s) => write!(f, "pending ({s})"),
        }
    }
}

/// Maps the supplier's own status words. Anything unrecognised is treated as still pending.
impl From<&str> for SupplierStatus {
    fn from(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "sukses" | "success" => SupplierStatus::Success,
            "gagal" | "failed" => SupplierStatus::Failed,
            _ => SupplierStatus::Pending(s.trim().to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FulfillmentRequest {
    pub sku: String,
    pub target_number: String,
    /// The order reference, used by the supplier to de-duplicate and to correlate its callback
    pub ref_id: OrderId,
}

impl From<&Order> for FulfillmentRequest {
    fn from(order: &Order) -> Self {
        Self { sku: order.sku.clone(), target_number: order.target_number.clone(), ref_id: order.order_id.clone() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupplierTransaction {
    pub ref_id: OrderId,
    pub status: SupplierStatus,
    pub sn: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplierProduct {
    pub sku: String,
    pub name: String,
    pub category: String,
    pub brand: Option<String>,
    pub cost_price: Rupiah,
    /// Both the supplier and the seller have the product switched on
    pub available: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplierBalance {
    pub deposit: Rupiah,
}

#[derive(Debug, Clone, Error)]
pub enum FulfillmentError {
    /// The supplier answered and refused the request.
    #[error("rejected by supplier: {0}")]
    Rejected(String),
    /// No usable answer: transport failure, timeout, non-2xx or an unreadable body.
    #[error("supplier unreachable: {0}")]
    Upstream(String),
}

/// The upstream supplier that delivers digital goods.
///
/// Implementations must never panic and must bound every call with a timeout. Placing an order is not retried by the
/// engine, so an implementation must not retry it either.
#[allow(async_fn_in_trait)]
pub trait FulfillmentProvider {
    async fn place_order(&self, request: &FulfillmentRequest) -> Result<SupplierTransaction, FulfillmentError>;

    async fn check_status(&self, request: &FulfillmentRequest) -> Result<SupplierTransaction, FulfillmentError>;

    async fn price_list(&self, category: Option<String>) -> Result<Vec<SupplierProduct>, FulfillmentError>;

    async fn balance(&self) -> Result<SupplierBalance, FulfillmentError>;
}
