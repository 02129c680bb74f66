use std::fmt::Display;

use chrono::{DateTime, Utc};
use feepay_engine::{
    db_types::{Order, OrderId, OrderStatusType, PaymentStatus, UsdtConversionStatus},
    order_objects::{DispatchOutcome, OrderQueryFilter, SyncResult},
    traits::{CheckoutToken, PaymentResolution},
    usdt_exchange_objects::ConversionResolution,
};
use fpg_common::Rupiah;
use midtrans_tools::MidtransConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailParams {
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutResponse {
    pub order_id: OrderId,
    pub token: String,
    pub redirect_url: Option<String>,
    /// The public key the Snap widget is loaded with.
    pub client_key: String,
    pub is_production: bool,
}

impl CheckoutResponse {
    pub fn new(order_id: OrderId, token: CheckoutToken, gateway: &MidtransConfig) -> Self {
        Self {
            order_id,
            token: token.token,
            redirect_url: token.redirect_url,
            client_key: gateway.client_key.clone(),
            is_production: gateway.is_production,
        }
    }
}

/// The reply to an admin confirmation that the supplier accepted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmationResult {
    pub order_id: OrderId,
    pub status: OrderStatusType,
    pub sn: Option<String>,
    pub message: String,
}

impl ConfirmationResult {
    pub fn from_outcome(outcome: &DispatchOutcome) -> Self {
        let order = outcome.order();
        let message = match outcome {
            DispatchOutcome::Accepted { transaction, .. } => transaction.message.clone(),
            DispatchOutcome::Skipped(_) => "Order was already dispatched".to_string(),
            DispatchOutcome::Rejected { reason, .. } => reason.clone(),
        };
        let sn = outcome.serial_number().map(String::from).or_else(|| order.sn.clone());
        Self { order_id: order.order_id.clone(), status: order.status, sn, message }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncReport {
    pub order: Order,
    pub supplier_status: Option<String>,
    pub changed: bool,
}

impl From<SyncResult> for SyncReport {
    fn from(result: SyncResult) -> Self {
        Self {
            order: result.order,
            supplier_status: result.supplier_status.map(|s| s.to_string()),
            changed: result.changed,
        }
    }
}

/// Query parameters for the admin order search. Only a single status can be given in a query string.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrderSearchParams {
    pub status: Option<OrderStatusType>,
    pub email: Option<String>,
    pub sku: Option<String>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl From<OrderSearchParams> for OrderQueryFilter {
    fn from(params: OrderSearchParams) -> Self {
        let mut query = OrderQueryFilter::default();
        if let Some(status) = params.status {
            query = query.with_status(status);
        }
        if let Some(email) = params.email {
            query = query.with_customer_email(email);
        }
        if let Some(sku) = params.sku {
            query = query.with_sku(sku);
        }
        query.since = params.since;
        query.until = params.until;
        query
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentVerification {
    pub status: PaymentStatus,
    #[serde(default)]
    pub note: Option<String>,
}

impl PaymentVerification {
    pub fn into_resolution(self, admin_id: i64) -> PaymentResolution {
        PaymentResolution { status: self.status, admin_id, note: self.note }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsdtRateUpdate {
    pub rate: Rupiah,
    #[serde(default)]
    pub note: Option<String>,
}

/// An admin's decision on a USDT conversion: `approved` or `rejected`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionReview {
    pub status: UsdtConversionStatus,
    #[serde(default, alias = "admin_note")]
    pub note: Option<String>,
}

impl ConversionReview {
    pub fn into_resolution(self, admin_id: i64) -> ConversionResolution {
        ConversionResolution { status: self.status, admin_id, note: self.note }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HistoryParams {
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogSyncParams {
    #[serde(default)]
    pub category: Option<String>,
}
