use std::fmt::Display;

use chrono::{DateTime, Utc};
use fpg_common::Rupiah;
use serde::{Deserialize, Serialize};

use crate::{
    db_types::{Order, OrderId, OrderStatusType},
    traits::{GatewayTransaction, LedgerError, SupplierStatus, SupplierTransaction},
};

//--------------------------------------   NewOrderRequest   ---------------------------------------------------------
/// A checkout submission. The price is deliberately absent: it always comes from the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrderRequest {
    pub sku: String,
    pub target_number: String,
    pub customer_email: String,
    /// Supplied out of band (e.g. an HTTP header), never in the body
    #[serde(skip)]
    pub idempotency_key: Option<String>,
}

impl NewOrderRequest {
    pub fn new<S: Into<String>>(sku: S, target_number: S, customer_email: S) -> Self {
        Self {
            sku: sku.into(),
            target_number: target_number.into(),
            customer_email: customer_email.into(),
            idempotency_key: None,
        }
    }

    pub fn with_idempotency_key(mut self, key: Option<String>) -> Self {
        self.idempotency_key = key.map(|k| k.trim().to_string()).filter(|k| !k.is_empty());
        self
    }
}

//--------------------------------------   OrderQueryFilter   --------------------------------------------------------
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrderQueryFilter {
    pub order_id: Option<OrderId>,
    pub customer_email: Option<String>,
    pub sku: Option<String>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub status: Option<Vec<OrderStatusType>>,
}

impl OrderQueryFilter {
    pub fn with_order_id(mut self, order_id: OrderId) -> Self {
        self.order_id = Some(order_id);
        self
    }

    pub fn with_customer_email<S: Into<String>>(mut self, email: S) -> Self {
        self.customer_email = Some(email.into());
        self
    }

    pub fn with_sku<S: Into<String>>(mut self, sku: S) -> Self {
        self.sku = Some(sku.into());
        self
    }

    pub fn since<T>(mut self, since: T) -> Result<Self, LedgerError>
    where
        T: TryInto<DateTime<Utc>>,
        T::Error: Display,
    {
        let dt = since.try_into().map_err(|e| LedgerError::ValidationError(e.to_string()))?;
        self.since = Some(dt);
        Ok(self)
    }

    pub fn until<T>(mut self, until: T) -> Result<Self, LedgerError>
    where
        T: TryInto<DateTime<Utc>>,
        T::Error: Display,
    {
        let dt = until.try_into().map_err(|e| LedgerError::ValidationError(e.to_string()))?;
        self.until = Some(dt);
        Ok(self)
    }

    pub fn with_status(mut self, status: OrderStatusType) -> Self {
        self.status.get_or_insert_with(Vec::new).push(status);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.order_id.is_none() &&
            self.customer_email.is_none() &&
            self.sku.is_none() &&
            self.status.as_ref().map(|s| s.is_empty()).unwrap_or(true) &&
            self.since.is_none() &&
            self.until.is_none()
    }
}

impl Display for OrderQueryFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            write!(f, "No filters.")?;
            return Ok(());
        }
        if let Some(order_id) = &self.order_id {
            write!(f, "order_id: {order_id}. ")?;
        }
        if let Some(email) = &self.customer_email {
            write!(f, "email: {email}. ")?;
        }
        if let Some(sku) = &self.sku {
            write!(f, "sku: {sku}. ")?;
        }
        if let Some(since) = &self.since {
            write!(f, "since {since}. ")?;
        }
        if let Some(until) = &self.until {
            write!(f, "until {until}. ")?;
        }
        if let Some(statuses) = &self.status {
            let statuses = statuses.iter().map(|s| s.to_string()).collect::<Vec<String>>().join(",");
            write!(f, "statuses: [{statuses}]. ")?;
        }
        Ok(())
    }
}

//--------------------------------------     OrderChanged     ---------------------------------------------------------
/// The state of an order before and after a locked update. When nothing was written, both sides are equal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderChanged {
    pub old_order: Order,
    pub new_order: Order,
}

impl OrderChanged {
    pub fn new(old_order: Order, new_order: Order) -> Self {
        Self { old_order, new_order }
    }

    pub fn unchanged(order: Order) -> Self {
        Self { old_order: order.clone(), new_order: order }
    }

    pub fn is_changed(&self) -> bool {
        self.old_order != self.new_order
    }

    /// The new status, if the update moved the order to a different state.
    pub fn new_status(&self) -> Option<OrderStatusType> {
        (self.old_order.status != self.new_order.status).then_some(self.new_order.status)
    }
}

//--------------------------------------  PaymentNotification  --------------------------------------------------------
/// The gateway's transaction status, already reduced to what the order flow acts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayVerdict {
    /// Money received and the fraud check passed
    Settle,
    /// Money received but held for fraud review. The order stays pending.
    PendingReview,
    /// Waiting for the customer to pay
    Pending,
    /// Denied, expired, cancelled or failed. Carries the raw gateway status.
    Failed(String),
    /// A status we do not know. Carries the raw gateway status.
    Unknown(String),
}

/// An authenticated payment gateway webhook. Signature checks happen before one of these is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentNotification {
    pub order_id: OrderId,
    pub verdict: GatewayVerdict,
    /// Only used to flag anomalies. It never changes the stored price.
    pub gross_amount: Option<Rupiah>,
    pub gateway: GatewayTransaction,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentOutcome {
    /// The order had already moved on (or the status was unknown). Nothing was written.
    Ignored(Order),
    /// Gateway fields were recorded. The status is unchanged.
    Recorded(Order),
    /// The payment failed before anything was sent to the supplier.
    Failed(Order),
    /// The payment settled and the order was handed to [`crate::OrderFlowApi::dispatch`].
    Settled(DispatchOutcome),
}

impl PaymentOutcome {
    pub fn order(&self) -> &Order {
        match self {
            PaymentOutcome::Ignored(o) | PaymentOutcome::Recorded(o) | PaymentOutcome::Failed(o) => o,
            PaymentOutcome::Settled(d) => d.order(),
        }
    }
}

//--------------------------------------   DispatchOutcome   ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The supplier took the order. The order stays `processing` until the supplier confirms.
    Accepted { order: Order, transaction: SupplierTransaction },
    /// The supplier refused or could not be reached. The order is now `failed`.
    Rejected { order: Order, reason: String },
    /// The order was already dispatched, or is not `processing`. The supplier was not called.
    Skipped(Order),
}

impl DispatchOutcome {
    pub fn order(&self) -> &Order {
        match self {
            DispatchOutcome::Accepted { order, .. } |
            DispatchOutcome::Rejected { order, .. } |
            DispatchOutcome::Skipped(order) => order,
        }
    }

    /// The serial number the supplier returned synchronously, if any.
    pub fn serial_number(&self) -> Option<&str> {
        match self {
            DispatchOutcome::Accepted { transaction, .. } => transaction.sn.as_deref(),
            _ => None,
        }
    }
}

//-------------------------------------- SupplierNotification --------------------------------------------------------
/// An authenticated supplier callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupplierNotification {
    pub ref_id: OrderId,
    pub status: SupplierStatus,
    pub sn: Option<String>,
    pub message: Option<String>,
}

impl From<SupplierTransaction> for SupplierNotification {
    fn from(tx: SupplierTransaction) -> Self {
        let message = Some(tx.message).filter(|m| !m.is_empty());
        Self { ref_id: tx.ref_id, status: tx.status, sn: tx.sn, message }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SupplierOutcome {
    /// The order is terminal (a replay), or was never dispatched. Nothing was written.
    Ignored(Order),
    /// The supplier is still working on it.
    StillPending(Order),
    Succeeded(Order),
    Failed(Order),
}

impl SupplierOutcome {
    pub fn order(&self) -> &Order {
        match self {
            SupplierOutcome::Ignored(o) |
            SupplierOutcome::StillPending(o) |
            SupplierOutcome::Succeeded(o) |
            SupplierOutcome::Failed(o) => o,
        }
    }
}

//--------------------------------------      SyncResult      ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncResult {
    pub order: Order,
    /// What the supplier reported. `None` if the order was not eligible for a status check.
    pub supplier_status: Option<SupplierStatus>,
    /// True if the order's status was changed by this sync
    pub changed: bool,
}
