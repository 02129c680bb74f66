use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db_types::{OrderStatusType, PaymentStatus};

/// Payment gateway fields recorded on an order when a notification arrives.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayTransaction {
    pub transaction_id: Option<String>,
    pub payment_type: Option<String>,
    pub transaction_status: Option<String>,
    pub transaction_time: Option<String>,
}

/// The audit row to append alongside an order update. The row records the order's status after the update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryNote {
    pub note: String,
    pub changed_by: Option<i64>,
}

/// A set of changes to apply to an order inside [`crate::traits::LedgerStore::update_order_locked`].
///
/// Fields left as `None` are not touched. There is deliberately no way to change the price, SKU, target or email.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderUpdate {
    pub new_status: Option<OrderStatusType>,
    pub sn: Option<String>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub confirmed_by: Option<i64>,
    pub dispatch_started_at: Option<DateTime<Utc>>,
    pub checkout_token: Option<String>,
    pub checkout_url: Option<String>,
    pub gateway: Option<GatewayTransaction>,
    pub history: Option<HistoryNote>,
}

impl OrderUpdate {
    pub fn status(status: OrderStatusType, note: impl Into<String>, changed_by: Option<i64>) -> Self {
        Self { new_status: Some(status), history: Some(HistoryNote { note: note.into(), changed_by }), ..Default::default() }
    }

    pub fn with_sn(mut self, sn: Option<String>) -> Self {
        self.sn = sn;
        self
    }

    pub fn with_gateway(mut self, gateway: GatewayTransaction) -> Self {
        self.gateway = Some(gateway);
        self
    }

    pub fn with_confirmation(mut self, at: DateTime<Utc>, by: Option<i64>) -> Self {
        self.confirmed_at = Some(at);
        self.confirmed_by = by;
        self
    }

    pub fn with_note(mut self, note: impl Into<String>, changed_by: Option<i64>) -> Self {
        self.history = Some(HistoryNote { note: note.into(), changed_by });
        self
    }

    /// True if applying this update would not write any column.
    pub fn is_empty(&self) -> bool {
        self.new_status.is_none() &&
            self.sn.is_none() &&
            self.confirmed_at.is_none() &&
            self.confirmed_by.is_none() &&
            self.dispatch_started_at.is_none() &&
            self.checkout_token.is_none() &&
            self.checkout_url.is_none() &&
            self.gateway.is_none()
    }
}

/// An admin's decision on a manual payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentResolution {
    /// `Verified` or `Rejected`
    pub status: PaymentStatus,
    pub admin_id: i64,
    pub note: Option<String>,
}
