use serde::{Deserialize, Serialize};

use crate::{
    db_types::{Order, OrderId, Payment, PaymentStatus, PaymentType},
    order_objects::DispatchOutcome,
};

/// A customer's manual-transfer submission. The amount is never taken from here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualPaymentRequest {
    pub order_id: OrderId,
    pub payment_type: PaymentType,
    /// Reference to the uploaded transfer receipt
    pub proof_reference: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PaymentQueryFilter {
    pub status: Option<PaymentStatus>,
    pub payment_type: Option<PaymentType>,
    /// Internal order id
    pub order_id: Option<i64>,
}

impl PaymentQueryFilter {
    pub fn with_status(mut self, status: PaymentStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_payment_type(mut self, payment_type: PaymentType) -> Self {
        self.payment_type = Some(payment_type);
        self
    }

    pub fn with_order_id(mut self, order_id: i64) -> Self {
        self.order_id = Some(order_id);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.payment_type.is_none() && self.order_id.is_none()
    }
}

/// The result of an admin verifying or rejecting a manual payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentReview {
    pub payment: Payment,
    pub order: Order,
    /// Set when the payment was verified and the order was sent on to the supplier
    pub dispatch: Option<DispatchOutcome>,
}
