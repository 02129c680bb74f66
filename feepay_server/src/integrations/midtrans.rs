//! Plugs the Midtrans client into the engine's [`CheckoutProvider`] seam, and turns Midtrans notifications into
//! [`PaymentNotification`]s.
use feepay_engine::{
    db_types::OrderId,
    order_objects::{GatewayVerdict, PaymentNotification},
    traits::{CheckoutError, CheckoutProvider, CheckoutRequest, CheckoutToken, GatewayTransaction},
};
use fpg_common::Rupiah;
use log::*;
use midtrans_tools::{MidtransApi, MidtransApiError, Notification, PaymentVerdict};

#[derive(Clone)]
pub struct MidtransCheckout {
    api: MidtransApi,
}

impl MidtransCheckout {
    pub fn new(api: MidtransApi) -> Self {
        Self { api }
    }
}

impl CheckoutProvider for MidtransCheckout {
    async fn create_checkout_token(&self, request: &CheckoutRequest) -> Result<CheckoutToken, CheckoutError> {
        let token = self
            .api
            .create_snap_token(
                request.order_id.as_str(),
                request.amount,
                &request.customer_email,
                &request.item_id,
                &request.item_name,
            )
            .await
            .map_err(checkout_error)?;
        Ok(CheckoutToken { token: token.token, redirect_url: token.redirect_url })
    }
}

pub fn checkout_error(e: MidtransApiError) -> CheckoutError {
    match e {
        MidtransApiError::QueryError { status, message } if (400..500).contains(&status) => {
            CheckoutError::Rejected(format!("HTTP {status}. {message}"))
        },
        MidtransApiError::InvalidAmount(_) => CheckoutError::Rejected(e.to_string()),
        e => CheckoutError::Upstream(e.to_string()),
    }
}

/// Converts an (already authenticated) Midtrans notification.
pub fn payment_notification(notification: &Notification) -> PaymentNotification {
    let verdict = match notification.verdict() {
        PaymentVerdict::Settle => GatewayVerdict::Settle,
        PaymentVerdict::PendingReview => GatewayVerdict::PendingReview,
        PaymentVerdict::Pending => GatewayVerdict::Pending,
        PaymentVerdict::Failed(s) => GatewayVerdict::Failed(s),
        PaymentVerdict::Unknown(s) => GatewayVerdict::Unknown(s),
    };
    let gross_amount = notification
        .gross_amount
        .parse::<Rupiah>()
        .map_err(|e| warn!("💳️ Notification for {} has an unreadable gross_amount. {e}", notification.order_id))
        .ok();
    PaymentNotification {
        order_id: OrderId::from(notification.order_id.as_str()),
        verdict,
        gross_amount,
        gateway: GatewayTransaction {
            transaction_id: notification.transaction_id.clone(),
            payment_type: notification.payment_type.clone(),
            transaction_status: Some(notification.transaction_status.clone()),
            transaction_time: notification.transaction_time.clone(),
        },
    }
}
