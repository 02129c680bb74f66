//! Wires the customer emails and Telegram alerts onto the engine's order and USDT conversion events.
//!
//! The engine only publishes an event once the ledger transaction has committed, and every hook runs on its own task.
//! A failed send is logged and forgotten; it can never touch the order.
use feepay_engine::events::{EventHandlers, EventHooks, OrderFailedEvent, OrderSucceededEvent, UsdtConversionResolvedEvent};
use log::*;
use thiserror::Error;

use crate::integrations::{
    mail::{order_failed_email, order_success_email, usdt_conversion_email, MailRelay},
    telegram::{order_failed_alert, order_success_alert, usdt_conversion_alert, TelegramNotifier},
};

pub const NOTIFICATION_BUFFER_SIZE: usize = 50;

#[derive(Debug, Clone, Error)]
pub enum NotificationError {
    #[error("Could not initialize notification client: {0}")]
    Initialization(String),
    #[error("Notification request failed: {0}")]
    RequestError(String),
    #[error("Notification was refused with HTTP {status}. {message}")]
    Rejected { status: u16, message: String },
}

#[derive(Clone, Default)]
pub struct Notifiers {
    pub mail: Option<MailRelay>,
    pub telegram: Option<TelegramNotifier>,
}

impl Notifiers {
    pub fn new(mail: Option<MailRelay>, telegram: Option<TelegramNotifier>) -> Self {
        Self { mail, telegram }
    }

    pub async fn order_succeeded(&self, event: OrderSucceededEvent) {
        let order_id = event.order.order_id.clone();
        if let Some(mail) = &self.mail {
            let message = order_success_email(mail.sender(), &event);
            match mail.send(&message).await {
                Ok(()) => info!("📬️ Success email for order {order_id} sent to {}", message.to),
                Err(e) => error!("📬️ Could not send the success email for order {order_id}. {e}"),
            }
        }
        if let Some(telegram) = &self.telegram {
            if let Err(e) = telegram.send_message(&order_success_alert(&event)).await {
                error!("📬️ Could not send the Telegram alert for order {order_id}. {e}");
            }
        }
    }

    pub async fn order_failed(&self, event: OrderFailedEvent) {
        let order_id = event.order.order_id.clone();
        if let Some(mail) = &self.mail {
            let message = order_failed_email(mail.sender(), &event);
            match mail.send(&message).await {
                Ok(()) => info!("📬️ Failure email for order {order_id} sent to {}", message.to),
                Err(e) => error!("📬️ Could not send the failure email for order {order_id}. {e}"),
            }
        }
        if let Some(telegram) = &self.telegram {
            if let Err(e) = telegram.send_message(&order_failed_alert(&event)).await {
                error!("📬️ Could not send the Telegram alert for order {order_id}. {e}");
            }
        }
    }

    pub async fn usdt_conversion_resolved(&self, event: UsdtConversionResolvedEvent) {
        let trx_id = event.conversion.trx_id.clone();
        if let Some(mail) = &self.mail {
            let message = usdt_conversion_email(mail.sender(), &event);
            match mail.send(&message).await {
                Ok(()) => info!("📬️ Conversion email for {trx_id} sent to {}", message.to),
                Err(e) => error!("📬️ Could not send the conversion email for {trx_id}. {e}"),
            }
        }
        if let Some(telegram) = &self.telegram {
            if let Err(e) = telegram.send_message(&usdt_conversion_alert(&event)).await {
                error!("📬️ Could not send the Telegram alert for conversion {trx_id}. {e}");
            }
        }
    }
}

/// Creates the event handlers for order and conversion notifications. Every hook is always installed, so that each
/// event is at least logged, even with no channel configured.
pub fn create_notification_handlers(notifiers: Notifiers) -> EventHandlers {
    let mut hooks = EventHooks::default();
    let on_success = notifiers.clone();
    hooks.on_order_succeeded(move |ev| {
        info!("📬️ Order {} succeeded. SN: {}", ev.order.order_id, ev.order.sn.as_deref().unwrap_or("-"));
        let notifiers = on_success.clone();
        Box::pin(async move { notifiers.order_succeeded(ev).await })
    });
    let on_failure = notifiers.clone();
    hooks.on_order_failed(move |ev| {
        info!("📬️ Order {} failed. Reason: {} ({:?})", ev.order.order_id, ev.reason, ev.category);
        let notifiers = on_failure.clone();
        Box::pin(async move { notifiers.order_failed(ev).await })
    });
    let on_conversion = notifiers;
    hooks.on_conversion_resolved(move |ev| {
        info!("📬️ USDT conversion {} was {}", ev.conversion.trx_id, ev.conversion.status);
        let notifiers = on_conversion.clone();
        Box::pin(async move { notifiers.usdt_conversion_resolved(ev).await })
    });
    EventHandlers::new(NOTIFICATION_BUFFER_SIZE, hooks)
}
