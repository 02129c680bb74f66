//! Customer emails, sent through an HTTP mail relay.
//!
//! The relay takes a JSON body (`from`, `to`, `subject`, `text`) and a bearer key. Any non-2xx reply is treated as a
//! failed send.
use std::time::Duration;

use feepay_engine::{
    db_types::UsdtConversionStatus,
    events::{OrderFailedEvent, OrderSucceededEvent, UsdtConversionResolvedEvent},
};
use log::*;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::{config::MailConfig, integrations::NotificationError};

const MAIL_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub text: String,
}

#[derive(Clone)]
pub struct MailRelay {
    config: MailConfig,
    client: Client,
}

impl MailRelay {
    pub fn new(config: MailConfig) -> Result<Self, NotificationError> {
        let client = Client::builder()
            .timeout(MAIL_TIMEOUT)
            .build()
            .map_err(|e| NotificationError::Initialization(e.to_string()))?;
        Ok(Self { config, client })
    }

    pub fn sender(&self) -> &str {
        &self.config.from
    }

    pub async fn send(&self, message: &MailMessage) -> Result<(), NotificationError> {
        let mut request = self.client.post(&self.config.api_url).json(message);
        if !self.config.api_key.is_empty() {
            request = request.bearer_auth(self.config.api_key.reveal());
        }
        let response = request.send().await.map_err(|e| NotificationError::RequestError(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotificationError::Rejected { status: status.as_u16(), message: body });
        }
        debug!("📬️ Mail relay accepted '{}' for {}", message.subject, message.to);
        Ok(())
    }
}

pub fn order_success_email(from: &str, event: &OrderSucceededEvent) -> MailMessage {
    let order = &event.order;
    let sn = order.sn.as_deref().unwrap_or("-");
    let text = format!(
        "Thank you for your purchase.\n\nOrder: {}\nProduct: {}\nDestination: {}\nTotal: {}\nSerial number: \
         {sn}\n\nKeep this email as your receipt.",
        order.order_id, event.product.name, order.target_number, order.total_price
    );
    MailMessage {
        from: from.to_string(),
        to: order.customer_email.clone(),
        subject: format!("Order {} completed", order.order_id),
        text,
    }
}

/// The raw supplier reason is never shown to the customer, only its category.
pub fn order_failed_email(from: &str, event: &OrderFailedEvent) -> MailMessage {
    let order = &event.order;
    let text = format!(
        "We're sorry, your order could not be completed.\n\nOrder: {}\nProduct: {}\nDestination: {}\nTotal: \
         {}\n\n{}",
        order.order_id,
        order.product_name,
        order.target_number,
        order.total_price,
        event.category.customer_message()
    );
    MailMessage {
        from: from.to_string(),
        to: order.customer_email.clone(),
        subject: format!("Order {} failed", order.order_id),
        text,
    }
}

pub fn usdt_conversion_email(from: &str, event: &UsdtConversionResolvedEvent) -> MailMessage {
    let conversion = &event.conversion;
    let bank = &conversion.bank_details;
    let (headline, verdict) = match conversion.status {
        UsdtConversionStatus::Approved => {
            ("Your USDT conversion was approved.", format!("{} is on its way to your account.", conversion.idr_received))
        },
        _ => ("Your USDT conversion was rejected.", "No rupiah will be paid out for this conversion.".to_string()),
    };
    let note = conversion.admin_note.as_deref().map(|n| format!("\nNote: {n}")).unwrap_or_default();
    let text = format!(
        "{headline}\n\nReference: {}\nAmount: {} ({})\nRate: {} per USDT\nPayout: {}\nBank: {} {} a.n. \
         {}\n{note}\n\n{verdict}",
        conversion.trx_id,
        conversion.amount,
        conversion.network,
        conversion.rate,
        conversion.idr_received,
        bank.bank_name,
        bank.account_number,
        bank.account_name
    );
    MailMessage {
        from: from.to_string(),
        to: conversion.customer_email.clone(),
        subject: format!("USDT conversion {} {}", conversion.trx_id, conversion.status),
        text,
    }
}
