use std::time::Duration;

use feepay_engine::events::{OrderFailedEvent, OrderSucceededEvent, UsdtConversionResolvedEvent};
use log::*;
use reqwest::Client;
use serde_json::json;

use crate::{config::TelegramConfig, integrations::NotificationError};

pub const TELEGRAM_API_URL: &str = "https://api.telegram.org";
const TELEGRAM_TIMEOUT: Duration = Duration::from_secs(10);

/// Posts admin alerts to a Telegram chat through the Bot API.
#[derive(Clone)]
pub struct TelegramNotifier {
    config: TelegramConfig,
    base_url: String,
    client: Client,
}

impl TelegramNotifier {
    pub fn new(config: TelegramConfig) -> Result<Self, NotificationError> {
        let client = Client::builder()
            .timeout(TELEGRAM_TIMEOUT)
            .build()
            .map_err(|e| NotificationError::Initialization(e.to_string()))?;
        Ok(Self { config, base_url: TELEGRAM_API_URL.to_string(), client })
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub async fn send_message(&self, text: &str) -> Result<(), NotificationError> {
        // The token is part of the URL, so the URL itself must never be logged
        let url = format!("{}/bot{}/sendMessage", self.base_url, self.config.bot_token.reveal());
        let body = json!({ "chat_id": self.config.chat_id, "text": text });
        let response = self
            .client
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| NotificationError::RequestError(e.without_url().to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotificationError::Rejected { status: status.as_u16(), message: body });
        }
        trace!("📬️ Telegram alert sent to {}", self.config.chat_id);
        Ok(())
    }
}

pub fn order_success_alert(event: &OrderSucceededEvent) -> String {
    let order = &event.order;
    format!(
        "✅ Order {} delivered\n{} ({}) -> {}\n{}\nSN: {}",
        order.order_id,
        event.product.name,
        event.product.sku,
        order.target_number,
        order.total_price,
        order.sn.as_deref().unwrap_or("-")
    )
}

pub fn order_failed_alert(event: &OrderFailedEvent) -> String {
    let order = &event.order;
    format!(
        "❌ Order {} failed\n{} -> {}\n{}\nReason: {}",
        order.order_id, order.sku, order.target_number, order.total_price, event.reason
    )
}

pub fn usdt_conversion_alert(event: &UsdtConversionResolvedEvent) -> String {
    let conversion = &event.conversion;
    format!(
        "💱 USDT conversion {} {} by admin #{}\n{} on {} -> {}\n{} {} ({})",
        conversion.trx_id,
        conversion.status,
        conversion.approved_by.map(|id| id.to_string()).unwrap_or_else(|| "-".into()),
        conversion.amount,
        conversion.network,
        conversion.idr_received,
        conversion.bank_details.bank_name,
        conversion.bank_details.account_number,
        conversion.bank_details.account_name
    )
}
