use std::{sync::Arc, time::Duration};

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::{
    config::DigiflazzConfig,
    data_objects::{Balance, PriceListItem, Transaction},
    signature::{deposit_signature, price_list_signature, transaction_signature},
    DigiflazzApiError,
};

/// Placing an order can block on upstream settlement.
pub const PLACE_ORDER_TIMEOUT: Duration = Duration::from_secs(60);
pub const READ_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub struct DigiflazzApi {
    config: DigiflazzConfig,
    client: Arc<Client>,
}

impl DigiflazzApi {
    pub fn new(config: DigiflazzConfig) -> Result<Self, DigiflazzApiError> {
        let mut headers = HeaderMap::with_capacity(2);
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        headers.insert("Accept", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| DigiflazzApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn config(&self) -> &DigiflazzConfig {
        &self.config
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url)
    }

    /// POSTs a signed body and unwraps the `data` envelope Digiflazz puts around every response.
    async fn post<T: DeserializeOwned>(&self, path: &str, body: Value, timeout: Duration) -> Result<T, DigiflazzApiError> {
        let url = self.url(path);
        trace!("🛒️ Sending Digiflazz request: {url}");
        let response = self.client.post(url).timeout(timeout).json(&body).send().await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(DigiflazzApiError::QueryError { status: status.as_u16(), message: text });
        }
        let envelope = serde_json::from_str::<Value>(&text)
            .map_err(|e| DigiflazzApiError::JsonError(format!("{e}. Body: {text}")))?;
        let data = match envelope.get("data") {
            Some(data) => data.clone(),
            None => return Err(DigiflazzApiError::JsonError(format!("Response has no data field. Body: {text}"))),
        };
        serde_json::from_value::<T>(data.clone()).map_err(|e| match data.get("message").and_then(Value::as_str) {
            // Upstream errors come back as {"data": {"rc": "..", "message": ".."}} with HTTP 200
            Some(msg) => DigiflazzApiError::Rejected(msg.to_string()),
            None => DigiflazzApiError::JsonError(format!("{e}. Body: {text}")),
        })
    }

    /// Fetches the prepaid price list, optionally keeping only one category (case-insensitive).
    pub async fn price_list(&self, category: Option<&str>) -> Result<Vec<PriceListItem>, DigiflazzApiError> {
        let body = json!({
            "cmd": "prepaid",
            "username": self.config.username,
            "sign": price_list_signature(&self.config.username, self.config.api_key.reveal()),
        });
        let mut items = self.post::<Vec<PriceListItem>>("/price-list", body, READ_TIMEOUT).await?;
        if let Some(category) = category {
            items.retain(|item| item.category.eq_ignore_ascii_case(category));
        }
        info!("🛒️ Fetched {} products from the Digiflazz price list (category: {category:?})", items.len());
        Ok(items)
    }

    /// Submits a top-up. `ref_id` is our order reference and is the de-duplication key upstream.
    pub async fn place_order(&self, sku: &str, customer_no: &str, ref_id: &str) -> Result<Transaction, DigiflazzApiError> {
        let body = self.transaction_body(sku, customer_no, ref_id);
        debug!("🛒️ Placing Digiflazz order {ref_id} for {sku} -> {customer_no}");
        let tx = self.post::<Transaction>("/transaction", body, PLACE_ORDER_TIMEOUT).await?;
        info!("🛒️ Digiflazz accepted order {ref_id}. Status: {}. Message: {}", tx.status, tx.message);
        Ok(tx)
    }

    /// Asks Digiflazz for the current state of a transaction. Repeating the original body with the same `ref_id` is how
    /// the upstream reports status without creating a second transaction.
    pub async fn check_status(&self, sku: &str, customer_no: &str, ref_id: &str) -> Result<Transaction, DigiflazzApiError> {
        let body = self.transaction_body(sku, customer_no, ref_id);
        debug!("🛒️ Checking Digiflazz status for {ref_id}");
        let tx = self.post::<Transaction>("/transaction", body, READ_TIMEOUT).await?;
        info!("🛒️ Digiflazz status for {ref_id}: {}", tx.status);
        Ok(tx)
    }

    pub async fn balance(&self) -> Result<Balance, DigiflazzApiError> {
        let body = json!({
            "cmd": "deposit",
            "username": self.config.username,
            "sign": deposit_signature(&self.config.username, self.config.api_key.reveal()),
        });
        let balance = self.post::<Balance>("/cek-saldo", body, READ_TIMEOUT).await?;
        info!("🛒️ Digiflazz deposit balance: {}", balance.deposit);
        Ok(balance)
    }

    /// Verifies the `sign` field of an incoming callback for the given `ref_id`.
    pub fn verify_callback(&self, ref_id: &str, signature: &str) -> bool {
        crate::signature::verify_callback_signature(&self.config.username, self.config.api_key.reveal(), ref_id, signature)
    }

    fn transaction_body(&self, sku: &str, customer_no: &str, ref_id: &str) -> Value {
        json!({
            "username": self.config.username,
            "buyer_sku_code": sku,
            "customer_no": customer_no,
            "ref_id": ref_id,
            "sign": transaction_signature(&self.config.username, self.config.api_key.reveal(), ref_id),
        })
    }
}
