use std::sync::Arc;

use fpg_common::Rupiah;
use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION},
    Client,
};

use crate::{
    config::MidtransConfig,
    data_objects::{Notification, SnapRequest, SnapToken},
    signature::verify_notification_signature,
    MidtransApiError,
};

#[derive(Clone)]
pub struct MidtransApi {
    config: MidtransConfig,
    client: Arc<Client>,
}

impl MidtransApi {
    pub fn new(config: MidtransConfig) -> Result<Self, MidtransApiError> {
        let mut headers = HeaderMap::with_capacity(3);
        let auth = format!("Basic {}", base64::encode(format!("{}:", config.server_key.reveal())));
        let mut auth = HeaderValue::from_str(&auth).map_err(|e| MidtransApiError::Initialization(e.to_string()))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        headers.insert("Accept", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| MidtransApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn config(&self) -> &MidtransConfig {
        &self.config
    }

    /// Requests a Snap checkout token. `amount` must be a whole number of rupiah.
    pub async fn create_snap_token(
        &self,
        order_id: &str,
        amount: Rupiah,
        email: &str,
        item_id: &str,
        item_name: &str,
    ) -> Result<SnapToken, MidtransApiError> {
        if !amount.is_whole() || !amount.is_positive() {
            return Err(MidtransApiError::InvalidAmount(amount.to_decimal_string()));
        }
        let request = SnapRequest::new(order_id, amount.whole_rupiah(), email, item_id, item_name);
        let url = self.config.snap_url();
        debug!("💳️ Requesting Snap token for {order_id} ({amount})");
        let response = self.client.post(url).json(&request).send().await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            error!("💳️ Midtrans refused to create a Snap token for {order_id}. HTTP {status}. {text}");
            return Err(MidtransApiError::QueryError { status: status.as_u16(), message: text });
        }
        let token = serde_json::from_str::<SnapToken>(&text).map_err(|e| MidtransApiError::JsonError(e.to_string()))?;
        if token.token.is_empty() {
            return Err(MidtransApiError::MissingToken(text));
        }
        info!("💳️ Snap token issued for {order_id}");
        Ok(token)
    }

    /// Checks the notification's `signature_key` against this merchant's server key.
    pub fn verify_notification(&self, notification: &Notification) -> bool {
        verify_notification_signature(
            &notification.order_id,
            &notification.status_code,
            &notification.gross_amount,
            self.config.server_key.reveal(),
            &notification.signature_key,
        )
    }
}
