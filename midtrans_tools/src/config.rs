use fpg_common::{helpers::parse_boolean_flag, Secret};
use log::*;

pub const SANDBOX_SNAP_URL: &str = "https://app.sandbox.midtrans.com/snap/v1/transactions";
pub const PRODUCTION_SNAP_URL: &str = "https://app.midtrans.com/snap/v1/transactions";

#[derive(Debug, Clone, Default)]
pub struct MidtransConfig {
    pub server_key: Secret<String>,
    pub client_key: String,
    pub is_production: bool,
    /// Overrides the Snap endpoint. Only useful for tests.
    pub snap_url: Option<String>,
}

impl MidtransConfig {
    pub fn new(server_key: &str, is_production: bool) -> Self {
        Self { server_key: Secret::new(server_key.to_string()), is_production, ..Default::default() }
    }

    pub fn with_client_key(mut self, client_key: &str) -> Self {
        self.client_key = client_key.to_string();
        self
    }

    pub fn snap_url(&self) -> &str {
        match (&self.snap_url, self.is_production) {
            (Some(url), _) => url.as_str(),
            (None, true) => PRODUCTION_SNAP_URL,
            (None, false) => SANDBOX_SNAP_URL,
        }
    }

    pub fn new_from_env_or_default() -> Self {
        let server_key = Secret::new(std::env::var("FPG_MIDTRANS_SERVER_KEY").unwrap_or_else(|_| {
            warn!("🪛️ FPG_MIDTRANS_SERVER_KEY not set. Checkout tokens cannot be issued and every notification will be rejected.");
            String::default()
        }));
        let client_key = std::env::var("FPG_MIDTRANS_CLIENT_KEY").unwrap_or_else(|_| {
            warn!("🪛️ FPG_MIDTRANS_CLIENT_KEY not set. The storefront cannot load the Snap widget.");
            String::default()
        });
        let is_production = parse_boolean_flag(std::env::var("FPG_MIDTRANS_PRODUCTION").ok(), false);
        if is_production {
            info!("🪛️ Midtrans is running against PRODUCTION");
        } else {
            info!("🪛️ Midtrans is running against the sandbox");
        }
        Self { server_key, client_key, is_production, snap_url: None }
    }
}
