use fpg_common::Secret;
use log::*;

pub const DEFAULT_DIGIFLAZZ_BASE_URL: &str = "https://api.digiflazz.com/v1";

#[derive(Debug, Clone, Default)]
pub struct DigiflazzConfig {
    pub username: String,
    pub api_key: Secret<String>,
    pub base_url: String,
}

impl DigiflazzConfig {
    pub fn new(username: &str, api_key: &str) -> Self {
        Self {
            username: username.to_string(),
            api_key: Secret::new(api_key.to_string()),
            base_url: DEFAULT_DIGIFLAZZ_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn new_from_env_or_default() -> Self {
        let username = std::env::var("FPG_DIGIFLAZZ_USERNAME").unwrap_or_else(|_| {
            warn!("🪛️ FPG_DIGIFLAZZ_USERNAME not set. Supplier requests will be rejected upstream.");
            String::default()
        });
        let api_key = Secret::new(std::env::var("FPG_DIGIFLAZZ_API_KEY").unwrap_or_else(|_| {
            warn!("🪛️ FPG_DIGIFLAZZ_API_KEY not set. Supplier requests cannot be signed and every callback will be rejected.");
            String::default()
        }));
        let base_url = std::env::var("FPG_DIGIFLAZZ_BASE_URL")
            .map(|s| s.trim_end_matches('/').to_string())
            .unwrap_or_else(|_| {
                info!("🪛️ FPG_DIGIFLAZZ_BASE_URL not set, using {DEFAULT_DIGIFLAZZ_BASE_URL}");
                DEFAULT_DIGIFLAZZ_BASE_URL.to_string()
            });
        Self { username, api_key, base_url }
    }
}
