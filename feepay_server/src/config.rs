use std::{env, net::IpAddr, time::Duration};

use digiflazz_tools::DigiflazzConfig;
use feepay_engine::{sqlite_db::db_url, DEFAULT_IDEMPOTENCY_WINDOW};
use fpg_common::{
    helpers::{parse_boolean_flag, parse_list},
    Rupiah,
    Secret,
};
use log::*;
use midtrans_tools::MidtransConfig;

const DEFAULT_FPG_HOST: &str = "127.0.0.1";
const DEFAULT_FPG_PORT: u16 = 8360;
const DEFAULT_PRICE_MARGIN: i64 = 1_000;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// If true, the X-Forwarded-For header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_x_forwarded_for: bool,
    /// If true, the `for=` field of the Forwarded header will be used to determine the client's IP address.
    pub use_forwarded: bool,
    /// Shared secret for the admin routes. When empty, every admin request is refused.
    pub admin_token: Secret<String>,
    /// Added to the supplier's cost price when the catalog is synced
    pub price_margin: Rupiah,
    /// How long a repeated idempotency key returns the original order
    pub idempotency_window: Duration,
    /// If supplied, supplier callbacks are only accepted from these addresses.
    pub supplier_whitelist: Option<Vec<IpAddr>>,
    pub digiflazz: DigiflazzConfig,
    pub midtrans: MidtransConfig,
    pub mail: Option<MailConfig>,
    pub telegram: Option<TelegramConfig>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_FPG_HOST.to_string(),
            port: DEFAULT_FPG_PORT,
            database_url: String::default(),
            use_x_forwarded_for: false,
            use_forwarded: false,
            admin_token: Secret::default(),
            price_margin: Rupiah::from_rupiah(DEFAULT_PRICE_MARGIN),
            idempotency_window: DEFAULT_IDEMPOTENCY_WINDOW,
            supplier_whitelist: None,
            digiflazz: DigiflazzConfig::default(),
            midtrans: MidtransConfig::default(),
            mail: None,
            telegram: None,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("FPG_HOST").ok().unwrap_or_else(|| DEFAULT_FPG_HOST.into());
        let port = env::var("FPG_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for FPG_PORT. {e} Using the default, {DEFAULT_FPG_PORT}, instead."
                    );
                    DEFAULT_FPG_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_FPG_PORT);
        let database_url = db_url();
        let use_x_forwarded_for = parse_boolean_flag(env::var("FPG_USE_X_FORWARDED_FOR").ok(), false);
        let use_forwarded = parse_boolean_flag(env::var("FPG_USE_FORWARDED").ok(), false);
        let admin_token = Secret::new(env::var("FPG_ADMIN_TOKEN").ok().unwrap_or_else(|| {
            warn!("🪛️ FPG_ADMIN_TOKEN is not set. All admin routes will refuse requests.");
            String::default()
        }));
        let price_margin = configure_price_margin();
        let idempotency_window = configure_idempotency_window();
        let supplier_whitelist = configure_supplier_whitelist();
        let digiflazz = DigiflazzConfig::new_from_env_or_default();
        let midtrans = MidtransConfig::new_from_env_or_default();
        let mail = MailConfig::from_env();
        let telegram = TelegramConfig::from_env();
        Self {
            host,
            port,
            database_url,
            use_x_forwarded_for,
            use_forwarded,
            admin_token,
            price_margin,
            idempotency_window,
            supplier_whitelist,
            digiflazz,
            midtrans,
            mail,
            telegram,
        }
    }
}

fn configure_price_margin() -> Rupiah {
    let default = Rupiah::from_rupiah(DEFAULT_PRICE_MARGIN);
    env::var("FPG_PRICE_MARGIN")
        .map_err(|_| info!("🪛️ FPG_PRICE_MARGIN is not set. Using the default margin of {default}."))
        .and_then(|s| {
            s.parse::<Rupiah>()
                .map_err(|e| warn!("🪛️ Invalid configuration value for FPG_PRICE_MARGIN. {e}. Using {default}."))
        })
        .and_then(|m| {
            if m.value() < 0 {
                warn!("🪛️ FPG_PRICE_MARGIN cannot be negative. Using {default}.");
                Err(())
            } else {
                Ok(m)
            }
        })
        .unwrap_or(default)
}

fn configure_idempotency_window() -> Duration {
    env::var("FPG_IDEMPOTENCY_WINDOW_HOURS")
        .map_err(|_| {
            info!(
                "🪛️ FPG_IDEMPOTENCY_WINDOW_HOURS is not set. Using the default value of {} hrs.",
                DEFAULT_IDEMPOTENCY_WINDOW.as_secs() / 3600
            )
        })
        .and_then(|s| {
            s.parse::<u64>()
                .map(|h| Duration::from_secs(h * 3600))
                .map_err(|e| warn!("🪛️ Invalid configuration value for FPG_IDEMPOTENCY_WINDOW_HOURS. {e}"))
        })
        .unwrap_or(DEFAULT_IDEMPOTENCY_WINDOW)
}

fn configure_supplier_whitelist() -> Option<Vec<IpAddr>> {
    let whitelist = env::var("FPG_SUPPLIER_CALLBACK_WHITELIST").ok().and_then(|s| {
        if s.trim().is_empty() || ["none", "false", "0"].contains(&s.trim().to_lowercase().as_str()) {
            return None;
        }
        let ip_addrs = parse_list(&s)
            .into_iter()
            .filter_map(|s| {
                s.parse::<IpAddr>()
                    .map_err(|e| warn!("🪛️ Ignoring invalid IP address ({s}) in FPG_SUPPLIER_CALLBACK_WHITELIST: {e}"))
                    .ok()
            })
            .collect::<Vec<IpAddr>>();
        Some(ip_addrs)
    });
    match &whitelist {
        Some(whitelist) if whitelist.is_empty() => {
            warn!(
                "🚨️ The supplier IP whitelist was configured, but is empty. The server will run, but won't accept any \
                 supplier callbacks."
            );
        },
        None => {
            info!("🪛️ No supplier IP whitelist is set. Only callback signatures will be checked.");
        },
        Some(v) => {
            let addrs = v.iter().map(|a| a.to_string()).collect::<Vec<_>>().join(", ");
            info!("🪛️ Supplier IP whitelist: {addrs}");
        },
    }
    whitelist
}

//-------------------------------------------------  MailConfig  -------------------------------------------------------
/// The HTTP mail relay used for customer emails.
#[derive(Clone, Debug)]
pub struct MailConfig {
    pub api_url: String,
    pub api_key: Secret<String>,
    pub from: String,
}

impl MailConfig {
    /// Returns `None` (and customer emails are switched off) unless both the relay URL and sender are set.
    pub fn from_env() -> Option<Self> {
        let api_url = env::var("FPG_MAIL_API_URL").ok().filter(|s| !s.trim().is_empty());
        let from = env::var("FPG_MAIL_FROM").ok().filter(|s| !s.trim().is_empty());
        let api_key = Secret::new(env::var("FPG_MAIL_API_KEY").unwrap_or_default());
        match (api_url, from) {
            (Some(api_url), Some(from)) => {
                info!("🪛️ Customer emails will be sent from {from} via {api_url}");
                Some(Self { api_url, api_key, from })
            },
            _ => {
                warn!("🪛️ FPG_MAIL_API_URL or FPG_MAIL_FROM is not set. Customer emails are disabled.");
                None
            },
        }
    }
}

//-------------------------------------------------  TelegramConfig  ---------------------------------------------------
#[derive(Clone, Debug)]
pub struct TelegramConfig {
    pub bot_token: Secret<String>,
    pub chat_id: String,
}

impl TelegramConfig {
    pub fn from_env() -> Option<Self> {
        let bot_token = Secret::new(env::var("FPG_TELEGRAM_BOT_TOKEN").unwrap_or_default());
        let chat_id = env::var("FPG_TELEGRAM_CHAT_ID").ok().filter(|s| !s.trim().is_empty());
        match chat_id {
            Some(chat_id) if !bot_token.is_empty() => {
                info!("🪛️ Admin alerts will be sent to Telegram chat {chat_id}");
                Some(Self { bot_token, chat_id })
            },
            _ => {
                info!("🪛️ Telegram is not configured. Admin alerts are disabled.");
                None
            },
        }
    }
}

//-------------------------------------------------  ServerOptions  ----------------------------------------------------
/// A subset of the server configuration that is used to configure the server's behaviour. Generally we try to keep this
/// as small as possible, and exclude secrets to avoid passing sensitive information around the system.
#[derive(Clone, Copy, Debug)]
pub struct ServerOptions {
    pub use_x_forwarded_for: bool,
    pub use_forwarded: bool,
    pub price_margin: Rupiah,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self { use_x_forwarded_for: false, use_forwarded: false, price_margin: Rupiah::from_rupiah(DEFAULT_PRICE_MARGIN) }
    }
}

impl ServerOptions {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            use_x_forwarded_for: config.use_x_forwarded_for,
            use_forwarded: config.use_forwarded,
            price_margin: config.price_margin,
        }
    }
}
