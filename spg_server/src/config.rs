//! Server configuration.
//!
//! Everything is read from environment variables (optionally loaded from a `.env` file). Missing or invalid values
//! fall back to a default, and the fallback is logged.
use std::{env, time::Duration};

use gateway_tools::GatewayConfig;
use log::*;
use messaging_tools::{EmailConfig, WhatsAppConfig};
use spg_common::{parse_boolean_flag, Secret, DEFAULT_CURRENCY_CODE};
use spg_engine::OrderFlowConfig;

const DEFAULT_SPG_HOST: &str = "127.0.0.1";
const DEFAULT_SPG_PORT: u16 = 8380;
const DEFAULT_VERIFY_ATTEMPTS: u32 = 6;
const DEFAULT_VERIFY_BACKOFF: Duration = Duration::from_secs(10);
const DEFAULT_EVENT_BUFFER_SIZE: usize = 25;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// Apply the embedded database migrations on startup
    pub run_migrations: bool,
    pub order_flow: OrderFlowConfig,
    pub webhook: WebhookConfig,
    /// The shared token operator requests must carry in the `spg_operator_token` header. When empty, every operator
    /// request is refused.
    pub operator_token: Secret<String>,
    /// Capacity of each order event channel
    pub event_buffer_size: usize,
    pub gateway: GatewayConfig,
    pub email: EmailConfig,
    pub whatsapp: WhatsAppConfig,
}

#[derive(Clone, Debug, Default)]
pub struct WebhookConfig {
    /// The key the gateway signs its webhooks with
    pub secret: Secret<String>,
    /// If false, webhook signatures are not checked. **DANGER** Only ever disable this for local testing.
    pub checks: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_SPG_HOST.to_string(),
            port: DEFAULT_SPG_PORT,
            database_url: String::default(),
            run_migrations: false,
            order_flow: OrderFlowConfig::default(),
            webhook: WebhookConfig { secret: Secret::default(), checks: true },
            operator_token: Secret::default(),
            event_buffer_size: DEFAULT_EVENT_BUFFER_SIZE,
            gateway: GatewayConfig::default(),
            email: EmailConfig::default(),
            whatsapp: WhatsAppConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("SPG_HOST").ok().unwrap_or_else(|| DEFAULT_SPG_HOST.into());
        let port = env::var("SPG_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for SPG_PORT. {e} Using the default, {DEFAULT_SPG_PORT}, instead."
                    );
                    DEFAULT_SPG_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_SPG_PORT);
        let database_url = env::var("SPG_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ SPG_DATABASE_URL is not set. Please set it to the URL for the SPG database.");
            String::default()
        });
        let run_migrations = parse_boolean_flag(env::var("SPG_RUN_MIGRATIONS").ok(), false);
        let order_flow = order_flow_from_env();
        let gateway = GatewayConfig::new_from_env_or_default();
        let webhook = WebhookConfig::from_env_or_default(&gateway);
        let operator_token = Secret::new(env::var("SPG_OPERATOR_TOKEN").ok().unwrap_or_else(|| {
            warn!("🪛️ SPG_OPERATOR_TOKEN is not set. All operator requests will be refused.");
            String::default()
        }));
        let event_buffer_size = env::var("SPG_EVENT_BUFFER_SIZE")
            .ok()
            .and_then(|s| {
                s.parse::<usize>()
                    .map_err(|e| warn!("🪛️ Invalid SPG_EVENT_BUFFER_SIZE ({s}). {e}. Using the default."))
                    .ok()
            })
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_EVENT_BUFFER_SIZE);
        let email = EmailConfig::new_from_env_or_default();
        let whatsapp = WhatsAppConfig::new_from_env_or_default();
        if !whatsapp.is_configured() {
            info!("🪛️ WhatsApp is not fully configured. Operator alerts will only go out by email.");
        }
        Self {
            host,
            port,
            database_url,
            run_migrations,
            order_flow,
            webhook,
            operator_token,
            event_buffer_size,
            gateway,
            email,
            whatsapp,
        }
    }
}

impl WebhookConfig {
    /// Reads `SPG_WEBHOOK_SECRET` and `SPG_WEBHOOK_CHECKS`. The gateway signs webhooks with the API client secret, so
    /// that is used when no dedicated secret is configured.
    pub fn from_env_or_default(gateway: &GatewayConfig) -> Self {
        let secret = match env::var("SPG_WEBHOOK_SECRET") {
            Ok(s) if !s.is_empty() => Secret::new(s),
            _ => {
                info!("🪛️ SPG_WEBHOOK_SECRET is not set. Verifying webhooks with the gateway client secret.");
                gateway.client_secret.clone()
            },
        };
        let checks = parse_boolean_flag(env::var("SPG_WEBHOOK_CHECKS").ok(), true);
        if !checks {
            warn!("🚨️ Webhook signature checks are DISABLED. Anyone can mark orders as paid. Never do this in production.");
        }
        Self { secret, checks }
    }
}

fn order_flow_from_env() -> OrderFlowConfig {
    let default_currency = env::var("SPG_CURRENCY")
        .ok()
        .map(|s| s.trim().to_ascii_uppercase())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| {
            info!("🪛️ SPG_CURRENCY is not set. Using {DEFAULT_CURRENCY_CODE}.");
            DEFAULT_CURRENCY_CODE.to_string()
        });
    let return_url = env::var("SPG_RETURN_URL").ok().filter(|s| !s.is_empty());
    if return_url.is_none() {
        warn!("🪛️ SPG_RETURN_URL is not set. The gateway will use its own default landing page after checkout.");
    }
    let notify_url = env::var("SPG_NOTIFY_URL").ok().filter(|s| !s.is_empty());
    if notify_url.is_none() {
        warn!("🪛️ SPG_NOTIFY_URL is not set. The gateway will only send webhooks to the dashboard-configured URL.");
    }
    let verify_attempts = env::var("SPG_VERIFY_ATTEMPTS")
        .ok()
        .and_then(|s| {
            s.parse::<u32>().map_err(|e| warn!("🪛️ Invalid SPG_VERIFY_ATTEMPTS ({s}). {e}. Using the default.")).ok()
        })
        .filter(|n| *n > 0)
        .unwrap_or(DEFAULT_VERIFY_ATTEMPTS);
    let verify_backoff = env::var("SPG_VERIFY_BACKOFF_SECS")
        .ok()
        .and_then(|s| {
            s.parse::<u64>()
                .map_err(|e| warn!("🪛️ Invalid SPG_VERIFY_BACKOFF_SECS ({s}). {e}. Using the default."))
                .ok()
        })
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_VERIFY_BACKOFF);
    info!("🪛️ Payments are verified with up to {verify_attempts} attempts, {verify_backoff:?} apart");
    OrderFlowConfig { default_currency, return_url, notify_url, verify_attempts, verify_backoff }
}
