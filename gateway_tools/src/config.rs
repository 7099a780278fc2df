use log::*;
use spg_common::Secret;

pub const SANDBOX_URL: &str = "https://sandbox.cashfree.com/pg";

#[derive(Debug, Clone, Default)]
pub struct GatewayConfig {
    pub base_url: String,
    pub client_id: String,
    pub client_secret: Secret<String>,
    pub api_version: String,
}

impl GatewayConfig {
    pub fn new_from_env_or_default() -> Self {
        let base_url = std::env::var("SPG_GATEWAY_URL").unwrap_or_else(|_| {
            warn!("SPG_GATEWAY_URL not set, using the sandbox endpoint {SANDBOX_URL}");
            SANDBOX_URL.to_string()
        });
        let api_version = std::env::var("SPG_GATEWAY_API_VERSION").unwrap_or_else(|_| {
            warn!("SPG_GATEWAY_API_VERSION not set, using 2023-08-01 as default");
            "2023-08-01".to_string()
        });
        let client_id = std::env::var("SPG_GATEWAY_CLIENT_ID").unwrap_or_else(|_| {
            warn!("SPG_GATEWAY_CLIENT_ID not set, using (probably useless) default");
            "TEST_CLIENT_ID".to_string()
        });
        let client_secret = Secret::new(std::env::var("SPG_GATEWAY_CLIENT_SECRET").unwrap_or_else(|_| {
            warn!("SPG_GATEWAY_CLIENT_SECRET not set, using (probably useless) default");
            "TEST_CLIENT_SECRET".to_string()
        }));
        Self { base_url, client_id, client_secret, api_version }
    }
}
