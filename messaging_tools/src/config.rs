use log::*;
use spg_common::Secret;

#[derive(Debug, Clone, Default)]
pub struct EmailConfig {
    pub api_url: String,
    pub api_key: Secret<String>,
    pub from_address: String,
    pub from_name: String,
    /// Where operator alerts are sent.
    pub operator_address: String,
}

impl EmailConfig {
    pub fn new_from_env_or_default() -> Self {
        let api_url = std::env::var("SPG_EMAIL_API_URL").unwrap_or_else(|_| {
            warn!("SPG_EMAIL_API_URL not set, using https://api.resend.com/emails as default");
            "https://api.resend.com/emails".to_string()
        });
        let api_key = Secret::new(std::env::var("SPG_EMAIL_API_KEY").unwrap_or_else(|_| {
            warn!("SPG_EMAIL_API_KEY not set. Emails will not be delivered.");
            String::default()
        }));
        let from_address = std::env::var("SPG_EMAIL_FROM").unwrap_or_else(|_| {
            warn!("SPG_EMAIL_FROM not set, using orders@example.com");
            "orders@example.com".to_string()
        });
        let from_name = std::env::var("SPG_EMAIL_FROM_NAME").unwrap_or_else(|_| "Storefront".to_string());
        let operator_address = std::env::var("SPG_OPERATOR_EMAIL").unwrap_or_else(|_| {
            warn!("SPG_OPERATOR_EMAIL not set. Operator email alerts go to {from_address}");
            from_address.clone()
        });
        Self { api_url, api_key, from_address, from_name, operator_address }
    }
}

#[derive(Debug, Clone, Default)]
pub struct WhatsAppConfig {
    pub base_url: String,
    pub api_version: String,
    pub phone_number_id: String,
    pub access_token: Secret<String>,
    /// The operator's phone number, in international format without the `+`.
    pub operator_phone: String,
    /// Pre-approved template used when the operator has not messaged us within the last 24 hours.
    pub template_name: String,
    pub template_language: String,
    /// App secret used to verify `X-Hub-Signature-256` on inbound webhooks.
    pub app_secret: Secret<String>,
    /// Token echoed back by the subscription handshake.
    pub verify_token: Secret<String>,
}

impl WhatsAppConfig {
    pub fn new_from_env_or_default() -> Self {
        let base_url =
            std::env::var("SPG_WHATSAPP_URL").unwrap_or_else(|_| "https://graph.facebook.com".to_string());
        let api_version = std::env::var("SPG_WHATSAPP_API_VERSION").unwrap_or_else(|_| {
            info!("SPG_WHATSAPP_API_VERSION not set, using v19.0");
            "v19.0".to_string()
        });
        let phone_number_id = std::env::var("SPG_WHATSAPP_PHONE_NUMBER_ID").unwrap_or_else(|_| {
            warn!("SPG_WHATSAPP_PHONE_NUMBER_ID not set. Operator WhatsApp alerts will not be delivered.");
            String::default()
        });
        let access_token = Secret::new(std::env::var("SPG_WHATSAPP_ACCESS_TOKEN").unwrap_or_default());
        let operator_phone = std::env::var("SPG_WHATSAPP_OPERATOR_PHONE").unwrap_or_else(|_| {
            warn!("SPG_WHATSAPP_OPERATOR_PHONE not set. Operator WhatsApp alerts will not be delivered.");
            String::default()
        });
        let template_name =
            std::env::var("SPG_WHATSAPP_TEMPLATE").unwrap_or_else(|_| "new_order_alert".to_string());
        let template_language = std::env::var("SPG_WHATSAPP_TEMPLATE_LANG").unwrap_or_else(|_| "en".to_string());
        let app_secret = Secret::new(std::env::var("SPG_WHATSAPP_APP_SECRET").unwrap_or_default());
        let verify_token = Secret::new(std::env::var("SPG_WHATSAPP_VERIFY_TOKEN").unwrap_or_default());
        Self {
            base_url,
            api_version,
            phone_number_id,
            access_token,
            operator_phone,
            template_name,
            template_language,
            app_secret,
            verify_token,
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.phone_number_id.is_empty() && !self.operator_phone.is_empty() && !self.access_token.is_empty()
    }
}
