use std::sync::Arc;

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION},
    Client,
};
use serde_json::{json, Value};

use crate::{MessagingApiError, WhatsAppConfig};

/// A template message with positional body parameters.
#[derive(Debug, Clone, Default)]
pub struct TemplateMessage {
    pub name: String,
    pub language: String,
    pub body_parameters: Vec<String>,
}

impl TemplateMessage {
    pub fn to_payload(&self, to: &str) -> Value {
        let parameters =
            self.body_parameters.iter().map(|p| json!({"type": "text", "text": p})).collect::<Vec<Value>>();
        json!({
            "messaging_product": "whatsapp",
            "to": to,
            "type": "template",
            "template": {
                "name": self.name,
                "language": { "code": self.language },
                "components": [{ "type": "body", "parameters": parameters }]
            }
        })
    }
}

pub fn text_payload(to: &str, body: &str) -> Value {
    json!({
        "messaging_product": "whatsapp",
        "to": to,
        "type": "text",
        "text": { "preview_url": false, "body": body }
    })
}

#[derive(Clone)]
pub struct WhatsAppApi {
    config: WhatsAppConfig,
    client: Arc<Client>,
}

impl WhatsAppApi {
    pub fn new(config: WhatsAppConfig) -> Result<Self, MessagingApiError> {
        let mut headers = HeaderMap::with_capacity(2);
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.access_token.reveal()))
            .map_err(|e| MessagingApiError::Initialization(e.to_string()))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| MessagingApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn config(&self) -> &WhatsAppConfig {
        &self.config
    }

    pub fn url(&self) -> String {
        format!(
            "{}/{}/{}/messages",
            self.config.base_url.trim_end_matches('/'),
            self.config.api_version,
            self.config.phone_number_id
        )
    }

    /// Free-form text. Only delivered while a customer-service window is open.
    pub async fn send_text(&self, to: &str, body: &str) -> Result<(), MessagingApiError> {
        self.post(text_payload(to, body)).await
    }

    pub async fn send_template(&self, to: &str, template: &TemplateMessage) -> Result<(), MessagingApiError> {
        self.post(template.to_payload(to)).await
    }

    async fn post(&self, payload: Value) -> Result<(), MessagingApiError> {
        if !self.config.is_configured() {
            return Err(MessagingApiError::NotConfigured("WhatsApp credentials are missing".into()));
        }
        trace!("Sending WhatsApp message: {payload}");
        let response = self
            .client
            .post(self.url())
            .json(&payload)
            .send()
            .await
            .map_err(|e| MessagingApiError::RestResponseError(e.to_string()))?;
        if response.status().is_success() {
            debug!("WhatsApp message accepted. {}", response.status());
            Ok(())
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| MessagingApiError::RestResponseError(e.to_string()))?;
            Err(MessagingApiError::Rejected { status, message })
        }
    }
}
