use std::sync::Arc;

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION},
    Client,
};
use serde::Serialize;

use crate::{EmailConfig, MessagingApiError};

/// A rendered email, ready to hand to the transactional email API.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EmailMessage {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
}

#[derive(Clone)]
pub struct EmailApi {
    config: EmailConfig,
    client: Arc<Client>,
}

impl EmailApi {
    pub fn new(config: EmailConfig) -> Result<Self, MessagingApiError> {
        let mut headers = HeaderMap::with_capacity(2);
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.api_key.reveal()))
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

    pub fn config(&self) -> &EmailConfig {
        &self.config
    }

    /// The `From` header value, e.g. `Storefront <orders@example.com>`.
    pub fn sender(&self) -> String {
        format!("{} <{}>", self.config.from_name, self.config.from_address)
    }

    pub fn message(&self, to: &str, subject: &str, html: String) -> EmailMessage {
        EmailMessage { from: self.sender(), to: vec![to.to_string()], subject: subject.to_string(), html }
    }

    pub async fn send(&self, message: &EmailMessage) -> Result<(), MessagingApiError> {
        if self.config.api_key.is_empty() {
            return Err(MessagingApiError::NotConfigured("email API key is missing".into()));
        }
        trace!("Sending email '{}' to {:?}", message.subject, message.to);
        let response = self
            .client
            .post(&self.config.api_url)
            .json(message)
            .send()
            .await
            .map_err(|e| MessagingApiError::RestResponseError(e.to_string()))?;
        if response.status().is_success() {
            debug!("Email '{}' accepted for delivery to {:?}", message.subject, message.to);
            Ok(())
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| MessagingApiError::RestResponseError(e.to_string()))?;
            Err(MessagingApiError::Rejected { status, message })
        }
    }
}
