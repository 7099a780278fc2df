use log::*;
use messaging_tools::{MessagingApiError, TemplateMessage, WhatsAppApi, WhatsAppConfig};
use spg_engine::traits::{NotificationError, OperatorMessenger};

use crate::integrations::email::to_notification_error;

/// The operator's WhatsApp channel, as seen by the notification dispatcher.
#[derive(Clone)]
pub struct WhatsAppNotifier {
    api: WhatsAppApi,
}

impl WhatsAppNotifier {
    pub fn new(config: WhatsAppConfig) -> Result<Self, MessagingApiError> {
        let api = WhatsAppApi::new(config)?;
        Ok(Self { api })
    }
}

impl OperatorMessenger for WhatsAppNotifier {
    fn operator_phone(&self) -> Option<String> {
        let config = self.api.config();
        config.is_configured().then(|| config.operator_phone.clone())
    }

    async fn send_text(&self, to: &str, body: &str) -> Result<(), NotificationError> {
        self.api.send_text(to, body).await.map_err(|e| {
            debug!("💬️ Text to {to} was not sent. {e}");
            to_notification_error("whatsapp", e)
        })
    }

    async fn send_template(&self, to: &str, parameters: Vec<String>) -> Result<(), NotificationError> {
        let config = self.api.config();
        let template = TemplateMessage {
            name: config.template_name.clone(),
            language: config.template_language.clone(),
            body_parameters: parameters,
        };
        self.api.send_template(to, &template).await.map_err(|e| {
            debug!("💬️ Template {} to {to} was not sent. {e}", template.name);
            to_notification_error("whatsapp", e)
        })
    }
}
