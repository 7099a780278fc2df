use log::*;
use messaging_tools::{EmailApi, EmailConfig, MessagingApiError};
use spg_engine::traits::{EmailSender, NotificationError};

/// Transactional email, as seen by the notification dispatcher.
#[derive(Clone)]
pub struct EmailNotifier {
    api: EmailApi,
}

impl EmailNotifier {
    pub fn new(config: EmailConfig) -> Result<Self, MessagingApiError> {
        let api = EmailApi::new(config)?;
        Ok(Self { api })
    }
}

pub fn to_notification_error(channel: &str, e: MessagingApiError) -> NotificationError {
    match e {
        MessagingApiError::NotConfigured(_) => NotificationError::NotConfigured(channel.to_string()),
        e => NotificationError::DeliveryFailed(e.to_string()),
    }
}

impl EmailSender for EmailNotifier {
    fn operator_address(&self) -> Option<String> {
        let address = self.api.config().operator_address.trim();
        (!address.is_empty()).then(|| address.to_string())
    }

    async fn send_email(&self, to: &str, subject: &str, html: String) -> Result<(), NotificationError> {
        let message = self.api.message(to, subject, html);
        self.api.send(&message).await.map_err(|e| {
            debug!("📧️ Email '{subject}' to {to} was not sent. {e}");
            to_notification_error("email", e)
        })
    }
}
