use std::future::Future;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::traits::StorefrontDbError;

#[derive(Debug, Clone, Error)]
pub enum NotificationError {
    #[error("The {0} channel is not configured")]
    NotConfigured(String),
    #[error("Message could not be delivered: {0}")]
    DeliveryFailed(String),
    #[error("Could not determine the messaging session state: {0}")]
    SessionLookup(String),
}

impl From<StorefrontDbError> for NotificationError {
    fn from(e: StorefrontDbError) -> Self {
        NotificationError::SessionLookup(e.to_string())
    }
}

/// Remembers when a phone number last sent us a message. The messaging platform only allows free-form messages
/// within 24 hours of the last inbound message.
///
/// The futures are `Send` so that notifications can run on detached tasks.
pub trait MessagingSessions {
    fn record_inbound_message(
        &self,
        phone: &str,
        at: DateTime<Utc>,
    ) -> impl Future<Output = Result<(), StorefrontDbError>> + Send;

    fn last_inbound_message(
        &self,
        phone: &str,
    ) -> impl Future<Output = Result<Option<DateTime<Utc>>, StorefrontDbError>> + Send;
}

pub trait EmailSender {
    /// Where operator alerts go, if operator email alerts are enabled.
    fn operator_address(&self) -> Option<String>;

    fn send_email(
        &self,
        to: &str,
        subject: &str,
        html: String,
    ) -> impl Future<Output = Result<(), NotificationError>> + Send;
}

pub trait OperatorMessenger {
    /// The operator's phone number, or `None` if the channel is disabled.
    fn operator_phone(&self) -> Option<String>;

    fn send_text(&self, to: &str, body: &str) -> impl Future<Output = Result<(), NotificationError>> + Send;

    /// Sends the pre-approved alert template with positional body parameters.
    fn send_template(
        &self,
        to: &str,
        parameters: Vec<String>,
    ) -> impl Future<Output = Result<(), NotificationError>> + Send;
}
