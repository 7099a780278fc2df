//! Outbound messaging clients: a transactional email HTTP API and the WhatsApp Cloud API.
mod config;
mod email;
mod error;
mod whatsapp;

pub use config::{EmailConfig, WhatsAppConfig};
pub use email::{EmailApi, EmailMessage};
pub use error::MessagingApiError;
pub use whatsapp::{TemplateMessage, WhatsAppApi};
