//! Adapters from the REST clients in `gateway_tools` and `messaging_tools` to the engine's provider traits.
pub mod email;
pub mod gateway;
pub mod notifications;
pub mod whatsapp;

pub use email::EmailNotifier;
pub use gateway::HostedGateway;
pub use notifications::create_notification_handlers;
pub use whatsapp::WhatsAppNotifier;
