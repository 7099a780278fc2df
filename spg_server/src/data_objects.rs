use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use spg_common::Secret;
use spg_engine::db_types::Order;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

/// The response to an operator action: the order as it is after the action.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperatorActionResponse {
    pub success: bool,
    pub message: String,
    pub order: Order,
}

impl OperatorActionResponse {
    pub fn new<S: Display>(message: S, order: Order) -> Self {
        Self { success: true, message: message.to_string(), order }
    }
}

/// The token WhatsApp echoes back during the subscription handshake.
#[derive(Debug, Clone, Default)]
pub struct SubscriptionToken(pub Secret<String>);

/// The subscription handshake query, `?hub.mode=subscribe&hub.verify_token=...&hub.challenge=...`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubscriptionQuery {
    #[serde(rename = "hub.mode", default)]
    pub mode: String,
    #[serde(rename = "hub.verify_token", default)]
    pub verify_token: String,
    #[serde(rename = "hub.challenge", default)]
    pub challenge: String,
}

/// The parts of a WhatsApp Cloud API webhook that carry inbound messages. Status updates and other change types
/// deserialize to entries without messages.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WhatsAppWebhook {
    #[serde(default)]
    pub object: String,
    #[serde(default)]
    pub entry: Vec<WhatsAppEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WhatsAppEntry {
    #[serde(default)]
    pub changes: Vec<WhatsAppChange>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WhatsAppChange {
    #[serde(default)]
    pub field: String,
    #[serde(default)]
    pub value: WhatsAppChangeValue,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WhatsAppChangeValue {
    #[serde(default)]
    pub messages: Vec<InboundMessage>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InboundMessage {
    /// Sender phone number, international format without the `+`
    pub from: String,
    /// Unix timestamp, in seconds, as a string
    #[serde(default)]
    pub timestamp: String,
}

impl InboundMessage {
    /// When the message was sent. Falls back to `now` if the timestamp is missing or garbled.
    pub fn sent_at(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.timestamp.trim().parse::<i64>().ok().and_then(|secs| DateTime::from_timestamp(secs, 0)).unwrap_or(now)
    }
}

impl WhatsAppWebhook {
    pub fn inbound_messages(&self) -> impl Iterator<Item = &InboundMessage> {
        self.entry.iter().flat_map(|e| e.changes.iter()).flat_map(|c| c.value.messages.iter())
    }
}
