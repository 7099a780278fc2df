use serde::{Deserialize, Serialize};

use crate::db_types::{OrderStatusType, PaymentStatus};

/// The envelope the gateway pushes to the webhook endpoint. Only the fields needed for reconciliation are typed; the
/// raw payload is kept separately for the audit log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayWebhookEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: WebhookData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookData {
    pub order: WebhookOrder,
    #[serde(default)]
    pub payment: Option<WebhookPayment>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookOrder {
    /// Our gateway order reference
    pub order_id: String,
    #[serde(default)]
    pub order_status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookPayment {
    #[serde(default)]
    pub payment_status: Option<String>,
}

impl GatewayWebhookEvent {
    /// The status to reconcile against: the order status if present, otherwise the payment status.
    pub fn reported_status(&self) -> Option<&str> {
        self.data
            .order
            .order_status
            .as_deref()
            .or_else(|| self.data.payment.as_ref().and_then(|p| p.payment_status.as_deref()))
    }

    /// `webhook_<type>`, lowercased, for the payment log.
    pub fn log_event_type(&self) -> String {
        format!("webhook_{}", self.event_type.trim().to_ascii_lowercase())
    }
}

/// What the webhook ingestor did with an authenticated event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// No payment carries the event's reference. The event was logged and otherwise ignored.
    Unmatched,
    /// The event belongs to a known payment. `transitioned_to` is set only if this delivery moved the order.
    Matched { order_db_id: i64, transitioned_to: Option<OrderStatusType> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayStatusClass {
    Paid,
    Failed,
    Pending,
    Unrecognized,
}

impl GatewayStatusClass {
    pub fn classify(status: &str) -> Self {
        match status.trim().to_ascii_uppercase().as_str() {
            "PAID" | "ACTIVE" | "SUCCESS" => GatewayStatusClass::Paid,
            "EXPIRED" | "TERMINATED" | "FAILED" | "USER_DROPPED" | "CANCELLED" => GatewayStatusClass::Failed,
            "PENDING" => GatewayStatusClass::Pending,
            _ => GatewayStatusClass::Unrecognized,
        }
    }

    /// Statuses reported by a direct order-status query. An order-level `ACTIVE` means the order is still open for
    /// payment, so only `PAID` counts as paid here.
    pub fn classify_polled(status: &str) -> Self {
        match status.trim().to_ascii_uppercase().as_str() {
            "PAID" => GatewayStatusClass::Paid,
            "ACTIVE" => GatewayStatusClass::Pending,
            s => GatewayStatusClass::classify(s),
        }
    }

    pub fn target_statuses(&self) -> (PaymentStatus, OrderStatusType) {
        match self {
            GatewayStatusClass::Paid => (PaymentStatus::Captured, OrderStatusType::Confirmed),
            GatewayStatusClass::Failed => (PaymentStatus::Failed, OrderStatusType::PaymentFailed),
            GatewayStatusClass::Pending | GatewayStatusClass::Unrecognized => {
                (PaymentStatus::Pending, OrderStatusType::Pending)
            },
        }
    }
}
