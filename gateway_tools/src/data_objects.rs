use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomerDetails {
    pub customer_id: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notify_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    pub order_id: String,
    pub order_amount: f64,
    pub order_currency: String,
    pub customer_details: CustomerDetails,
    pub order_meta: OrderMeta,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_note: Option<String>,
}

/// The gateway's view of an order. Only the fields the storefront cares about are typed; the full response is
/// retained as raw JSON by callers that need an audit trail.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GatewayOrder {
    #[serde(default)]
    pub cf_order_id: Option<serde_json::Value>,
    pub order_id: String,
    #[serde(default)]
    pub order_amount: f64,
    #[serde(default)]
    pub order_currency: String,
    pub order_status: String,
    #[serde(default)]
    pub payment_session_id: Option<String>,
    #[serde(default)]
    pub order_expiry_time: Option<String>,
}

impl GatewayOrder {
    pub fn is_paid(&self) -> bool {
        self.order_status.eq_ignore_ascii_case("PAID")
    }
}
