use serde_json::Value;
use spg_common::MinorUnits;
use thiserror::Error;

/// Everything the gateway needs to open a hosted checkout for an order.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewaySessionRequest {
    pub gateway_order_ref: String,
    pub amount: MinorUnits,
    pub currency: String,
    pub customer_id: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub return_url: Option<String>,
    pub notify_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GatewaySession {
    /// The handle the browser checkout needs to complete the payment
    pub session_handle: String,
    /// The gateway's full response, kept for the audit log
    pub raw: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GatewayStatus {
    /// The gateway's order status, verbatim, e.g. `PAID` or `ACTIVE`
    pub status: String,
    pub raw: Value,
}

/// The gateway refused or failed a request. The message is the gateway's own, verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct PaymentProviderError(pub String);

#[allow(async_fn_in_trait)]
pub trait PaymentProvider {
    async fn create_session(&self, request: GatewaySessionRequest) -> Result<GatewaySession, PaymentProviderError>;

    async fn fetch_status(&self, gateway_order_ref: &str) -> Result<GatewayStatus, PaymentProviderError>;
}
