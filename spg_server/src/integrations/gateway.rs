use gateway_tools::{
    major_units_amount,
    sanitize_phone,
    CreateOrderRequest,
    CustomerDetails,
    GatewayApi,
    GatewayApiError,
    GatewayConfig,
    OrderMeta,
};
use log::*;
use spg_engine::traits::{GatewaySession, GatewaySessionRequest, GatewayStatus, PaymentProvider, PaymentProviderError};

/// The hosted checkout gateway, as seen by the order flow.
#[derive(Clone)]
pub struct HostedGateway {
    api: GatewayApi,
}

impl HostedGateway {
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayApiError> {
        let api = GatewayApi::new(config)?;
        Ok(Self { api })
    }
}

/// Maps a session request to the gateway's create-order payload. Amounts go over the wire in major units.
pub fn to_gateway_request(request: GatewaySessionRequest) -> CreateOrderRequest {
    CreateOrderRequest {
        order_amount: major_units_amount(request.amount),
        order_currency: request.currency,
        customer_details: CustomerDetails {
            customer_id: request.customer_id,
            customer_name: request.customer_name,
            customer_email: request.customer_email,
            customer_phone: sanitize_phone(&request.customer_phone),
        },
        order_meta: OrderMeta { return_url: request.return_url, notify_url: request.notify_url },
        order_note: None,
        order_id: request.gateway_order_ref,
    }
}

impl PaymentProvider for HostedGateway {
    async fn create_session(&self, request: GatewaySessionRequest) -> Result<GatewaySession, PaymentProviderError> {
        let reference = request.gateway_order_ref.clone();
        let (order, raw) = self.api.create_order(&to_gateway_request(request)).await.map_err(|e| {
            warn!("💳️ Gateway refused to open a session for {reference}. {e}");
            PaymentProviderError(e.gateway_message())
        })?;
        let session_handle = order.payment_session_id.filter(|s| !s.is_empty()).ok_or_else(|| {
            warn!("💳️ Gateway accepted {reference} but returned no payment session id");
            PaymentProviderError("The gateway did not return a payment session".to_string())
        })?;
        debug!("💳️ Gateway order {} is {}", order.order_id, order.order_status);
        Ok(GatewaySession { session_handle, raw })
    }

    async fn fetch_status(&self, gateway_order_ref: &str) -> Result<GatewayStatus, PaymentProviderError> {
        let (order, raw) = self.api.fetch_order(gateway_order_ref).await.map_err(|e| {
            warn!("💳️ Could not fetch gateway order {gateway_order_ref}. {e}");
            PaymentProviderError(e.gateway_message())
        })?;
        Ok(GatewayStatus { status: order.order_status, raw })
    }
}
