use std::sync::Arc;

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
    Method,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::{config::GatewayConfig, data_objects::CreateOrderRequest, GatewayApiError, GatewayOrder};

#[derive(Clone)]
pub struct GatewayApi {
    config: GatewayConfig,
    client: Arc<Client>,
}

impl GatewayApi {
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayApiError> {
        let mut headers = HeaderMap::with_capacity(4);
        let id = HeaderValue::from_str(config.client_id.as_str())
            .map_err(|e| GatewayApiError::Initialization(e.to_string()))?;
        let mut secret = HeaderValue::from_str(config.client_secret.reveal().as_str())
            .map_err(|e| GatewayApiError::Initialization(e.to_string()))?;
        secret.set_sensitive(true);
        let version = HeaderValue::from_str(config.api_version.as_str())
            .map_err(|e| GatewayApiError::Initialization(e.to_string()))?;
        headers.insert("x-client-id", id);
        headers.insert("x-client-secret", secret);
        headers.insert("x-api-version", version);
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| GatewayApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    /// Sends a request and returns the raw JSON body alongside its typed form.
    pub async fn rest_query<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<B>,
    ) -> Result<(T, Value), GatewayApiError> {
        let url = self.url(path);
        trace!("Sending REST query: {url}");
        let mut req = self.client.request(method, url);
        if let Some(body) = body {
            req = req.json(&body);
        }
        let response = req.send().await.map_err(|e| GatewayApiError::RestResponseError(e.to_string()))?;
        if response.status().is_success() {
            trace!("REST query successful. {}", response.status());
            let raw = response.json::<Value>().await.map_err(|e| GatewayApiError::JsonError(e.to_string()))?;
            if raw.is_null() {
                return Err(GatewayApiError::EmptyResponse);
            }
            let typed = serde_json::from_value(raw.clone()).map_err(|e| GatewayApiError::JsonError(e.to_string()))?;
            Ok((typed, raw))
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| GatewayApiError::RestResponseError(e.to_string()))?;
            Err(GatewayApiError::QueryError { status, message })
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url.trim_end_matches('/'))
    }

    /// Registers a checkout order with the gateway. The response carries the `payment_session_id` that the
    /// storefront hands to the browser checkout.
    pub async fn create_order(&self, request: &CreateOrderRequest) -> Result<(GatewayOrder, Value), GatewayApiError> {
        debug!("Creating gateway order {} for {:.2} {}", request.order_id, request.order_amount, request.order_currency);
        let result = self.rest_query::<GatewayOrder, &CreateOrderRequest>(Method::POST, "/orders", Some(request)).await?;
        info!("Created gateway order {} with status {}", result.0.order_id, result.0.order_status);
        Ok(result)
    }

    /// Fetches the authoritative status of an order from the gateway.
    pub async fn fetch_order(&self, order_id: &str) -> Result<(GatewayOrder, Value), GatewayApiError> {
        let path = format!("/orders/{order_id}");
        debug!("Fetching gateway order {order_id}");
        let result = self.rest_query::<GatewayOrder, ()>(Method::GET, &path, None).await?;
        debug!("Gateway order {order_id} has status {}", result.0.order_status);
        Ok(result)
    }
}
