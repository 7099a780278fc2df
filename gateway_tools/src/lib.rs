//! A thin client for the hosted-checkout payment gateway's REST API.
//!
//! Only the two calls the storefront needs are implemented: creating a checkout order (which yields the payment
//! session handle that the browser SDK needs) and fetching the authoritative status of an order.
mod api;
mod config;
mod data_objects;
mod error;
mod helpers;

pub use api::GatewayApi;
pub use config::GatewayConfig;
pub use data_objects::{CreateOrderRequest, CustomerDetails, GatewayOrder, OrderMeta};
pub use error::GatewayApiError;
pub use helpers::{major_units_amount, sanitize_phone};
