use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    db_types::{OrderId, OrderStatusType},
    order_state::TransitionNotAllowed,
    traits::StorefrontDbError,
};

/// A cart line that cannot be satisfied from current stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockError {
    pub item_name: String,
    pub item_size: String,
    pub requested_qty: i64,
    pub available_stock: i64,
    pub is_out_of_stock: bool,
}

#[derive(Debug, Clone, Error)]
pub enum OrderFlowError {
    #[error("The order request is invalid: {}", .0.join("; "))]
    Validation(Vec<String>),
    #[error("{} cart item(s) exceed the available stock", .0.len())]
    StockConflict(Vec<StockError>),
    #[error("The payment gateway refused the request: {0}")]
    Gateway(String),
    #[error("Could not store the order: {0}")]
    Persistence(String),
    #[error("Order {0} does not exist")]
    OrderNotFound(String),
    #[error("No payment exists with reference {0}")]
    PaymentNotFound(String),
    #[error("Payment {gateway_order_ref} does not belong to order #{order_db_id}")]
    PaymentOrderMismatch { gateway_order_ref: String, order_db_id: i64 },
    #[error("{0}")]
    TransitionNotAllowed(#[from] TransitionNotAllowed),
    #[error("A dispatch notice has already been sent for order {0}")]
    DispatchAlreadySent(OrderId),
    #[error("A dispatch notice cannot be sent for an order that is {0}")]
    DispatchNotAllowed(OrderStatusType),
    #[error("Notification could not be sent: {0}")]
    Notification(String),
}

impl From<StorefrontDbError> for OrderFlowError {
    fn from(e: StorefrontDbError) -> Self {
        match e {
            StorefrontDbError::OrderIdNotFound(id) => OrderFlowError::OrderNotFound(format!("#{id}")),
            StorefrontDbError::PaymentNotFound(r) => OrderFlowError::PaymentNotFound(r),
            e => OrderFlowError::Persistence(e.to_string()),
        }
    }
}
