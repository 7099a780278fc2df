use serde::{Deserialize, Serialize};

use crate::db_types::{Order, OrderItem};

/// An order together with its line items, as it was at the moment the event was raised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSnapshot {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

impl OrderSnapshot {
    pub fn new(order: Order, items: Vec<OrderItem>) -> Self {
        Self { order, items }
    }
}

/// Raised exactly once per order, by whichever flow performed the `pending -> confirmed` transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderConfirmedEvent {
    pub snapshot: OrderSnapshot,
}

impl OrderConfirmedEvent {
    pub fn new(snapshot: OrderSnapshot) -> Self {
        Self { snapshot }
    }
}

/// Raised exactly once per order, when an operator cancels it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderCancelledEvent {
    pub snapshot: OrderSnapshot,
}

impl OrderCancelledEvent {
    pub fn new(snapshot: OrderSnapshot) -> Self {
        Self { snapshot }
    }
}
