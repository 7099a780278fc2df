//! The order lifecycle.
//!
//! | From \ To       | pending | confirmed | completed | cancelled | payment_failed |
//! |-----------------|---------|-----------|-----------|-----------|----------------|
//! | pending         | -       | ✅️        | ❌️        | ✅️        | ✅️             |
//! | confirmed       | ❌️      | -         | ✅️        | ✅️        | ❌️             |
//! | completed       | ❌️      | ❌️        | -         | ❌️        | ❌️             |
//! | cancelled       | ❌️      | ❌️        | ❌️        | -         | ❌️             |
//! | payment_failed  | ❌️      | ❌️        | ❌️        | ❌️        | -              |
//!
//! `completed`, `cancelled` and `payment_failed` are terminal. Every transition is applied in the database as a
//! compare-and-swap on the current status, so of two racing writers only one observes the change.
//!
//! Delivery status moves independently: `pending -> shipped -> delivered`, and any non-delivered state may move to
//! `cancelled` when the order is cancelled.
use thiserror::Error;

use crate::db_types::{DeliveryStatus, OrderStatusType};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Order cannot move from {from} to {to}")]
pub struct TransitionNotAllowed {
    pub from: OrderStatusType,
    pub to: OrderStatusType,
}

impl OrderStatusType {
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatusType::Completed | OrderStatusType::Cancelled | OrderStatusType::PaymentFailed)
    }

    pub fn can_transition_to(&self, to: OrderStatusType) -> bool {
        use OrderStatusType::*;
        matches!(
            (self, to),
            (Pending, Confirmed) |
                (Pending, PaymentFailed) |
                (Pending, Cancelled) |
                (Confirmed, Cancelled) |
                (Confirmed, Completed)
        )
    }

    /// The statuses from which `to` can be reached.
    pub fn predecessors(to: OrderStatusType) -> Vec<OrderStatusType> {
        use OrderStatusType::*;
        [Pending, Confirmed, Completed, Cancelled, PaymentFailed]
            .into_iter()
            .filter(|from| from.can_transition_to(to))
            .collect()
    }
}

pub fn check_transition(from: OrderStatusType, to: OrderStatusType) -> Result<(), TransitionNotAllowed> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(TransitionNotAllowed { from, to })
    }
}

impl DeliveryStatus {
    pub fn can_transition_to(&self, to: DeliveryStatus) -> bool {
        use DeliveryStatus::*;
        matches!(
            (self, to),
            (Pending, Shipped) | (Shipped, Delivered) | (Pending, Delivered) | (Pending, Cancelled) | (Shipped, Cancelled)
        )
    }
}
