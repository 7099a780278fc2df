use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{DeliveryStatus, Order, OrderStatusType},
    events::{EventProducers, OrderCancelledEvent, OrderSnapshot},
    order_state::{check_transition, TransitionNotAllowed},
    spg_api::{errors::OrderFlowError, notification_dispatcher::send_dispatch_notice},
    traits::{EmailSender, StorefrontDatabase},
};

/// Operator actions on existing orders: complete, cancel and send a dispatch notice.
///
/// Every action checks the order state machine first, and then applies the change as a compare-and-swap, so an action
/// racing another one is refused rather than silently applied twice.
pub struct OperatorApi<B, E> {
    db: B,
    mailer: E,
    producers: EventProducers,
}

impl<B, E> Debug for OperatorApi<B, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OperatorApi")
    }
}

impl<B, E> OperatorApi<B, E> {
    pub fn new(db: B, mailer: E, producers: EventProducers) -> Self {
        Self { db, mailer, producers }
    }
}

impl<B, E> OperatorApi<B, E>
where
    B: StorefrontDatabase,
    E: EmailSender,
{
    async fn fetch_order(&self, id: i64) -> Result<Order, OrderFlowError> {
        self.db.fetch_order(id).await?.ok_or_else(|| OrderFlowError::OrderNotFound(format!("#{id}")))
    }

    /// The status change was refused by the compare-and-swap. Reports the status that won the race.
    async fn lost_race(&self, id: i64, to: OrderStatusType) -> OrderFlowError {
        match self.fetch_order(id).await {
            Ok(order) => TransitionNotAllowed { from: order.order_status, to }.into(),
            Err(e) => e,
        }
    }

    /// Marks a confirmed order as completed and delivered.
    pub async fn complete_order(&self, id: i64) -> Result<Order, OrderFlowError> {
        let order = self.fetch_order(id).await?;
        let to = OrderStatusType::Completed;
        check_transition(order.order_status, to)?;
        let from = OrderStatusType::predecessors(to);
        match self.db.update_order_status(id, &from, to, Some(DeliveryStatus::Delivered)).await? {
            Some(order) => {
                info!("🧑‍💼️ Order {} completed", order.order_id);
                Ok(order)
            },
            None => Err(self.lost_race(id, to).await),
        }
    }

    /// Cancels a pending or confirmed order. The customer is emailed once, by the call that performed the cancellation.
    /// Stock is not returned.
    pub async fn cancel_order(&self, id: i64) -> Result<Order, OrderFlowError> {
        let order = self.fetch_order(id).await?;
        let to = OrderStatusType::Cancelled;
        check_transition(order.order_status, to)?;
        let from = OrderStatusType::predecessors(to);
        let Some(order) = self.db.update_order_status(id, &from, to, Some(DeliveryStatus::Cancelled)).await? else {
            return Err(self.lost_race(id, to).await);
        };
        info!("🧑‍💼️ Order {} cancelled", order.order_id);
        let items = self.db.fetch_order_items(id).await?;
        let snapshot = OrderSnapshot::new(order.clone(), items);
        for producer in &self.producers.order_cancelled_producer {
            producer.publish_event(OrderCancelledEvent::new(snapshot.clone())).await;
        }
        Ok(order)
    }

    /// Emails the customer that the order has shipped, at most once per order. The delivery status moves to `shipped`,
    /// except on a completed order, which stays `delivered`.
    ///
    /// The `dispatch_msg` flag is only set after the email was accepted, so a failed send can be retried.
    pub async fn send_dispatch_notice(&self, id: i64) -> Result<Order, OrderFlowError> {
        let order = self.fetch_order(id).await?;
        if order.dispatch_msg {
            return Err(OrderFlowError::DispatchAlreadySent(order.order_id));
        }
        if !can_dispatch(&order) {
            return Err(OrderFlowError::DispatchNotAllowed(order.order_status));
        }
        let items = self.db.fetch_order_items(id).await?;
        let snapshot = OrderSnapshot::new(order.clone(), items);
        send_dispatch_notice(&self.mailer, &snapshot).await.map_err(|e| {
            warn!("🧑‍💼️ Dispatch notice for {} could not be sent. {e}", order.order_id);
            OrderFlowError::Notification(e.to_string())
        })?;
        match self.db.mark_dispatch_sent(id).await? {
            Some(order) => {
                info!("🧑‍💼️ Dispatch notice for {} sent", order.order_id);
                Ok(order)
            },
            None => {
                let current = self.fetch_order(id).await?;
                if current.dispatch_msg {
                    warn!("🧑‍💼️ A concurrent dispatch notice for {} was sent while this one was in flight", order.order_id);
                    Err(OrderFlowError::DispatchAlreadySent(order.order_id))
                } else {
                    warn!(
                        "🧑‍💼️ Order {} moved to {} while its dispatch notice was in flight. Dispatch flag left unset",
                        order.order_id, current.order_status
                    );
                    Err(OrderFlowError::DispatchNotAllowed(current.order_status))
                }
            },
        }
    }
}

/// Only confirmed or completed orders are dispatched, and the delivery status must be able to reach `shipped`
/// (or already be `delivered`, which is kept).
fn can_dispatch(order: &Order) -> bool {
    matches!(order.order_status, OrderStatusType::Confirmed | OrderStatusType::Completed) &&
        (order.delivery_status == DeliveryStatus::Delivered ||
            order.delivery_status.can_transition_to(DeliveryStatus::Shipped))
}
