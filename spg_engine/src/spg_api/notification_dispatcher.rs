use chrono::{DateTime, Duration, Utc};
use log::*;

use crate::{
    events::{EventHooks, OrderCancelledEvent, OrderConfirmedEvent, OrderSnapshot},
    spg_api::templates,
    traits::{EmailSender, MessagingSessions, NotificationError, OperatorMessenger},
};

/// The messaging platform only accepts free-form messages within this long of the recipient's last message to us.
pub const SESSION_WINDOW_HOURS: i64 = 24;

/// Which kind of message the operator channel accepts right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorChannel {
    /// Free-form text is allowed
    InSession,
    /// Only pre-approved templates are allowed
    OutOfSession,
}

impl OperatorChannel {
    pub fn for_last_inbound(last_inbound: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Self {
        match last_inbound {
            Some(at) if now.signed_duration_since(at) < Duration::hours(SESSION_WINDOW_HOURS) => {
                OperatorChannel::InSession
            },
            _ => OperatorChannel::OutOfSession,
        }
    }
}

/// Sends the customer and operator notifications that follow order confirmation and cancellation.
///
/// None of these sends is allowed to affect the order. The dispatcher is driven from event hooks, so every method
/// here runs on a detached task and callers only ever log the result.
#[derive(Clone)]
pub struct NotificationDispatcher<S, E, W> {
    sessions: S,
    mailer: E,
    messenger: W,
}

impl<S, E, W> NotificationDispatcher<S, E, W>
where
    S: MessagingSessions + Clone + Send + Sync + 'static,
    E: EmailSender + Clone + Send + Sync + 'static,
    W: OperatorMessenger + Clone + Send + Sync + 'static,
{
    pub fn new(sessions: S, mailer: E, messenger: W) -> Self {
        Self { sessions, mailer, messenger }
    }

    /// Emails the customer, and the operator when an operator address is configured. The operator copy is sent even
    /// if the customer email fails. The first failure is returned.
    pub async fn send_order_confirmation(&self, snapshot: &OrderSnapshot) -> Result<(), NotificationError> {
        let order = &snapshot.order;
        let to = &order.customer.email;
        let html = templates::confirmation_html(snapshot);
        let customer = self.mailer.send_email(to, &templates::confirmation_subject(order), html).await;
        match &customer {
            Ok(()) => debug!("📧️ Confirmation for {} sent to {to}", order.order_id),
            Err(e) => warn!("📧️ Confirmation for {} could not be sent to {to}. {e}", order.order_id),
        }
        let operator = match self.mailer.operator_address() {
            Some(operator) => {
                let html = templates::operator_html(snapshot);
                let sent = self.mailer.send_email(&operator, &templates::operator_subject(order), html).await;
                match &sent {
                    Ok(()) => debug!("📧️ Operator copy of {} sent", order.order_id),
                    Err(e) => warn!("📧️ Operator copy of {} could not be sent. {e}", order.order_id),
                }
                sent
            },
            None => Ok(()),
        };
        customer.and(operator)
    }

    /// Alerts the operator by instant message. Free-form text is used inside the session window, and the approved
    /// template outside it.
    pub async fn send_operator_alert(
        &self,
        snapshot: &OrderSnapshot,
        now: DateTime<Utc>,
    ) -> Result<OperatorChannel, NotificationError> {
        let phone = self.messenger.operator_phone().ok_or_else(|| NotificationError::NotConfigured("whatsapp".into()))?;
        let last_inbound = self.sessions.last_inbound_message(&phone).await?;
        let channel = OperatorChannel::for_last_inbound(last_inbound, now);
        match channel {
            OperatorChannel::InSession => {
                self.messenger.send_text(&phone, &templates::operator_alert_text(snapshot)).await?;
            },
            OperatorChannel::OutOfSession => {
                self.messenger.send_template(&phone, templates::operator_alert_parameters(snapshot)).await?;
            },
        }
        debug!("💬️ Operator alerted about {} ({channel:?})", snapshot.order.order_id);
        Ok(channel)
    }

    pub async fn send_cancellation(&self, snapshot: &OrderSnapshot) -> Result<(), NotificationError> {
        let order = &snapshot.order;
        let html = templates::cancellation_html(snapshot);
        self.mailer.send_email(&order.customer.email, &templates::cancellation_subject(order), html).await?;
        debug!("📧️ Cancellation notice for {} sent to {}", order.order_id, order.customer.email);
        Ok(())
    }

    pub async fn record_inbound_message(&self, phone: &str, at: DateTime<Utc>) -> Result<(), NotificationError> {
        self.sessions.record_inbound_message(phone, at).await?;
        Ok(())
    }

    /// Runs the confirmation email and the operator alert side by side. Failures are logged and dropped.
    pub async fn on_order_confirmed(&self, event: OrderConfirmedEvent) {
        let snapshot = &event.snapshot;
        let order_id = &snapshot.order.order_id;
        let (email, alert) =
            tokio::join!(self.send_order_confirmation(snapshot), self.send_operator_alert(snapshot, Utc::now()));
        if let Err(e) = email {
            warn!("📧️ Could not send the confirmation email for {order_id}. {e}");
        }
        match alert {
            Err(NotificationError::NotConfigured(_)) => trace!("💬️ Operator messaging is disabled"),
            Err(e) => warn!("💬️ Could not alert the operator about {order_id}. {e}"),
            Ok(_) => {},
        }
    }

    pub async fn on_order_cancelled(&self, event: OrderCancelledEvent) {
        if let Err(e) = self.send_cancellation(&event.snapshot).await {
            warn!("📧️ Could not send the cancellation email for {}. {e}", event.snapshot.order.order_id);
        }
    }

    /// Event hooks that route confirmation and cancellation events to this dispatcher.
    pub fn hooks(&self) -> EventHooks {
        let mut hooks = EventHooks::default();
        let dispatcher = self.clone();
        hooks.on_order_confirmed(move |ev| {
            let dispatcher = dispatcher.clone();
            Box::pin(async move { dispatcher.on_order_confirmed(ev).await })
        });
        let dispatcher = self.clone();
        hooks.on_order_cancelled(move |ev| {
            let dispatcher = dispatcher.clone();
            Box::pin(async move { dispatcher.on_order_cancelled(ev).await })
        });
        hooks
    }
}

/// Emails the customer that their order has shipped. Unlike the other notifications, this one is awaited by the
/// operator and its failure is reported.
pub async fn send_dispatch_notice<E: EmailSender>(mailer: &E, snapshot: &OrderSnapshot) -> Result<(), NotificationError> {
    let order = &snapshot.order;
    let html = templates::dispatch_html(snapshot);
    mailer.send_email(&order.customer.email, &templates::dispatch_subject(order), html).await?;
    debug!("📧️ Dispatch notice for {} sent to {}", order.order_id, order.customer.email);
    Ok(())
}
