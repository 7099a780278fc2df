use spg_engine::{
    events::EventHandlers,
    traits::{EmailSender, MessagingSessions, OperatorMessenger},
    NotificationDispatcher,
};

/// Routes order confirmation and cancellation events to the customer and operator notification channels.
///
/// The handlers must be started with [`EventHandlers::start_handlers`] after the producers have been handed out.
pub fn create_notification_handlers<S, E, W>(buffer_size: usize, sessions: S, mailer: E, messenger: W) -> EventHandlers
where
    S: MessagingSessions + Clone + Send + Sync + 'static,
    E: EmailSender + Clone + Send + Sync + 'static,
    W: OperatorMessenger + Clone + Send + Sync + 'static,
{
    let dispatcher = NotificationDispatcher::new(sessions, mailer, messenger);
    EventHandlers::new(buffer_size, dispatcher.hooks())
}
