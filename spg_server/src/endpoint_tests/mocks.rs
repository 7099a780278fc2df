use std::sync::{Arc, Mutex};

use mockall::mock;
use spg_engine::traits::{
    EmailSender,
    GatewaySession,
    GatewaySessionRequest,
    GatewayStatus,
    NotificationError,
    PaymentProvider,
    PaymentProviderError,
};

mock! {
    pub Gateway {}
    impl PaymentProvider for Gateway {
        async fn create_session(&self, request: GatewaySessionRequest) -> Result<GatewaySession, PaymentProviderError>;
        async fn fetch_status(&self, gateway_order_ref: &str) -> Result<GatewayStatus, PaymentProviderError>;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentEmail {
    pub to: String,
    pub subject: String,
}

/// Records outgoing email instead of sending it. Can be switched to fail every send.
#[derive(Clone, Default)]
pub struct TestMailer {
    sent: Arc<Mutex<Vec<SentEmail>>>,
    failing: bool,
}

impl TestMailer {
    pub fn failing() -> Self {
        Self { failing: true, ..Default::default() }
    }

    pub fn sent(&self) -> Vec<SentEmail> {
        self.sent.lock().unwrap().clone()
    }
}

impl EmailSender for TestMailer {
    fn operator_address(&self) -> Option<String> {
        None
    }

    async fn send_email(&self, to: &str, subject: &str, _html: String) -> Result<(), NotificationError> {
        if self.failing {
            return Err(NotificationError::DeliveryFailed("mail server unavailable".into()));
        }
        self.sent.lock().unwrap().push(SentEmail { to: to.to_string(), subject: subject.to_string() });
        Ok(())
    }
}
