use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
        Mutex,
    },
};

use serde_json::json;
use spg_engine::{
    events::{EventHooks, OrderCancelledEvent, OrderConfirmedEvent},
    traits::{
        EmailSender,
        GatewaySession,
        GatewaySessionRequest,
        GatewayStatus,
        NotificationError,
        OperatorMessenger,
        PaymentProvider,
        PaymentProviderError,
    },
};

#[derive(Debug, Default)]
struct GatewayState {
    rejection: Option<String>,
    statuses: HashMap<String, String>,
    default_status: Option<String>,
    sessions: Vec<GatewaySessionRequest>,
    polls: usize,
}

/// A payment gateway that opens sessions in memory and reports whatever status the test sets.
#[derive(Debug, Clone, Default)]
pub struct FakeGateway {
    state: Arc<Mutex<GatewayState>>,
}

impl FakeGateway {
    pub fn reject_with(&self, message: &str) {
        self.state.lock().unwrap().rejection = Some(message.to_string());
    }

    pub fn set_status(&self, gateway_order_ref: &str, status: &str) {
        self.state.lock().unwrap().statuses.insert(gateway_order_ref.to_string(), status.to_string());
    }

    pub fn set_default_status(&self, status: &str) {
        self.state.lock().unwrap().default_status = Some(status.to_string());
    }

    pub fn sessions(&self) -> Vec<GatewaySessionRequest> {
        self.state.lock().unwrap().sessions.clone()
    }

    pub fn polls(&self) -> usize {
        self.state.lock().unwrap().polls
    }
}

impl PaymentProvider for FakeGateway {
    async fn create_session(&self, request: GatewaySessionRequest) -> Result<GatewaySession, PaymentProviderError> {
        let mut state = self.state.lock().unwrap();
        if let Some(message) = &state.rejection {
            return Err(PaymentProviderError(message.clone()));
        }
        let handle = format!("session_{}", request.gateway_order_ref);
        let raw = json!({
            "order_id": request.gateway_order_ref,
            "payment_session_id": handle,
            "order_status": "ACTIVE"
        });
        state.sessions.push(request);
        Ok(GatewaySession { session_handle: handle, raw })
    }

    async fn fetch_status(&self, gateway_order_ref: &str) -> Result<GatewayStatus, PaymentProviderError> {
        let mut state = self.state.lock().unwrap();
        state.polls += 1;
        let status = state
            .statuses
            .get(gateway_order_ref)
            .cloned()
            .or_else(|| state.default_status.clone())
            .unwrap_or_else(|| "ACTIVE".to_string());
        let raw = json!({ "order_id": gateway_order_ref, "order_status": status });
        Ok(GatewayStatus { status, raw })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// Records emails instead of sending them. Can be switched into a failing mode.
#[derive(Debug, Clone, Default)]
pub struct RecordingMailer {
    sent: Arc<Mutex<Vec<SentEmail>>>,
    failing: Arc<AtomicBool>,
    refused: Arc<Mutex<Vec<String>>>,
    operator: Option<String>,
}

impl RecordingMailer {
    pub fn with_operator(mut self, address: &str) -> Self {
        self.operator = Some(address.to_string());
        self
    }

    pub fn fail(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Mail to this address bounces while everything else is delivered.
    pub fn refuse(&self, address: &str) {
        self.refused.lock().unwrap().push(address.to_string());
    }

    pub fn sent(&self) -> Vec<SentEmail> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_with_subject(&self, fragment: &str) -> usize {
        self.sent().iter().filter(|e| e.subject.contains(fragment)).count()
    }
}

impl EmailSender for RecordingMailer {
    fn operator_address(&self) -> Option<String> {
        self.operator.clone()
    }

    async fn send_email(&self, to: &str, subject: &str, html: String) -> Result<(), NotificationError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(NotificationError::DeliveryFailed("mail server is down".into()));
        }
        if self.refused.lock().unwrap().iter().any(|a| a == to) {
            return Err(NotificationError::DeliveryFailed(format!("{to} bounced")));
        }
        self.sent.lock().unwrap().push(SentEmail { to: to.to_string(), subject: subject.to_string(), html });
        Ok(())
    }
}

/// Records operator messages instead of sending them.
#[derive(Debug, Clone, Default)]
pub struct RecordingMessenger {
    phone: Option<String>,
    texts: Arc<Mutex<Vec<(String, String)>>>,
    templates: Arc<Mutex<Vec<(String, Vec<String>)>>>,
}

impl RecordingMessenger {
    pub fn for_operator(phone: &str) -> Self {
        Self { phone: Some(phone.to_string()), ..Default::default() }
    }

    pub fn texts(&self) -> Vec<(String, String)> {
        self.texts.lock().unwrap().clone()
    }

    pub fn templates(&self) -> Vec<(String, Vec<String>)> {
        self.templates.lock().unwrap().clone()
    }
}

impl OperatorMessenger for RecordingMessenger {
    fn operator_phone(&self) -> Option<String> {
        self.phone.clone()
    }

    async fn send_text(&self, to: &str, body: &str) -> Result<(), NotificationError> {
        self.texts.lock().unwrap().push((to.to_string(), body.to_string()));
        Ok(())
    }

    async fn send_template(&self, to: &str, parameters: Vec<String>) -> Result<(), NotificationError> {
        self.templates.lock().unwrap().push((to.to_string(), parameters));
        Ok(())
    }
}

/// Counts confirmation and cancellation events.
#[derive(Debug, Clone, Default)]
pub struct EventCounter {
    confirmed: Arc<AtomicUsize>,
    cancelled: Arc<AtomicUsize>,
}

impl EventCounter {
    pub fn confirmed(&self) -> usize {
        self.confirmed.load(Ordering::SeqCst)
    }

    pub fn cancelled(&self) -> usize {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub fn hooks(&self) -> EventHooks {
        let mut hooks = EventHooks::default();
        let confirmed = Arc::clone(&self.confirmed);
        hooks.on_order_confirmed(move |_ev: OrderConfirmedEvent| {
            let confirmed = Arc::clone(&confirmed);
            Box::pin(async move {
                confirmed.fetch_add(1, Ordering::SeqCst);
            })
        });
        let cancelled = Arc::clone(&self.cancelled);
        hooks.on_order_cancelled(move |_ev: OrderCancelledEvent| {
            let cancelled = Arc::clone(&cancelled);
            Box::pin(async move {
                cancelled.fetch_add(1, Ordering::SeqCst);
            })
        });
        hooks
    }
}
