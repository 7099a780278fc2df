//! Webhook signature middleware for Actix Web.
//!
//! Both external parties that push webhooks to us sign the raw request body with a shared secret:
//!
//! * The payment gateway sends `x-webhook-timestamp` and `x-webhook-signature`, where the signature is
//!   base64(HMAC-SHA256(secret, timestamp + body)).
//! * WhatsApp sends `X-Hub-Signature-256: sha256=<hex HMAC-SHA256(app secret, body)>`.
//!
//! Requests without a valid signature are rejected with 401 before they reach the handler. The body is read in full to
//! check the signature and then put back, so handlers can extract it as usual.
use std::{
    future::{ready, Ready},
    rc::Rc,
};

use actix_http::h1;
use actix_web::{
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    error::{ErrorBadRequest, ErrorUnauthorized},
    http::header::HeaderMap,
    web,
    Error,
};
use futures::future::LocalBoxFuture;
use log::*;
use spg_common::Secret;

use crate::helpers::{verify_hub_signature, verify_webhook_signature};

pub const WEBHOOK_TIMESTAMP_HEADER: &str = "x-webhook-timestamp";
pub const WEBHOOK_SIGNATURE_HEADER: &str = "x-webhook-signature";
pub const HUB_SIGNATURE_HEADER: &str = "x-hub-signature-256";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureScheme {
    /// The payment gateway's timestamped base64 signature
    Gateway,
    /// WhatsApp's `X-Hub-Signature-256`
    Hub,
}

impl SignatureScheme {
    fn verify(&self, secret: &str, headers: &HeaderMap, body: &[u8]) -> Result<(), &'static str> {
        let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());
        match self {
            Self::Gateway => {
                let timestamp = header(WEBHOOK_TIMESTAMP_HEADER).ok_or("No webhook timestamp found.")?;
                let signature = header(WEBHOOK_SIGNATURE_HEADER).ok_or("No webhook signature found.")?;
                verify_webhook_signature(secret, timestamp, body, signature)
                    .then_some(())
                    .ok_or("Invalid webhook signature.")
            },
            Self::Hub => {
                let signature = header(HUB_SIGNATURE_HEADER).ok_or("No webhook signature found.")?;
                verify_hub_signature(secret, body, signature).then_some(()).ok_or("Invalid webhook signature.")
            },
        }
    }
}

pub struct SignatureMiddlewareFactory {
    scheme: SignatureScheme,
    key: Secret<String>,
    // If false, then the middleware will not check the signature and always allow the call
    enabled: bool,
}

impl SignatureMiddlewareFactory {
    pub fn new(scheme: SignatureScheme, key: Secret<String>, enabled: bool) -> Self {
        SignatureMiddlewareFactory { scheme, key, enabled }
    }
}

impl<S, B> Transform<S, ServiceRequest> for SignatureMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<B>;
    type Transform = SignatureMiddlewareService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(SignatureMiddlewareService {
            scheme: self.scheme,
            key: self.key.clone(),
            enabled: self.enabled,
            service: Rc::new(service),
        }))
    }
}

pub struct SignatureMiddlewareService<S> {
    scheme: SignatureScheme,
    key: Secret<String>,
    enabled: bool,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for SignatureMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;
    type Response = ServiceResponse<B>;

    forward_ready!(service);

    fn call(&self, mut req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let secret = self.key.reveal().clone();
        let scheme = self.scheme;
        let enabled = self.enabled;
        Box::pin(async move {
            trace!("🔐️ Checking {scheme:?} signature for request");
            if !enabled {
                trace!("🔐️ Signature checks are disabled. Allowing request.");
                return service.call(req).await;
            }
            if secret.is_empty() {
                warn!("🔐️ No {scheme:?} webhook secret is configured. Denying access.");
                return Err(ErrorUnauthorized("Webhook signing is not configured."));
            }
            let data = req.extract::<web::Bytes>().await.map_err(|e| {
                warn!("🔐️ Failed to extract request data: {:?}", e);
                ErrorBadRequest("Failed to extract request data.")
            })?;
            match scheme.verify(&secret, req.headers(), data.as_ref()) {
                Ok(()) => {
                    trace!("🔐️ Signature check for request ✅️");
                    req.set_payload(bytes_to_payload(data));
                    service.call(req).await
                },
                Err(reason) => {
                    warn!("🔐️ {reason} Denying access.");
                    Err(ErrorUnauthorized(reason))
                },
            }
        })
    }
}

fn bytes_to_payload(buf: web::Bytes) -> Payload {
    let (_, mut pl) = h1::Payload::create(true);
    pl.unread_data(buf);
    Payload::from(pl)
}
