//! Operator token middleware.
//!
//! Operator routes are protected by a single shared token, sent in the `spg_operator_token` header. The token is
//! compared in constant time. Requests with a missing or wrong token get a 401, and when no token is configured every
//! request is refused.
use std::{pin::Pin, rc::Rc};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    error::ErrorUnauthorized,
    Error,
};
use futures::{
    future::{ok, Ready},
    Future,
};
use log::*;
use spg_common::Secret;

use crate::helpers::constant_time_eq;

pub const OPERATOR_TOKEN_HEADER: &str = "spg_operator_token";

pub struct OperatorTokenMiddlewareFactory {
    token: Secret<String>,
}

impl OperatorTokenMiddlewareFactory {
    pub fn new(token: Secret<String>) -> Self {
        OperatorTokenMiddlewareFactory { token }
    }
}

impl<S, B> Transform<S, ServiceRequest> for OperatorTokenMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<B>;
    type Transform = OperatorTokenMiddlewareService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(OperatorTokenMiddlewareService { token: self.token.clone(), service: Rc::new(service) })
    }
}

pub struct OperatorTokenMiddlewareService<S> {
    token: Secret<String>,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for OperatorTokenMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;
    type Response = ServiceResponse<B>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let token = self.token.clone();
        Box::pin(async move {
            if token.is_empty() {
                warn!("🧑‍💼️ No operator token is configured. Denying access to {}", req.path());
                return Err(ErrorUnauthorized("Operator access is not configured."));
            }
            let supplied = req.headers().get(OPERATOR_TOKEN_HEADER).map(|v| v.as_bytes()).ok_or_else(|| {
                warn!("🧑‍💼️ No operator token in request to {}. Denying access.", req.path());
                ErrorUnauthorized("No operator token found.")
            })?;
            if constant_time_eq(supplied, token.reveal().as_bytes()) {
                trace!("🧑‍💼️ Operator token for {} ✅️", req.path());
                service.call(req).await
            } else {
                warn!("🧑‍💼️ Invalid operator token in request to {}. Denying access.", req.path());
                Err(ErrorUnauthorized("Invalid operator token."))
            }
        })
    }
}
