//! # SPG server
//! This crate hosts the HTTP server for the storefront payment gateway. It is responsible for:
//! * Taking orders from the storefront and starting their payment, either cash on delivery or through the hosted
//!   payment gateway.
//! * Receiving signed payment webhooks from the gateway and reconciling them against stored orders.
//! * Exposing the operator actions (complete, cancel, dispatch notice) behind an operator token.
//! * Wiring the engine's order events to the email and WhatsApp notification channels.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/orders/...`: Order intake, payment verification and order lookups.
//! * `/payments/webhook`: The HMAC-authenticated gateway webhook.
//! * `/payments/status/{ref}`: The payment and order status for a gateway reference.
//! * `/api/orders/{id}/...`: Operator actions. Requires the `spg_operator_token` header.
//! * `/whatsapp/webhook`: The WhatsApp subscription handshake and inbound message hook.

pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod helpers;
pub mod integrations;
pub mod middleware;
pub mod routes;
pub mod server;
