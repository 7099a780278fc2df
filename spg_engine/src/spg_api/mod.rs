//! # Storefront payment gateway public API
//!
//! * [`order_flow_api`] takes orders and drives their payments: order intake, cash-on-delivery confirmation, hosted
//!   gateway sessions, the verify fallback and webhook reconciliation.
//! * [`operator_api`] provides the operator actions on existing orders (complete, cancel, dispatch notice).
//! * [`notification_dispatcher`] sends the customer and operator notifications that follow confirmation and
//!   cancellation.
//!
//! The other submodules are request, response and error types.
//!
//! # API usage
//!
//! An API instance is created by supplying the backends that implement the traits it needs:
//!
//! ```rust,ignore
//! use spg_engine::{events::EventProducers, OrderFlowApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url(...).await?;
//! let api = OrderFlowApi::new(db, my_gateway, EventProducers::default());
//! let result = api.create_order(request).await?;
//! ```
pub mod errors;
pub mod notification_dispatcher;
pub mod operator_api;
pub mod order_flow_api;
pub mod order_objects;
pub mod templates;
pub mod webhook_objects;
