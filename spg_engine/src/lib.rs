//! Storefront Payment Engine
//!
//! The engine takes storefront orders and drives them to a final, consistent state across the database, a hosted
//! payment gateway and the notification channels. It is provider-agnostic: the gateway and the messaging channels are
//! traits, implemented by the server.
//!
//! The library is divided into these sections:
//! 1. Data types ([`mod@db_types`]) and the order lifecycle ([`mod@order_state`]).
//! 2. Backend contracts ([`mod@traits`]) and the SQLite backend ([`SqliteDatabase`]). You should never need to access
//!    the database directly. Instead, use the public API.
//! 3. The public API ([`mod@spg_api`]): order intake, payments, webhook reconciliation, operator actions and
//!    notifications.
//!
//! The engine also emits events when orders are confirmed or cancelled. A simple actor framework ([`mod@events`]) lets
//! you hook into these events and run side effects, such as sending emails, on detached tasks.
pub mod db_types;
pub mod events;
pub mod helpers;
pub mod order_state;
pub mod spg_api;
pub mod traits;

#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

#[cfg(feature = "sqlite")]
pub use sqlite::{db, SqliteDatabase};
pub use spg_api::{
    errors::{OrderFlowError, StockError},
    notification_dispatcher::{NotificationDispatcher, OperatorChannel},
    operator_api::OperatorApi,
    order_flow_api::{OrderFlowApi, OrderFlowConfig},
    order_objects,
    webhook_objects,
};
