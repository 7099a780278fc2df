//! # Backend and collaborator contracts
//!
//! The engine is written against these traits rather than against concrete databases or third-party APIs.
//!
//! * [`StorefrontDatabase`] is the highest level of behaviour a persistence backend must provide: orders, items,
//!   payments and the payment audit log. It requires [`StockLedger`] and [`CustomerManagement`].
//! * [`StockLedger`] is the only component that mutates inventory. Decrements are atomic and conditional.
//! * [`CustomerManagement`] resolves customers from contact details and keeps their default shipping address.
//! * [`MessagingSessions`] tracks when the operator last messaged us, which decides the WhatsApp channel.
//! * [`PaymentProvider`] is the hosted payment gateway.
//! * [`EmailSender`] and [`OperatorMessenger`] are the outbound notification channels.
mod customer_management;
mod messaging;
mod payment_provider;
mod stock_ledger;
mod storefront_database;

pub use customer_management::CustomerManagement;
pub use messaging::{EmailSender, MessagingSessions, NotificationError, OperatorMessenger};
pub use payment_provider::{GatewaySession, GatewaySessionRequest, GatewayStatus, PaymentProvider, PaymentProviderError};
pub use stock_ledger::{StockDecrement, StockLedger};
pub use storefront_database::{PaymentTransition, StorefrontDatabase, StorefrontDbError};
