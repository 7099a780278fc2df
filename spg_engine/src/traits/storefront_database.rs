use thiserror::Error;

use crate::{
    db_types::{
        DeliveryStatus,
        NewOrder,
        NewOrderItem,
        NewPayment,
        NewPaymentLog,
        Order,
        OrderId,
        OrderItem,
        OrderStatusType,
        Payment,
        PaymentLog,
        PaymentStatus,
    },
    traits::{CustomerManagement, StockLedger},
};

/// The outcome of applying a gateway result to a payment and its order.
#[derive(Debug, Clone)]
pub struct PaymentTransition {
    /// The payment as it is after the update.
    pub payment: Payment,
    /// True if this call moved the payment out of `pending`.
    pub payment_changed: bool,
    /// `Some` only if this call performed the order's status transition.
    pub order: Option<Order>,
}

/// This trait defines the highest level of behaviour for backends supporting the storefront payment gateway.
///
/// Every status change is a compare-and-swap: the caller states which status it expects the row to have, and the
/// backend only applies the change (and reports it) if that expectation held. This is what makes webhook
/// redelivery, concurrent verify calls and double-clicked operator buttons safe.
#[allow(async_fn_in_trait)]
pub trait StorefrontDatabase: Clone + StockLedger + CustomerManagement {
    /// The URL of the database
    fn url(&self) -> &str;

    /// The next free human-readable order id: one more than the highest `ORD` sequence in use, or `ORD001`.
    async fn next_order_id(&self) -> Result<OrderId, StorefrontDbError>;

    /// Writes the order and all its items in a single atomic transaction. Either everything is stored, or nothing.
    ///
    /// Returns [`StorefrontDbError::OrderAlreadyExists`] if the `order_id` is taken.
    async fn insert_order(
        &self,
        order: NewOrder,
        items: Vec<NewOrderItem>,
    ) -> Result<(Order, Vec<OrderItem>), StorefrontDbError>;

    /// Removes an order (and its items) that never got a payment record. Used when the gateway refuses to create a
    /// checkout session. Orders with a payment are never deleted.
    async fn delete_unpaid_order(&self, id: i64) -> Result<bool, StorefrontDbError>;

    async fn fetch_order(&self, id: i64) -> Result<Option<Order>, StorefrontDbError>;

    async fn fetch_order_by_order_id(&self, order_id: &OrderId) -> Result<Option<Order>, StorefrontDbError>;

    async fn fetch_order_items(&self, id: i64) -> Result<Vec<OrderItem>, StorefrontDbError>;

    /// In one transaction: stores the cash-on-delivery payment and moves the order from `pending` to `confirmed`.
    ///
    /// Returns `None` (and stores nothing) if the order was not `pending`.
    async fn confirm_cod_order(&self, payment: NewPayment) -> Result<Option<(Order, Payment)>, StorefrontDbError>;

    async fn insert_payment(&self, payment: NewPayment) -> Result<Payment, StorefrontDbError>;

    async fn fetch_payment_by_ref(&self, gateway_order_ref: &str) -> Result<Option<Payment>, StorefrontDbError>;

    async fn fetch_payment_for_order(&self, order_id: i64) -> Result<Option<Payment>, StorefrontDbError>;

    /// In one transaction: moves the payment from `pending` to `payment_status` and its order from `pending` to
    /// `order_status`. Either move is skipped if the row is no longer `pending`, or if the target is `pending`.
    async fn apply_payment_outcome(
        &self,
        gateway_order_ref: &str,
        payment_status: PaymentStatus,
        order_status: OrderStatusType,
        gateway_response: Option<String>,
    ) -> Result<PaymentTransition, StorefrontDbError>;

    /// Moves the order to `to` if, and only if, its current status is one of `from`. Optionally sets the delivery
    /// status in the same statement. Returns the updated order when the swap happened.
    async fn update_order_status(
        &self,
        id: i64,
        from: &[OrderStatusType],
        to: OrderStatusType,
        delivery: Option<DeliveryStatus>,
    ) -> Result<Option<Order>, StorefrontDbError>;

    /// Sets `dispatch_msg` and marks the order as shipped, if the flag was not yet set.
    async fn mark_dispatch_sent(&self, id: i64) -> Result<Option<Order>, StorefrontDbError>;

    async fn append_payment_log(&self, log: NewPaymentLog) -> Result<PaymentLog, StorefrontDbError>;

    async fn fetch_payment_logs(&self, order_id: i64) -> Result<Vec<PaymentLog>, StorefrontDbError>;

    async fn fetch_payment_logs_for_ref(&self, gateway_order_ref: &str) -> Result<Vec<PaymentLog>, StorefrontDbError>;
}

#[derive(Debug, Clone, Error)]
pub enum StorefrontDbError {
    #[error("We have an internal database engine (configuration/uptime etc.) : {0}")]
    DatabaseError(String),
    #[error("Cannot insert order, since it already exists with id {0}")]
    OrderAlreadyExists(OrderId),
    #[error("Cannot insert payment, since one already exists for {0}")]
    PaymentAlreadyExists(String),
    #[error("The requested order (internal id {0}) does not exist")]
    OrderIdNotFound(i64),
    #[error("The requested payment does not exist for reference {0}")]
    PaymentNotFound(String),
    #[error("Could not resolve customer: {0}")]
    CustomerError(String),
}

impl From<sqlx::Error> for StorefrontDbError {
    fn from(e: sqlx::Error) -> Self {
        StorefrontDbError::DatabaseError(e.to_string())
    }
}
