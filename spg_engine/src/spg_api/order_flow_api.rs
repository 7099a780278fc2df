use std::{fmt::Debug, time::Duration};

use chrono::Utc;
use log::*;
use serde_json::{json, Value};
use spg_common::{MinorUnits, DEFAULT_CURRENCY_CODE};

use crate::{
    db_types::{
        CustomerDetails,
        NewOrder,
        NewOrderItem,
        NewPayment,
        NewPaymentLog,
        Order,
        OrderId,
        OrderItem,
        OrderStatusType,
        PaymentMethod,
        PaymentStatus,
        ShippingAddress,
        VariantKey,
        ORDER_ID_PREFIX,
    },
    events::{EventProducers, OrderConfirmedEvent, OrderSnapshot},
    helpers::{estimate_delivery_date, new_gateway_order_ref},
    spg_api::{
        errors::{OrderFlowError, StockError},
        order_objects::{
            CreateOrderRequest,
            OrderCreatedResult,
            OrderDetails,
            PaymentStatusResult,
            VerifyOutcome,
        },
        webhook_objects::{GatewayStatusClass, GatewayWebhookEvent, WebhookOutcome},
    },
    traits::{GatewaySessionRequest, PaymentProvider, StockDecrement, StorefrontDatabase, StorefrontDbError},
};

/// How many fresh order ids to try when concurrent requests collide on the same one.
pub const MAX_ORDER_ID_ATTEMPTS: usize = 5;
pub const DEFAULT_VERIFY_ATTEMPTS: u32 = 6;
pub const DEFAULT_VERIFY_BACKOFF: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct OrderFlowConfig {
    pub default_currency: String,
    /// Where the gateway sends the customer after checkout. `{order_id}` is replaced by the gateway reference.
    pub return_url: Option<String>,
    /// Where the gateway pushes payment webhooks.
    pub notify_url: Option<String>,
    pub verify_attempts: u32,
    pub verify_backoff: Duration,
}

impl Default for OrderFlowConfig {
    fn default() -> Self {
        Self {
            default_currency: DEFAULT_CURRENCY_CODE.to_string(),
            return_url: None,
            notify_url: None,
            verify_attempts: DEFAULT_VERIFY_ATTEMPTS,
            verify_backoff: DEFAULT_VERIFY_BACKOFF,
        }
    }
}

/// A create-order request that passed validation.
#[derive(Debug, Clone)]
pub struct ValidatedOrder {
    pub customer: CustomerDetails,
    pub shipping_address: ShippingAddress,
    pub items: Vec<NewOrderItem>,
    pub payment_method: PaymentMethod,
    pub subtotal: MinorUnits,
    pub tax: MinorUnits,
    pub shipping: MinorUnits,
    pub total: MinorUnits,
    pub currency: String,
}

/// `OrderFlowApi` is the primary API for taking orders and driving their payments to a final state.
///
/// It covers order intake, the cash-on-delivery and hosted-gateway payment paths, the synchronous verify fallback,
/// and reconciliation of gateway webhooks. Every status change goes through a compare-and-swap in the backend, and the
/// side effects of confirming an order (stock decrements, the confirmation event) only happen in the call that
/// actually performed the `pending -> confirmed` transition.
pub struct OrderFlowApi<B, P> {
    db: B,
    gateway: P,
    producers: EventProducers,
    config: OrderFlowConfig,
}

impl<B, P> Debug for OrderFlowApi<B, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B, P> OrderFlowApi<B, P> {
    pub fn new(db: B, gateway: P, producers: EventProducers) -> Self {
        Self { db, gateway, producers, config: OrderFlowConfig::default() }
    }

    pub fn with_config(mut self, config: OrderFlowConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &OrderFlowConfig {
        &self.config
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B, P> OrderFlowApi<B, P>
where
    B: StorefrontDatabase,
    P: PaymentProvider,
{
    /// Takes a purchase intent through validation, the advisory stock check, customer resolution and persistence, and
    /// then hands the new order to the payment path selected in the request.
    pub async fn create_order(&self, request: CreateOrderRequest) -> Result<OrderCreatedResult, OrderFlowError> {
        let order = validate_order_request(request, &self.config.default_currency)?;
        self.check_stock(&order.items).await?;
        let customer_id = self.db.resolve_customer(&order.customer).await?;
        self.db.save_default_address(customer_id, &order.shipping_address).await?;
        trace!("🔄️📦️ Customer #{customer_id} resolved for {}", order.customer.email);
        let (order, items) = self.persist_order(order, customer_id).await?;
        info!("🔄️📦️ Order {} (#{}) created for {} with {} items", order.order_id, order.id, order.total, items.len());
        match order.payment_method {
            PaymentMethod::Cod => self.confirm_cod_order(order, items).await,
            PaymentMethod::Gateway => self.open_gateway_session(order).await,
        }
    }

    /// Compares every cart line with the current stock and reports all lines that cannot be satisfied.
    ///
    /// Lines for the same variant are summed before comparing. This check is advisory; the conditional decrement at
    /// confirmation time is the real guard.
    pub async fn check_stock(&self, items: &[NewOrderItem]) -> Result<(), OrderFlowError> {
        let mut requested: Vec<(VariantKey, &str, i64)> = Vec::with_capacity(items.len());
        for item in items {
            let key = item.variant_key();
            match requested.iter_mut().find(|(k, _, _)| *k == key) {
                Some((_, _, qty)) => *qty = qty.saturating_add(item.quantity),
                None => requested.push((key, item.product_name.as_str(), item.quantity)),
            }
        }
        let mut conflicts = Vec::new();
        for (key, name, quantity) in requested {
            let available = self.db.available_stock(&key).await?;
            if quantity > available {
                conflicts.push(StockError {
                    item_name: if name.is_empty() { key.product_id.clone() } else { name.to_string() },
                    item_size: key.size.clone(),
                    requested_qty: quantity,
                    available_stock: available.max(0),
                    is_out_of_stock: available <= 0,
                });
            }
        }
        if conflicts.is_empty() {
            Ok(())
        } else {
            debug!("🔄️📦️ Order rejected. {} cart lines exceed available stock", conflicts.len());
            Err(OrderFlowError::StockConflict(conflicts))
        }
    }

    async fn persist_order(
        &self,
        order: ValidatedOrder,
        customer_id: i64,
    ) -> Result<(Order, Vec<OrderItem>), OrderFlowError> {
        let estimated_delivery = estimate_delivery_date(Utc::now().date_naive());
        for attempt in 1..=MAX_ORDER_ID_ATTEMPTS {
            let order_id = self.db.next_order_id().await?;
            let new_order = NewOrder {
                order_id,
                customer_id,
                customer: order.customer.clone(),
                shipping_address: order.shipping_address.clone(),
                subtotal: order.subtotal,
                tax: order.tax,
                shipping: order.shipping,
                total: order.total,
                currency: order.currency.clone(),
                payment_method: order.payment_method,
                estimated_delivery,
            };
            match self.db.insert_order(new_order, order.items.clone()).await {
                Ok(saved) => return Ok(saved),
                Err(StorefrontDbError::OrderAlreadyExists(id)) => {
                    warn!("🔄️📦️ Order id {id} was taken by a concurrent request (attempt {attempt}). Retrying.");
                },
                Err(e) => return Err(e.into()),
            }
        }
        Err(OrderFlowError::Persistence(format!("Could not allocate a free order id after {MAX_ORDER_ID_ATTEMPTS} attempts")))
    }

    async fn confirm_cod_order(&self, order: Order, items: Vec<OrderItem>) -> Result<OrderCreatedResult, OrderFlowError> {
        let payment = NewPayment::cash_on_delivery(&order);
        let (order, payment) = self
            .db
            .confirm_cod_order(payment)
            .await?
            .ok_or(crate::order_state::TransitionNotAllowed { from: order.order_status, to: OrderStatusType::Confirmed })?;
        let payload = json!({ "orderId": order.order_id, "amount": payment.amount, "currency": payment.currency });
        self.audit(NewPaymentLog::new("cod_confirmed", payload).for_order(order.id)).await;
        self.decrement_stock_for(&order, &items).await;
        self.publish_order_confirmed(&order, items).await;
        debug!("🔄️💵️ Cash-on-delivery order {} confirmed", order.order_id);
        Ok(OrderCreatedResult::for_order(&order))
    }

    async fn open_gateway_session(&self, order: Order) -> Result<OrderCreatedResult, OrderFlowError> {
        let reference = new_gateway_order_ref();
        let request = GatewaySessionRequest {
            gateway_order_ref: reference.clone(),
            amount: order.total,
            currency: order.currency.clone(),
            customer_id: format!("cust_{}", order.customer_id),
            customer_name: order.customer.full_name(),
            customer_email: order.customer.email.clone(),
            customer_phone: order.customer.phone.clone(),
            return_url: self.config.return_url.as_ref().map(|u| u.replace("{order_id}", &reference)),
            notify_url: self.config.notify_url.clone(),
        };
        let session = match self.gateway.create_session(request).await {
            Ok(session) => session,
            Err(e) => {
                warn!("🔄️💳️ The gateway refused to open a session for order {}: {e}", order.order_id);
                self.roll_back_order(&order).await;
                return Err(OrderFlowError::Gateway(e.0));
            },
        };
        let payment = NewPayment::gateway(&order, reference.clone(), Some(session.raw.to_string()));
        if let Err(e) = self.db.insert_payment(payment).await {
            error!("🔄️💳️ Gateway session {reference} for order {} could not be stored. {e}", order.order_id);
            self.roll_back_order(&order).await;
            return Err(e.into());
        }
        let log = NewPaymentLog::new("order_created", session.raw.clone()).for_order(order.id).with_reference(&reference);
        self.audit(log).await;
        debug!("🔄️💳️ Gateway session {reference} opened for order {}", order.order_id);
        Ok(OrderCreatedResult::for_order(&order).with_gateway_session(session.session_handle, reference, &order))
    }

    async fn roll_back_order(&self, order: &Order) {
        match self.db.delete_unpaid_order(order.id).await {
            Ok(true) => debug!("🔄️💳️ Order {} has been rolled back", order.order_id),
            Ok(false) => error!("🔄️💳️ Order {} could not be rolled back. It has a payment.", order.order_id),
            Err(e) => error!("🔄️💳️ Order {} could not be rolled back. {e}", order.order_id),
        }
    }

    /// The synchronous fallback for clients that finished paying in the gateway's UI and did not wait for the
    /// webhook.
    ///
    /// The gateway is polled with a fixed backoff, up to `verify_attempts` times. A paid or failed status is reconciled
    /// exactly as a webhook would be. Anything else results in `NotYet` with the last status the gateway reported.
    pub async fn verify_payment(
        &self,
        gateway_order_ref: &str,
        order_db_id: i64,
    ) -> Result<VerifyOutcome, OrderFlowError> {
        let payment = self
            .db
            .fetch_payment_by_ref(gateway_order_ref)
            .await?
            .ok_or_else(|| OrderFlowError::PaymentNotFound(gateway_order_ref.to_string()))?;
        if payment.order_id != order_db_id {
            warn!("🔄️🔍️ Verify request for {gateway_order_ref} names order #{order_db_id}, but it pays #{}", payment.order_id);
            return Err(OrderFlowError::PaymentOrderMismatch {
                gateway_order_ref: gateway_order_ref.to_string(),
                order_db_id,
            });
        }
        let order = self
            .db
            .fetch_order(order_db_id)
            .await?
            .ok_or_else(|| OrderFlowError::OrderNotFound(format!("#{order_db_id}")))?;
        match payment.payment_status {
            PaymentStatus::Captured => return Ok(VerifyOutcome::Confirmed { order_id: order.order_id }),
            PaymentStatus::Failed => return Ok(VerifyOutcome::Failed { gateway_status: "FAILED".to_string() }),
            PaymentStatus::Pending => {},
        }
        let attempts = self.config.verify_attempts.max(1);
        let mut last_status = "UNKNOWN".to_string();
        for attempt in 1..=attempts {
            match self.gateway.fetch_status(gateway_order_ref).await {
                Ok(status) => {
                    trace!("🔄️🔍️ Attempt {attempt}: {gateway_order_ref} is {}", status.status);
                    let class = GatewayStatusClass::classify_polled(&status.status);
                    if matches!(class, GatewayStatusClass::Paid | GatewayStatusClass::Failed) {
                        let event = format!("verify_{}", status.status.to_ascii_lowercase());
                        let log = NewPaymentLog::new(event, status.raw.clone())
                            .for_order(order_db_id)
                            .with_reference(gateway_order_ref);
                        self.audit(log).await;
                        self.reconcile(gateway_order_ref, class, Some(status.raw.to_string()), status.raw).await?;
                        return if class == GatewayStatusClass::Paid {
                            Ok(VerifyOutcome::Confirmed { order_id: order.order_id })
                        } else {
                            Ok(VerifyOutcome::Failed { gateway_status: status.status })
                        };
                    }
                    last_status = status.status;
                },
                Err(e) => warn!("🔄️🔍️ Attempt {attempt}: could not fetch the status of {gateway_order_ref}. {e}"),
            }
            if attempt < attempts {
                tokio::time::sleep(self.config.verify_backoff).await;
            }
        }
        let log = NewPaymentLog::new(format!("verify_{}", last_status.to_ascii_lowercase()), json!({ "status": last_status }))
            .for_order(order_db_id)
            .with_reference(gateway_order_ref);
        self.audit(log).await;
        debug!("🔄️🔍️ {gateway_order_ref} is still {last_status} after {attempts} attempts");
        Ok(VerifyOutcome::NotYet { gateway_status: last_status })
    }

    /// Records that the customer's payment failed in the gateway UI. Replays are harmless.
    ///
    /// Returns the order if this call moved it to `payment_failed`.
    pub async fn record_payment_failure(
        &self,
        gateway_order_ref: &str,
        description: &str,
        order_db_id: i64,
    ) -> Result<Option<Order>, OrderFlowError> {
        let payment = self
            .db
            .fetch_payment_by_ref(gateway_order_ref)
            .await?
            .ok_or_else(|| OrderFlowError::PaymentNotFound(gateway_order_ref.to_string()))?;
        if payment.order_id != order_db_id {
            return Err(OrderFlowError::PaymentOrderMismatch {
                gateway_order_ref: gateway_order_ref.to_string(),
                order_db_id,
            });
        }
        let detail = json!({ "errorDescription": description });
        let order = self.reconcile(gateway_order_ref, GatewayStatusClass::Failed, None, detail).await?;
        if order.is_none() {
            debug!("🔄️❌️ Failure report for {gateway_order_ref} ignored. The payment is no longer pending.");
        }
        Ok(order)
    }

    /// Applies an authenticated gateway webhook.
    ///
    /// The raw event is always appended to the payment log. Events for unknown references are logged without an
    /// order and otherwise ignored. Replays of an event that was already applied change nothing.
    pub async fn ingest_gateway_event(
        &self,
        event: GatewayWebhookEvent,
        raw: Value,
    ) -> Result<WebhookOutcome, OrderFlowError> {
        let reference = event.data.order.order_id.clone();
        let log = NewPaymentLog::new(event.log_event_type(), raw.clone()).with_reference(&reference);
        let payment = match self.db.fetch_payment_by_ref(&reference).await {
            Ok(p) => p,
            Err(e) => {
                self.audit(log).await;
                return Err(e.into());
            },
        };
        let Some(payment) = payment else {
            info!("🪝️ Webhook {} refers to unknown reference {reference}. Logged and ignored.", event.event_type);
            self.audit(log).await;
            return Ok(WebhookOutcome::Unmatched);
        };
        self.audit(log.for_order(payment.order_id)).await;
        let status = event.reported_status().unwrap_or_default();
        let class = GatewayStatusClass::classify(status);
        if class == GatewayStatusClass::Unrecognized {
            warn!("🪝️ Webhook {} for {reference} carries unknown status '{status}'. Treated as pending.", event.event_type);
        }
        let order = self.reconcile(&reference, class, Some(raw.to_string()), raw).await?;
        Ok(WebhookOutcome::Matched { order_db_id: payment.order_id, transitioned_to: order.map(|o| o.order_status) })
    }

    /// Moves the payment and its order to the statuses implied by `class`, and fires the side effects of whichever
    /// transition this call performed. Returns the order if it changed.
    async fn reconcile(
        &self,
        gateway_order_ref: &str,
        class: GatewayStatusClass,
        response: Option<String>,
        detail: Value,
    ) -> Result<Option<Order>, OrderFlowError> {
        let (payment_status, order_status) = class.target_statuses();
        if payment_status == PaymentStatus::Pending && order_status == OrderStatusType::Pending {
            trace!("🔄️ {gateway_order_ref} is still pending. Nothing to reconcile.");
            return Ok(None);
        }
        let transition = self.db.apply_payment_outcome(gateway_order_ref, payment_status, order_status, response).await?;
        let Some(order) = transition.order else {
            if transition.payment_changed {
                warn!(
                    "🔄️ Payment {gateway_order_ref} is now {payment_status}, but order #{} was no longer pending and \
                     was left as is. This needs manual reconciliation.",
                    transition.payment.order_id
                );
            } else {
                debug!("🔄️ {gateway_order_ref} was already reconciled. No side effects.");
            }
            return Ok(None);
        };
        match order.order_status {
            OrderStatusType::Confirmed => {
                let items = self.db.fetch_order_items(order.id).await?;
                self.decrement_stock_for(&order, &items).await;
                let log = NewPaymentLog::new("payment_success", detail).for_order(order.id).with_reference(gateway_order_ref);
                self.audit(log).await;
                self.publish_order_confirmed(&order, items).await;
                info!("🔄️✅️ Order {} is paid and confirmed", order.order_id);
            },
            OrderStatusType::PaymentFailed => {
                let log = NewPaymentLog::new("payment_failed", detail).for_order(order.id).with_reference(gateway_order_ref);
                self.audit(log).await;
                info!("🔄️❌️ Payment for order {} failed", order.order_id);
            },
            status => trace!("🔄️ Order {} moved to {status}", order.order_id),
        }
        Ok(Some(order))
    }

    /// Decrements stock for every stored line of a confirmed order. Refusals do not undo the confirmation; they are
    /// logged and recorded as a `stock_shortfall` for the operator.
    async fn decrement_stock_for(&self, order: &Order, items: &[OrderItem]) {
        let mut shortfalls = Vec::new();
        for item in items {
            let key = item.variant_key();
            match self.db.decrement_stock(&key, item.quantity).await {
                Ok(StockDecrement::Decremented) => trace!("🔄️📦️ {} x {key} taken from stock", item.quantity),
                Ok(StockDecrement::Insufficient) => {
                    warn!(
                        "🔄️📦️ Inventory integrity: order {} was confirmed but {} x {key} is no longer in stock",
                        order.order_id, item.quantity
                    );
                    shortfalls.push(json!({ "productId": item.product_id, "size": item.size, "quantity": item.quantity }));
                },
                Err(e) => {
                    error!("🔄️📦️ Could not decrement stock of {key} for order {}. {e}", order.order_id);
                    shortfalls.push(json!({
                        "productId": item.product_id, "size": item.size, "quantity": item.quantity, "error": e.to_string()
                    }));
                },
            }
        }
        if !shortfalls.is_empty() {
            let log = NewPaymentLog::new("stock_shortfall", json!({ "orderId": order.order_id, "items": shortfalls }))
                .for_order(order.id);
            self.audit(log).await;
        }
    }

    async fn publish_order_confirmed(&self, order: &Order, items: Vec<OrderItem>) {
        let snapshot = OrderSnapshot::new(order.clone(), items);
        for producer in &self.producers.order_confirmed_producer {
            debug!("🔄️📬️ Notifying order confirmed hook subscribers");
            producer.publish_event(OrderConfirmedEvent::new(snapshot.clone())).await;
        }
    }

    /// Appends to the payment log. Errors are logged and otherwise ignored.
    async fn audit(&self, log: NewPaymentLog) {
        let event_type = log.event_type.clone();
        if let Err(e) = self.db.append_payment_log(log).await {
            error!("🔄️📒️ Could not append '{event_type}' to the payment log. {e}");
        }
    }

    /// Looks an order up by its human-readable id (`ORD042`) or its database id (`42`), and returns it with its items,
    /// payment and payment log.
    pub async fn fetch_order_details(&self, id: &str) -> Result<OrderDetails, OrderFlowError> {
        let id = id.trim();
        let order = if id.to_ascii_uppercase().starts_with(ORDER_ID_PREFIX) {
            self.db.fetch_order_by_order_id(&OrderId(id.to_ascii_uppercase())).await?
        } else {
            match id.parse::<i64>() {
                Ok(db_id) => self.db.fetch_order(db_id).await?,
                Err(_) => None,
            }
        };
        let order = order.ok_or_else(|| OrderFlowError::OrderNotFound(id.to_string()))?;
        let items = self.db.fetch_order_items(order.id).await?;
        let payment = self.db.fetch_payment_for_order(order.id).await?;
        let logs = self.db.fetch_payment_logs(order.id).await?;
        Ok(OrderDetails { order, items, payment, logs })
    }

    pub async fn payment_status(&self, gateway_order_ref: &str) -> Result<PaymentStatusResult, OrderFlowError> {
        let payment = self
            .db
            .fetch_payment_by_ref(gateway_order_ref)
            .await?
            .ok_or_else(|| OrderFlowError::PaymentNotFound(gateway_order_ref.to_string()))?;
        let order = self
            .db
            .fetch_order(payment.order_id)
            .await?
            .ok_or_else(|| OrderFlowError::OrderNotFound(format!("#{}", payment.order_id)))?;
        Ok(PaymentStatusResult {
            gateway_order_ref: gateway_order_ref.to_string(),
            order_id: order.order_id,
            order_db_id: order.id,
            payment_status: payment.payment_status,
            order_status: order.order_status,
            delivery_status: order.delivery_status,
        })
    }
}

/// Checks a create-order request and collects every problem with it.
pub fn validate_order_request(
    request: CreateOrderRequest,
    default_currency: &str,
) -> Result<ValidatedOrder, OrderFlowError> {
    let mut errors = Vec::new();
    let customer = request.customer.unwrap_or_default();
    if customer.first_name.trim().is_empty() {
        errors.push("customer first name is required".to_string());
    }
    if customer.last_name.trim().is_empty() {
        errors.push("customer last name is required".to_string());
    }
    if !customer.email.contains('@') {
        errors.push("a valid customer email is required".to_string());
    }
    if customer.phone.trim().is_empty() {
        errors.push("customer phone number is required".to_string());
    }
    let address = request.shipping_address.unwrap_or_default();
    for (field, value) in [
        ("address line 1", &address.address_line1),
        ("city", &address.city),
        ("state", &address.state),
        ("postal code", &address.postal_code),
        ("country", &address.country),
    ] {
        if value.trim().is_empty() {
            errors.push(format!("shipping {field} is required"));
        }
    }
    if request.items.is_empty() {
        errors.push("at least one cart item is required".to_string());
    }
    for (i, item) in request.items.iter().enumerate() {
        let n = i + 1;
        if item.product_id.trim().is_empty() {
            errors.push(format!("item {n}: product id is required"));
        }
        if item.quantity < 1 {
            errors.push(format!("item {n}: quantity must be at least 1"));
        }
        if item.unit_price.is_negative() {
            errors.push(format!("item {n}: unit price must not be negative"));
        }
        if item.unit_price.checked_mul(item.quantity).is_none() {
            errors.push(format!("item {n}: line total is too large"));
        }
    }
    let payment_method = match request.payment_method.as_deref().map(str::parse::<PaymentMethod>) {
        Some(Ok(method)) => Some(method),
        Some(Err(_)) => {
            errors.push(format!("payment method '{}' is not supported", request.payment_method.unwrap_or_default()));
            None
        },
        None => {
            errors.push("payment method is required".to_string());
            None
        },
    };
    let zero = MinorUnits::from(0);
    let tax = request.tax.unwrap_or(zero);
    let shipping = request.shipping.unwrap_or(zero);
    if request.subtotal.is_none() {
        errors.push("subtotal is required".to_string());
    }
    if request.total.is_none() {
        errors.push("total is required".to_string());
    }
    let subtotal = request.subtotal.unwrap_or(zero);
    for (field, value) in [("subtotal", subtotal), ("tax", tax), ("shipping", shipping)] {
        if value.is_negative() {
            errors.push(format!("{field} must not be negative"));
        }
    }
    let expected = subtotal.checked_add(tax).and_then(|sum| sum.checked_add(shipping));
    match (request.total, expected) {
        (_, None) => errors.push("subtotal + tax + shipping is too large".to_string()),
        (Some(total), Some(expected)) if total != expected => {
            errors.push(format!("total {total} does not equal subtotal + tax + shipping ({expected})"))
        },
        _ => {},
    }
    let currency = request
        .currency
        .map(|c| c.trim().to_ascii_uppercase())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| default_currency.to_string());
    match (payment_method, expected) {
        (Some(payment_method), Some(total)) if errors.is_empty() => Ok(ValidatedOrder {
            customer,
            shipping_address: address,
            items: request.items.into_iter().map(NewOrderItem::from).collect(),
            payment_method,
            subtotal,
            tax,
            shipping,
            total,
            currency,
        }),
        _ => Err(OrderFlowError::Validation(errors)),
    }
}
