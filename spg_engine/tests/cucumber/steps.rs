use std::time::Duration;

use cucumber::{then, when};
use serde_json::json;
use spg_common::MinorUnits;
use spg_engine::{
    db_types::{CustomerDetails, OrderStatusType, PaymentStatus},
    order_objects::CreateOrderRequest,
    traits::StorefrontDatabase,
    webhook_objects::{GatewayWebhookEvent, WebhookOutcome},
    OrderFlowError,
};

use crate::{
    cucumber::{storefront_world::default_address, StorefrontWorld},
    support::all_orders,
};

const SHIPPING_FEE: i64 = 5_000;

fn checkout_request(world: &StorefrontWorld, payment_method: &str) -> CreateOrderRequest {
    let customer = if world.customer == CustomerDetails::default() {
        CustomerDetails {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: "ada@example.com".into(),
            phone: "+919800000001".into(),
        }
    } else {
        world.customer.clone()
    };
    let subtotal = world.cart.iter().map(|i| i.unit_price * i.quantity).sum::<MinorUnits>();
    let shipping = MinorUnits::from(SHIPPING_FEE);
    CreateOrderRequest {
        customer: Some(customer),
        shipping_address: Some(default_address()),
        items: world.cart.clone(),
        payment_method: Some(payment_method.to_string()),
        subtotal: Some(subtotal),
        tax: Some(MinorUnits::from(0)),
        shipping: Some(shipping),
        total: Some(MinorUnits::from(subtotal.value() + SHIPPING_FEE)),
        currency: None,
    }
}

fn record<T>(world: &mut StorefrontWorld, result: Result<T, OrderFlowError>) -> Option<T> {
    match result {
        Ok(v) => {
            world.last_error = None;
            Some(v)
        },
        Err(e) => {
            world.last_error = Some(e);
            None
        },
    }
}

#[when(expr = "the customer checks out with {word}")]
async fn checkout(world: &mut StorefrontWorld, payment_method: String) {
    let request = checkout_request(world, &payment_method);
    let result = world.api().create_order(request).await;
    let order = record(world, result);
    world.last_order = order;
}

#[when(expr = "the gateway sends a {word} webhook for order {word}")]
async fn webhook_for_order(world: &mut StorefrontWorld, status: String, order_id: String) {
    let reference = world.gateway_ref(&order_id).await;
    send_webhook(world, &reference, &status).await;
}

#[when(expr = "the gateway sends a {word} webhook for reference {word}")]
async fn webhook_for_reference(world: &mut StorefrontWorld, status: String, reference: String) {
    let outcome = send_webhook(world, &reference, &status).await;
    assert_eq!(outcome, Some(WebhookOutcome::Unmatched));
}

async fn send_webhook(world: &mut StorefrontWorld, reference: &str, status: &str) -> Option<WebhookOutcome> {
    let raw = json!({
        "type": "PAYMENT_SUCCESS_WEBHOOK",
        "data": {
            "order": { "order_id": reference, "order_status": status },
            "payment": { "payment_status": status }
        }
    });
    let event: GatewayWebhookEvent = serde_json::from_value(raw.clone()).expect("Malformed webhook event");
    let result = world.api().ingest_gateway_event(event, raw).await;
    record(world, result)
}

#[when(expr = "the customer verifies the payment for order {word}")]
async fn verify_payment(world: &mut StorefrontWorld, order_id: String) {
    let reference = world.gateway_ref(&order_id).await;
    let order = world.order(&order_id).await;
    let result = world.api().verify_payment(&reference, order.id).await;
    let outcome = record(world, result);
    world.last_verify = outcome;
}

#[when(expr = "the customer reports a failed payment for order {word}")]
async fn report_failure(world: &mut StorefrontWorld, order_id: String) {
    let reference = world.gateway_ref(&order_id).await;
    let order = world.order(&order_id).await;
    let result = world.api().record_payment_failure(&reference, "Card declined", order.id).await;
    record(world, result);
}

#[when(expr = "the operator completes order {word}")]
async fn complete_order(world: &mut StorefrontWorld, order_id: String) {
    let order = world.order(&order_id).await;
    let result = world.system().operator.complete_order(order.id).await;
    record(world, result);
}

#[when(expr = "the operator cancels order {word}")]
async fn cancel_order(world: &mut StorefrontWorld, order_id: String) {
    let order = world.order(&order_id).await;
    let result = world.system().operator.cancel_order(order.id).await;
    record(world, result);
}

#[when(expr = "the operator sends the dispatch notice for order {word}")]
async fn dispatch_notice(world: &mut StorefrontWorld, order_id: String) {
    let order = world.order(&order_id).await;
    let result = world.system().operator.send_dispatch_notice(order.id).await;
    record(world, result);
}

#[when(expr = "I pause for {int}ms")]
async fn pause(_world: &mut StorefrontWorld, ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

#[then(expr = "the new order id is {word}")]
async fn new_order_id(world: &mut StorefrontWorld, order_id: String) {
    let order = world.last_order.as_ref().expect("No order was created");
    assert_eq!(order.order_id.as_str(), order_id);
}

#[then(expr = "order {word} is {word}")]
async fn order_status(world: &mut StorefrontWorld, order_id: String, status: String) {
    let expected = status.parse::<OrderStatusType>().expect("Invalid order status");
    let order = world.order(&order_id).await;
    assert_eq!(order.order_status, expected);
}

#[then(expr = "order {word} has delivery status {word}")]
async fn delivery_status(world: &mut StorefrontWorld, order_id: String, status: String) {
    let order = world.order(&order_id).await;
    assert_eq!(order.delivery_status.to_string(), status);
}

#[then(expr = "the payment for order {word} is {word} by {word}")]
async fn payment_status(world: &mut StorefrontWorld, order_id: String, status: String, method: String) {
    let order = world.order(&order_id).await;
    let payment = world
        .db()
        .fetch_payment_for_order(order.id)
        .await
        .expect("Error fetching payment")
        .expect("Order has no payment");
    assert_eq!(payment.payment_status.to_string(), status);
    assert_eq!(payment.payment_method.to_string(), method);
    assert_eq!(payment.amount, order.total);
}

#[then(expr = "order {word} has no payment")]
async fn no_payment(world: &mut StorefrontWorld, order_id: String) {
    let order = world.order(&order_id).await;
    let payment = world.db().fetch_payment_for_order(order.id).await.expect("Error fetching payment");
    assert!(payment.is_none(), "Unexpected payment {payment:?}");
}

#[then(expr = "the order is rejected with {int} stock error(s)")]
async fn stock_errors(world: &mut StorefrontWorld, count: usize) {
    match world.last_error.as_ref() {
        Some(OrderFlowError::StockConflict(errors)) => assert_eq!(errors.len(), count, "{errors:?}"),
        other => panic!("Expected a stock conflict, got {other:?}"),
    }
}

#[then(expr = "the stock error for {word} in size {word} asks for {int} with {int} available")]
async fn stock_error_detail(world: &mut StorefrontWorld, product_id: String, size: String, requested: i64, available: i64) {
    let Some(OrderFlowError::StockConflict(errors)) = world.last_error.as_ref() else {
        panic!("Expected a stock conflict, got {:?}", world.last_error);
    };
    let name = format!("Product {product_id}");
    let error = errors
        .iter()
        .find(|e| e.item_name == name && e.item_size == size)
        .unwrap_or_else(|| panic!("No stock error for {product_id} {size}: {errors:?}"));
    assert_eq!(error.requested_qty, requested);
    assert_eq!(error.available_stock, available);
    assert_eq!(error.is_out_of_stock, available == 0);
}

#[then(expr = "the request fails with {string}")]
async fn request_fails(world: &mut StorefrontWorld, message: String) {
    let error = world.last_error.as_ref().expect("The request did not fail");
    assert_eq!(error.to_string(), message);
}

#[then("the request succeeds")]
async fn request_succeeds(world: &mut StorefrontWorld) {
    assert!(world.last_error.is_none(), "Unexpected error: {:?}", world.last_error);
}

#[then(expr = "there are {int} order(s)")]
async fn order_count(world: &mut StorefrontWorld, count: usize) {
    let orders = all_orders(world.db()).await;
    assert_eq!(orders.len(), count);
}

#[then(expr = "{word} in size {word} has {int} left in stock")]
async fn stock_left(world: &mut StorefrontWorld, product_id: String, size: String, stock: i64) {
    use spg_engine::{db_types::VariantKey, traits::StockLedger};
    let available = world.db().available_stock(&VariantKey::new(&product_id, &size)).await.expect("Error reading stock");
    assert_eq!(available, stock);
}

#[then(expr = "the payment log for order {word} has {int} {word} entry/entries")]
async fn log_entries(world: &mut StorefrontWorld, order_id: String, count: usize, event_type: String) {
    let order = world.order(&order_id).await;
    let logs = world.db().fetch_payment_logs(order.id).await.expect("Error fetching logs");
    let matching = logs.iter().filter(|l| l.event_type == event_type).count();
    let all = logs.iter().map(|l| l.event_type.as_str()).collect::<Vec<_>>();
    assert_eq!(matching, count, "Payment log: {all:?}");
}

#[then(expr = "the payment log for reference {word} has {int} unmatched entry/entries")]
async fn unmatched_entries(world: &mut StorefrontWorld, reference: String, count: usize) {
    let logs = world.db().fetch_payment_logs_for_ref(&reference).await.expect("Error fetching logs");
    assert_eq!(logs.len(), count);
    assert!(logs.iter().all(|l| l.order_id.is_none()));
}

#[then(expr = "{int} order confirmed event(s) fired")]
async fn confirmed_events(world: &mut StorefrontWorld, count: usize) {
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(world.system().events.confirmed(), count);
}

#[then(expr = "{int} order cancelled event(s) fired")]
async fn cancelled_events(world: &mut StorefrontWorld, count: usize) {
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(world.system().events.cancelled(), count);
}

#[then(expr = "orders {word} and {word} belong to the same customer")]
async fn same_customer(world: &mut StorefrontWorld, a: String, b: String) {
    let a = world.order(&a).await;
    let b = world.order(&b).await;
    assert_eq!(a.customer_id, b.customer_id);
}

#[then(expr = "orders {word} and {word} belong to different customers")]
async fn different_customers(world: &mut StorefrontWorld, a: String, b: String) {
    let a = world.order(&a).await;
    let b = world.order(&b).await;
    assert_ne!(a.customer_id, b.customer_id);
}

#[then(expr = "the verification outcome is {word}")]
async fn verification_outcome(world: &mut StorefrontWorld, status: String) {
    let outcome = world.last_verify.as_ref().expect("No verification outcome");
    let json = serde_json::to_value(outcome).expect("Error serializing outcome");
    assert_eq!(json["status"], status);
}

#[then(expr = "the gateway was asked for {int} payment session(s)")]
async fn session_count(world: &mut StorefrontWorld, count: usize) {
    assert_eq!(world.system().gateway.sessions().len(), count);
}

#[then(expr = "the checkout result carries the gateway session for order {word}")]
async fn checkout_session(world: &mut StorefrontWorld, order_id: String) {
    let result = world.last_order.as_ref().expect("No order was created");
    let reference = world.gateway_ref(&order_id).await;
    assert_eq!(result.gateway_order_ref.as_deref(), Some(reference.as_str()));
    assert_eq!(result.gateway_session_handle, Some(format!("session_{reference}")));
    let order = world.order(&order_id).await;
    assert_eq!(result.amount, Some(order.total));
    let session = world.system().gateway.sessions().pop().expect("No session was opened");
    assert_eq!(session.amount, order.total);
    assert_eq!(session.customer_id, format!("cust_{}", order.customer_id));
    assert_eq!(session.return_url, Some(format!("https://shop.example.com/order-status?ref={reference}")));
}

#[then(expr = "the mailer sent {int} email(s) about {string}")]
async fn emails_sent(world: &mut StorefrontWorld, count: usize, subject: String) {
    assert_eq!(world.system().mailer.sent_with_subject(&subject), count);
}

#[then(expr = "the dispatch notice for order {word} is marked as sent")]
async fn dispatch_marked(world: &mut StorefrontWorld, order_id: String) {
    assert!(world.order(&order_id).await.dispatch_msg);
}

#[then(expr = "the dispatch notice for order {word} is not marked as sent")]
async fn dispatch_not_marked(world: &mut StorefrontWorld, order_id: String) {
    assert!(!world.order(&order_id).await.dispatch_msg);
}

#[then(expr = "the payment for order {word} is no longer pending")]
async fn payment_settled(world: &mut StorefrontWorld, order_id: String) {
    let order = world.order(&order_id).await;
    let payment = world.db().fetch_payment_for_order(order.id).await.expect("Error fetching payment");
    assert!(payment.map(|p| p.payment_status != PaymentStatus::Pending).unwrap_or(false));
}
