use chrono::Utc;
use cucumber::given;
use spg_common::MinorUnits;
use spg_engine::{
    db_types::{CustomerDetails, NewOrder, NewOrderItem, OrderId, PaymentMethod, VariantKey},
    helpers::estimate_delivery_date,
    order_objects::CartItem,
    traits::{CustomerManagement, StorefrontDatabase},
};

use crate::cucumber::{
    storefront_world::{default_address, StorefrontSystem},
    StorefrontWorld,
};

pub const UNIT_PRICE: i64 = 49_900;

#[given("a fresh install")]
async fn fresh_database(world: &mut StorefrontWorld) {
    let system = StorefrontSystem::new().await;
    world.system = Some(system);
}

#[given(expr = "variant {word} in size {word} has {int} in stock")]
async fn stock_variant(world: &mut StorefrontWorld, product_id: String, size: String, stock: i64) {
    let key = VariantKey::new(&product_id, &size);
    world.db().upsert_variant(&key, UNIT_PRICE, stock).await.expect("Error stocking variant");
}

#[given(expr = "the customer is {word} {word} with email {word} and phone {word}")]
async fn set_customer(world: &mut StorefrontWorld, first_name: String, last_name: String, email: String, phone: String) {
    world.customer = CustomerDetails { first_name, last_name, email, phone };
}

#[given(expr = "a cart with {int} x {word} in size {word}")]
async fn add_to_cart(world: &mut StorefrontWorld, quantity: i64, product_id: String, size: String) {
    world.cart.push(CartItem {
        product_name: format!("Product {product_id}"),
        product_id,
        size,
        quantity,
        unit_price: MinorUnits::from(UNIT_PRICE),
    });
}

#[given(expr = "the gateway rejects new sessions with {string}")]
async fn gateway_rejects(world: &mut StorefrontWorld, message: String) {
    world.system().gateway.reject_with(&message);
}

#[given(expr = "the gateway reports {word} for order {word}")]
async fn gateway_reports(world: &mut StorefrontWorld, status: String, order_id: String) {
    let reference = world.gateway_ref(&order_id).await;
    world.system().gateway.set_status(&reference, &status);
}

#[given("the mail server is down")]
async fn mail_server_down(world: &mut StorefrontWorld) {
    world.system().mailer.fail(true);
}

#[given("the mail server is back up")]
async fn mail_server_up(world: &mut StorefrontWorld) {
    world.system().mailer.fail(false);
}

#[given(expr = "an order {word} already exists")]
async fn existing_order(world: &mut StorefrontWorld, order_id: String) {
    let customer = CustomerDetails {
        first_name: "Grace".into(),
        last_name: "Hopper".into(),
        email: "grace@example.com".into(),
        phone: "+15550000001".into(),
    };
    let db = world.db();
    let customer_id = db.resolve_customer(&customer).await.expect("Error creating customer");
    let item = NewOrderItem {
        product_id: "legacy".into(),
        product_name: "Legacy item".into(),
        size: "OS".into(),
        quantity: 1,
        unit_price: MinorUnits::from(1_000),
    };
    let order = NewOrder {
        order_id: OrderId(order_id),
        customer_id,
        customer,
        shipping_address: default_address(),
        subtotal: MinorUnits::from(1_000),
        tax: MinorUnits::from(0),
        shipping: MinorUnits::from(0),
        total: MinorUnits::from(1_000),
        currency: "INR".into(),
        payment_method: PaymentMethod::Cod,
        estimated_delivery: estimate_delivery_date(Utc::now().date_naive()),
    };
    db.insert_order(order, vec![item]).await.expect("Error inserting order");
}
