use std::time::Duration;

use cucumber::World;
use log::*;
use spg_engine::{
    db_types::{CustomerDetails, Order, OrderId, ShippingAddress},
    events::EventHandlers,
    order_objects::{CartItem, OrderCreatedResult, VerifyOutcome},
    test_utils::prepare_env::{create_database, random_db_path, run_migrations},
    traits::StorefrontDatabase,
    OperatorApi,
    OrderFlowApi,
    OrderFlowConfig,
    OrderFlowError,
    SqliteDatabase,
};
use tokio::time::sleep;

use crate::support::fakes::{EventCounter, FakeGateway, RecordingMailer};

#[derive(Default, Debug, World)]
pub struct StorefrontWorld {
    pub system: Option<StorefrontSystem>,
    pub customer: CustomerDetails,
    pub cart: Vec<CartItem>,
    pub last_order: Option<OrderCreatedResult>,
    pub last_error: Option<OrderFlowError>,
    pub last_verify: Option<VerifyOutcome>,
}

#[derive(Debug)]
pub struct StorefrontSystem {
    pub db_path: String,
    pub api: OrderFlowApi<SqliteDatabase, FakeGateway>,
    pub operator: OperatorApi<SqliteDatabase, RecordingMailer>,
    pub gateway: FakeGateway,
    pub mailer: RecordingMailer,
    pub events: EventCounter,
}

impl StorefrontWorld {
    pub fn system(&self) -> &StorefrontSystem {
        self.system.as_ref().expect("Storefront system not initialised")
    }

    pub fn api(&self) -> &OrderFlowApi<SqliteDatabase, FakeGateway> {
        &self.system().api
    }

    pub fn db(&self) -> &SqliteDatabase {
        self.api().db()
    }

    pub async fn order(&self, order_id: &str) -> Order {
        self.db()
            .fetch_order_by_order_id(&OrderId(order_id.to_string()))
            .await
            .expect("Error fetching order")
            .unwrap_or_else(|| panic!("Order {order_id} does not exist"))
    }

    pub async fn gateway_ref(&self, order_id: &str) -> String {
        let order = self.order(order_id).await;
        let payment = self
            .db()
            .fetch_payment_for_order(order.id)
            .await
            .expect("Error fetching payment")
            .unwrap_or_else(|| panic!("Order {order_id} has no payment"));
        payment.gateway_order_ref.unwrap_or_else(|| panic!("Order {order_id} was not paid through the gateway"))
    }
}

impl StorefrontSystem {
    pub async fn new() -> Self {
        let url = prepare_test_env().await;
        let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating connection to database");
        debug!("Created database: {url}");
        sleep(Duration::from_millis(50)).await;
        let events = EventCounter::default();
        let handlers = EventHandlers::new(16, events.hooks());
        let producers = handlers.producers();
        handlers.start_handlers().await;
        let gateway = FakeGateway::default();
        let mailer = RecordingMailer::default();
        let config = OrderFlowConfig {
            return_url: Some("https://shop.example.com/order-status?ref={order_id}".into()),
            notify_url: Some("https://api.example.com/webhook".into()),
            verify_attempts: 2,
            verify_backoff: Duration::from_millis(10),
            ..Default::default()
        };
        let api = OrderFlowApi::new(db.clone(), gateway.clone(), producers.clone()).with_config(config);
        let operator = OperatorApi::new(db, mailer.clone(), producers);
        Self { db_path: url, api, operator, gateway, mailer, events }
    }
}

pub async fn prepare_test_env() -> String {
    let path = random_db_path();
    create_database(&path).await;
    run_migrations(&path).await;
    path
}

pub fn default_address() -> ShippingAddress {
    ShippingAddress {
        address_line1: "12 Harbour Road".into(),
        address_line2: None,
        city: "Kochi".into(),
        state: "Kerala".into(),
        postal_code: "682001".into(),
        country: "India".into(),
    }
}
