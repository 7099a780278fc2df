use actix_web::{
    body::MessageBody,
    http::StatusCode,
    test,
    test::TestRequest,
    web::ServiceConfig,
    App,
};
use log::debug;
use serde_json::{json, Value};
use spg_engine::{
    db_types::VariantKey,
    events::EventProducers,
    order_objects::{CreateOrderRequest, OrderCreatedResult},
    test_utils::prepare_env::{drop_database, prepare_test_env, random_db_path},
    traits::{GatewaySession, PaymentProviderError},
    OrderFlowApi,
    OrderFlowConfig,
    SqliteDatabase,
};

use super::mocks::MockGateway;
use crate::server::json_config;

pub const SESSION_HANDLE: &str = "session_a1VXIPJo8kh7IBigVXX8LgTMupQW";

/// A throwaway database with a little stock in it.
pub struct TestShop {
    pub url: String,
    pub db: SqliteDatabase,
}

impl TestShop {
    pub async fn new() -> Self {
        let url = random_db_path();
        prepare_test_env(&url).await;
        let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating connection to database");
        db.upsert_variant(&VariantKey::new("linen-shirt", "M"), 249_900, 5).await.expect("Error adding stock");
        db.upsert_variant(&VariantKey::new("canvas-tote", "OS"), 89_900, 1).await.expect("Error adding stock");
        Self { url, db }
    }

    pub fn orders_api(&self, gateway: MockGateway) -> OrderFlowApi<SqliteDatabase, MockGateway> {
        let config = OrderFlowConfig { verify_attempts: 1, ..OrderFlowConfig::default() };
        OrderFlowApi::new(self.db.clone(), gateway, EventProducers::default()).with_config(config)
    }

    /// Places an order directly through the engine, bypassing HTTP.
    pub async fn place_order(&self, payment_method: &str) -> OrderCreatedResult {
        let api = self.orders_api(session_gateway());
        api.create_order(order_request(payment_method, 1)).await.expect("Could not place order")
    }

    pub async fn close(self) {
        self.db.close().await;
        drop_database(&self.url).await;
    }
}

/// A gateway that opens sessions and expects nothing else.
pub fn session_gateway() -> MockGateway {
    let mut gateway = MockGateway::new();
    gateway
        .expect_create_session()
        .returning(|req| Ok(GatewaySession { session_handle: SESSION_HANDLE.into(), raw: json!({ "order_id": req.gateway_order_ref, "order_status": "ACTIVE", "payment_session_id": SESSION_HANDLE }) }));
    gateway
}

/// A gateway that refuses every new session.
pub fn rejecting_gateway(message: &str) -> MockGateway {
    let message = message.to_string();
    let mut gateway = MockGateway::new();
    gateway.expect_create_session().returning(move |_| Err(PaymentProviderError(message.clone())));
    gateway
}

/// A cart with `shirts` linen shirts in size M.
pub fn order_request(payment_method: &str, shirts: i64) -> CreateOrderRequest {
    serde_json::from_value(order_json(payment_method, shirts)).expect("Invalid order request")
}

pub fn order_json(payment_method: &str, shirts: i64) -> Value {
    let subtotal = 249_900 * shirts;
    json!({
        "customer": { "firstName": "Ada", "lastName": "Lovelace", "email": "ada@example.com", "phone": "+919800000001" },
        "shippingAddress": {
            "addressLine1": "12 Harbour Road",
            "city": "Kochi",
            "state": "Kerala",
            "postalCode": "682001",
            "country": "India"
        },
        "items": [
            { "productId": "linen-shirt", "productName": "Linen Shirt", "size": "M", "quantity": shirts, "unitPrice": 249_900 }
        ],
        "paymentMethod": payment_method,
        "subtotal": subtotal,
        "tax": 0,
        "shipping": 5_000,
        "total": subtotal + 5_000
    })
}

/// Sends a request to a fresh app, and returns the status and body. Errors raised by middleware are rendered the same
/// way the server would render them.
pub async fn send_request<F>(req: TestRequest, configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) {
    let app = App::new().app_data(json_config()).configure(configure);
    let service = test::init_service(app).await;
    debug!("Making request");
    match test::try_call_service(&service, req.to_request()).await {
        Ok(res) => {
            let status = res.status();
            let body = test::read_body(res).await;
            (status, String::from_utf8_lossy(&body).into_owned())
        },
        Err(e) => {
            let res = e.error_response();
            let status = res.status();
            let body = res.into_body().try_into_bytes().unwrap_or_default();
            (status, String::from_utf8_lossy(&body).into_owned())
        },
    }
}

pub fn parse(body: &str) -> Value {
    serde_json::from_str(body).unwrap_or_else(|e| panic!("Body is not JSON ({e}): {body}"))
}
