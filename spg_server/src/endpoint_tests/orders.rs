use actix_web::{http::StatusCode, test::TestRequest, web};
use serde_json::{json, Value};
use spg_engine::{
    traits::{GatewayStatus, PaymentProviderError},
    SqliteDatabase,
};

use super::{
    helpers::{order_json, parse, rejecting_gateway, send_request, session_gateway, TestShop, SESSION_HANDLE},
    mocks::MockGateway,
};
use crate::routes::{
    health,
    CreateOrderRoute,
    OrderDetailsRoute,
    PaymentFailedRoute,
    PaymentStatusRoute,
    VerifyPaymentRoute,
};

async fn order_request(shop: &TestShop, gateway: MockGateway, req: TestRequest) -> (StatusCode, String) {
    let api = web::Data::new(shop.orders_api(gateway));
    send_request(req, move |cfg| {
        cfg.app_data(api)
            .service(CreateOrderRoute::<SqliteDatabase, MockGateway>::new())
            .service(VerifyPaymentRoute::<SqliteDatabase, MockGateway>::new())
            .service(PaymentFailedRoute::<SqliteDatabase, MockGateway>::new())
            .service(OrderDetailsRoute::<SqliteDatabase, MockGateway>::new())
            .service(PaymentStatusRoute::<SqliteDatabase, MockGateway>::new());
    })
    .await
}

fn create(body: Value) -> TestRequest {
    TestRequest::post().uri("/orders/create").set_json(body)
}

#[actix_web::test]
async fn health_check() {
    let (status, body) = send_request(TestRequest::get().uri("/health"), |cfg| {
        cfg.service(health);
    })
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "👍️\n");
}

#[actix_web::test]
async fn cash_on_delivery_order_is_confirmed_immediately() {
    let shop = TestShop::new().await;
    let mut gateway = MockGateway::new();
    gateway.expect_create_session().never();
    let (status, body) = order_request(&shop, gateway, create(order_json("cod", 2))).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let result = parse(&body);
    assert_eq!(result["orderId"], "ORD001");
    assert_eq!(result["paymentMethod"], "cod");
    assert!(result["gatewaySessionHandle"].is_null());

    let (status, body) = order_request(&shop, MockGateway::new(), TestRequest::get().uri("/orders/ORD001")).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let details = parse(&body);
    assert_eq!(details["order"]["orderStatus"], "confirmed");
    assert_eq!(details["order"]["customer"]["email"], "ada@example.com");
    assert_eq!(details["items"].as_array().map(|a| a.len()), Some(1));
    shop.close().await;
}

#[actix_web::test]
async fn stock_conflicts_are_reported_per_item() {
    let shop = TestShop::new().await;
    let mut body = order_json("cod", 6);
    body["items"].as_array_mut().unwrap().push(json!({
        "productId": "canvas-tote", "productName": "Canvas Tote", "size": "OS", "quantity": 2, "unitPrice": 89_900
    }));
    body["subtotal"] = json!(6 * 249_900 + 2 * 89_900);
    body["total"] = json!(6 * 249_900 + 2 * 89_900 + 5_000);
    let (status, body) = order_request(&shop, MockGateway::new(), create(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    let result = parse(&body);
    let errors = result["stockErrors"].as_array().expect("stockErrors missing");
    assert_eq!(errors.len(), 2);
    assert_eq!(errors[0]["itemName"], "Linen Shirt");
    assert_eq!(errors[0]["requestedQty"], 6);
    assert_eq!(errors[0]["availableStock"], 5);
    assert_eq!(errors[1]["itemName"], "Canvas Tote");
    assert_eq!(errors[1]["isOutOfStock"], false);

    let (status, _) = order_request(&shop, MockGateway::new(), TestRequest::get().uri("/orders/ORD001")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    shop.close().await;
}

#[actix_web::test]
async fn invalid_orders_are_refused() {
    let shop = TestShop::new().await;
    let mut body = order_json("cod", 1);
    body["total"] = json!(1);
    body["customer"]["email"] = json!("not-an-email");
    let (status, body) = order_request(&shop, MockGateway::new(), create(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    let error = parse(&body)["error"].as_str().unwrap_or_default().to_string();
    assert!(error.starts_with("The order request is invalid"), "{error}");

    let mut body = order_json("bitcoin", 1);
    body["items"] = json!([]);
    let (status, _) = order_request(&shop, MockGateway::new(), create(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    shop.close().await;
}

#[actix_web::test]
async fn oversized_amounts_are_refused() {
    let shop = TestShop::new().await;
    let mut body = order_json("cod", 1);
    body["subtotal"] = json!(i64::MAX);
    body["shipping"] = json!(1);
    body["total"] = json!(i64::MAX);
    let (status, body) = order_request(&shop, MockGateway::new(), create(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    let error = parse(&body)["error"].as_str().unwrap_or_default().to_string();
    assert!(error.contains("subtotal + tax + shipping is too large"), "{error}");

    let mut body = order_json("cod", 2);
    body["items"][0]["unitPrice"] = json!(i64::MAX);
    let (status, _) = order_request(&shop, MockGateway::new(), create(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = order_request(&shop, MockGateway::new(), TestRequest::get().uri("/orders/ORD001")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    shop.close().await;
}

#[actix_web::test]
async fn malformed_json_is_refused() {
    let shop = TestShop::new().await;
    let req = TestRequest::post()
        .uri("/orders/create")
        .insert_header(("content-type", "application/json"))
        .set_payload("{\"customer\": ");
    let (status, body) = order_request(&shop, MockGateway::new(), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(parse(&body)["error"].is_string());
    shop.close().await;
}

#[actix_web::test]
async fn gateway_order_returns_a_session() {
    let shop = TestShop::new().await;
    let (status, body) = order_request(&shop, session_gateway(), create(order_json("gateway", 1))).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let result = parse(&body);
    assert_eq!(result["orderId"], "ORD001");
    assert_eq!(result["gatewaySessionHandle"], SESSION_HANDLE);
    assert_eq!(result["amount"], 254_900);
    let reference = result["gatewayOrderRef"].as_str().expect("No gateway reference");
    assert!(reference.starts_with("spg_"));

    let uri = format!("/payments/status/{reference}");
    let (status, body) = order_request(&shop, MockGateway::new(), TestRequest::get().uri(&uri)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let status = parse(&body);
    assert_eq!(status["paymentStatus"], "pending");
    assert_eq!(status["orderStatus"], "pending");
    shop.close().await;
}

#[actix_web::test]
async fn gateway_refusal_rolls_the_order_back() {
    let shop = TestShop::new().await;
    let gateway = rejecting_gateway("customer_details.customer_phone : invalid phone number");
    let (status, body) = order_request(&shop, gateway, create(order_json("gateway", 1))).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    let error = parse(&body)["error"].as_str().unwrap_or_default().to_string();
    assert!(!error.contains("phone"), "Gateway details leaked: {error}");

    let (status, _) = order_request(&shop, MockGateway::new(), TestRequest::get().uri("/orders/ORD001")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    shop.close().await;
}

#[actix_web::test]
async fn verify_confirms_a_paid_order() {
    let shop = TestShop::new().await;
    let created = shop.place_order("gateway").await;
    let reference = created.gateway_order_ref.clone().expect("No gateway reference");
    let mut gateway = MockGateway::new();
    gateway
        .expect_fetch_status()
        .times(1)
        .returning(|r| Ok(GatewayStatus { status: "PAID".into(), raw: json!({ "order_id": r, "order_status": "PAID" }) }));
    let req = TestRequest::post()
        .uri("/orders/verify")
        .set_json(json!({ "gatewayOrderRef": reference, "orderDbId": created.order_db_id }));
    let (status, body) = order_request(&shop, gateway, req).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(parse(&body), json!({ "status": "confirmed", "orderId": "ORD001" }));

    // A second verify is answered from the database
    let mut gateway = MockGateway::new();
    gateway.expect_fetch_status().never();
    let req = TestRequest::post()
        .uri("/orders/verify")
        .set_json(json!({ "gatewayOrderRef": reference, "orderDbId": created.order_db_id }));
    let (status, body) = order_request(&shop, gateway, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse(&body)["status"], "confirmed");
    shop.close().await;
}

#[actix_web::test]
async fn verify_reports_unsettled_payments() {
    let shop = TestShop::new().await;
    let created = shop.place_order("gateway").await;
    let reference = created.gateway_order_ref.clone().expect("No gateway reference");
    let mut gateway = MockGateway::new();
    gateway.expect_fetch_status().returning(|_| Err(PaymentProviderError("timeout".into())));
    let req = TestRequest::post()
        .uri("/orders/verify")
        .set_json(json!({ "gatewayOrderRef": reference, "orderDbId": created.order_db_id }));
    let (status, body) = order_request(&shop, gateway, req).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(parse(&body)["status"], "not_yet");

    let req = TestRequest::post()
        .uri("/orders/verify")
        .set_json(json!({ "gatewayOrderRef": reference, "orderDbId": created.order_db_id + 1 }));
    let (status, _) = order_request(&shop, MockGateway::new(), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    shop.close().await;
}

#[actix_web::test]
async fn payment_failure_marks_the_order() {
    let shop = TestShop::new().await;
    let created = shop.place_order("gateway").await;
    let reference = created.gateway_order_ref.clone().expect("No gateway reference");
    let req = TestRequest::post().uri("/orders/failed").set_json(json!({
        "gatewayOrderRef": reference,
        "errorDescription": "Card declined",
        "orderDbId": created.order_db_id
    }));
    let (status, body) = order_request(&shop, MockGateway::new(), req).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(parse(&body)["message"], "Order ORD001 is now payment_failed");

    let uri = format!("/orders/{}", created.order_db_id);
    let (_, body) = order_request(&shop, MockGateway::new(), TestRequest::get().uri(&uri)).await;
    assert_eq!(parse(&body)["order"]["orderStatus"], "payment_failed");
    shop.close().await;
}

#[actix_web::test]
async fn unknown_references_are_not_found() {
    let shop = TestShop::new().await;
    let req = TestRequest::get().uri("/payments/status/spg_1717000000000_00000000000000aa");
    let (status, body) = order_request(&shop, MockGateway::new(), req).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(parse(&body)["error"].as_str().unwrap_or_default().contains("spg_1717000000000_00000000000000aa"));
    shop.close().await;
}
