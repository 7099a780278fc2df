use actix_web::{http::StatusCode, test::TestRequest, web};
use spg_common::Secret;
use spg_engine::{events::EventProducers, OperatorApi, SqliteDatabase};

use super::{
    helpers::{parse, send_request, TestShop},
    mocks::TestMailer,
};
use crate::{
    middleware::{OperatorTokenMiddlewareFactory, OPERATOR_TOKEN_HEADER},
    routes::{CancelOrderRoute, CompleteOrderRoute, DispatchNoticeRoute},
};

const TOKEN: &str = "op_7d1e6b2c";

async fn operator_request(shop: &TestShop, mailer: TestMailer, req: TestRequest) -> (StatusCode, String) {
    let api = web::Data::new(OperatorApi::new(shop.db.clone(), mailer, EventProducers::default()));
    send_request(req, move |cfg| {
        let scope = web::scope("/api")
            .wrap(OperatorTokenMiddlewareFactory::new(Secret::new(TOKEN.to_string())))
            .service(CompleteOrderRoute::<SqliteDatabase, TestMailer>::new())
            .service(CancelOrderRoute::<SqliteDatabase, TestMailer>::new())
            .service(DispatchNoticeRoute::<SqliteDatabase, TestMailer>::new());
        cfg.app_data(api).service(scope);
    })
    .await
}

fn put(uri: &str) -> TestRequest {
    TestRequest::put().uri(uri).insert_header((OPERATOR_TOKEN_HEADER, TOKEN))
}

fn dispatch(id: i64) -> TestRequest {
    TestRequest::post().uri(&format!("/api/orders/{id}/dispatch-notice")).insert_header((OPERATOR_TOKEN_HEADER, TOKEN))
}

#[actix_web::test]
async fn operator_token_is_required() {
    let shop = TestShop::new().await;
    let created = shop.place_order("cod").await;
    let uri = format!("/api/orders/{}/complete", created.order_db_id);
    let (status, _) = operator_request(&shop, TestMailer::default(), TestRequest::put().uri(&uri)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let req = TestRequest::put().uri(&uri).insert_header((OPERATOR_TOKEN_HEADER, "op_7d1e6b2d"));
    let (status, _) = operator_request(&shop, TestMailer::default(), req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    shop.close().await;
}

#[actix_web::test]
async fn complete_a_confirmed_order() {
    let shop = TestShop::new().await;
    let created = shop.place_order("cod").await;
    let uri = format!("/api/orders/{}/complete", created.order_db_id);
    let (status, body) = operator_request(&shop, TestMailer::default(), put(&uri)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let response = parse(&body);
    assert_eq!(response["message"], "Order ORD001 completed");
    assert_eq!(response["order"]["orderStatus"], "completed");
    assert_eq!(response["order"]["deliveryStatus"], "delivered");

    let (status, _) = operator_request(&shop, TestMailer::default(), put(&uri)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    shop.close().await;
}

#[actix_web::test]
async fn pending_orders_cannot_be_completed() {
    let shop = TestShop::new().await;
    let created = shop.place_order("gateway").await;
    let uri = format!("/api/orders/{}/complete", created.order_db_id);
    let (status, body) = operator_request(&shop, TestMailer::default(), put(&uri)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(parse(&body)["error"], "Order cannot move from pending to completed");
    shop.close().await;
}

#[actix_web::test]
async fn cancel_only_once() {
    let shop = TestShop::new().await;
    let created = shop.place_order("gateway").await;
    let uri = format!("/api/orders/{}/cancel", created.order_db_id);
    let (status, body) = operator_request(&shop, TestMailer::default(), put(&uri)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(parse(&body)["order"]["orderStatus"], "cancelled");

    let (status, _) = operator_request(&shop, TestMailer::default(), put(&uri)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    shop.close().await;
}

#[actix_web::test]
async fn dispatch_notice_is_sent_once() {
    let shop = TestShop::new().await;
    let created = shop.place_order("cod").await;
    let mailer = TestMailer::default();
    let (status, body) = operator_request(&shop, mailer.clone(), dispatch(created.order_db_id)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let response = parse(&body);
    assert_eq!(response["message"], "Dispatch notice sent to ada@example.com");
    assert_eq!(response["order"]["dispatchMsg"], true);
    let sent = mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "ada@example.com");

    let (status, _) = operator_request(&shop, mailer.clone(), dispatch(created.order_db_id)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(mailer.sent().len(), 1);
    shop.close().await;
}

#[actix_web::test]
async fn dispatch_after_completion_keeps_the_order_delivered() {
    let shop = TestShop::new().await;
    let created = shop.place_order("cod").await;
    let uri = format!("/api/orders/{}/complete", created.order_db_id);
    let (status, body) = operator_request(&shop, TestMailer::default(), put(&uri)).await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let mailer = TestMailer::default();
    let (status, body) = operator_request(&shop, mailer.clone(), dispatch(created.order_db_id)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let response = parse(&body);
    assert_eq!(response["order"]["orderStatus"], "completed");
    assert_eq!(response["order"]["deliveryStatus"], "delivered");
    assert_eq!(response["order"]["dispatchMsg"], true);
    assert_eq!(mailer.sent().len(), 1);
    shop.close().await;
}

#[actix_web::test]
async fn cancelled_orders_cannot_be_dispatched() {
    let shop = TestShop::new().await;
    let created = shop.place_order("cod").await;
    let uri = format!("/api/orders/{}/cancel", created.order_db_id);
    let (status, body) = operator_request(&shop, TestMailer::default(), put(&uri)).await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let mailer = TestMailer::default();
    let (status, body) = operator_request(&shop, mailer.clone(), dispatch(created.order_db_id)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(parse(&body)["error"], "A dispatch notice cannot be sent for an order that is cancelled");
    assert!(mailer.sent().is_empty());
    shop.close().await;
}

#[actix_web::test]
async fn failed_dispatch_notices_can_be_retried() {
    let shop = TestShop::new().await;
    let created = shop.place_order("cod").await;
    let (status, _) = operator_request(&shop, TestMailer::failing(), dispatch(created.order_db_id)).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);

    let mailer = TestMailer::default();
    let (status, body) = operator_request(&shop, mailer.clone(), dispatch(created.order_db_id)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(mailer.sent().len(), 1);
    shop.close().await;
}

#[actix_web::test]
async fn pending_orders_cannot_be_dispatched() {
    let shop = TestShop::new().await;
    let created = shop.place_order("gateway").await;
    let mailer = TestMailer::default();
    let (status, _) = operator_request(&shop, mailer.clone(), dispatch(created.order_db_id)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(mailer.sent().is_empty());
    shop.close().await;
}

#[actix_web::test]
async fn unknown_orders_are_not_found() {
    let shop = TestShop::new().await;
    let (status, body) = operator_request(&shop, TestMailer::default(), put("/api/orders/404/cancel")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(parse(&body)["error"], "The data was not found. Order #404 does not exist");
    shop.close().await;
}
