//! Request handler definitions
//!
//! Define each route and it handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. Anything that waits on I/O (the database, the payment gateway, the
//! verify backoff) is expressed as a future, so that the worker can serve other requests in the meantime:
//!
//! ```nocompile
//!     async fn my_handler() -> impl Responder {
//!         tokio::time::sleep(Duration::from_secs(5)).await; // <-- Ok. Worker thread will handle other requests here
//!     }
//! ```
use actix_web::{get, web, HttpResponse, Responder};
use chrono::Utc;
use log::*;
use serde_json::Value;
use spg_engine::{
    order_objects::{CreateOrderRequest, PaymentFailureRequest, VerifyPaymentRequest},
    traits::{EmailSender, MessagingSessions, PaymentProvider, StorefrontDatabase},
    webhook_objects::{GatewayWebhookEvent, WebhookOutcome},
    OperatorApi,
    OrderFlowApi,
};

use crate::{
    data_objects::{JsonResponse, OperatorActionResponse, SubscriptionQuery, SubscriptionToken, WhatsAppWebhook},
    errors::ServerError,
    helpers::constant_time_eq,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Orders  ----------------------------------------------------

route!(create_order => Post "/orders/create" impl StorefrontDatabase, PaymentProvider);
/// Takes a storefront cart and starts its payment.
///
/// Cash-on-delivery orders are confirmed immediately. Gateway orders come back with the session handle the browser
/// checkout needs, and stay pending until the gateway reports the payment. A cart that exceeds the available stock is
/// refused with a 400 that lists every offending line in `stockErrors`.
pub async fn create_order<B, P>(
    body: web::Json<CreateOrderRequest>,
    api: web::Data<OrderFlowApi<B, P>>,
) -> Result<HttpResponse, ServerError>
where
    B: StorefrontDatabase,
    P: PaymentProvider,
{
    let request = body.into_inner();
    debug!("💻️ POST create_order with {} cart line(s)", request.items.len());
    let result = api.create_order(request).await.map_err(|e| {
        debug!("💻️ Order was not created. {e}");
        e
    })?;
    info!("💻️ Order {} created ({})", result.order_id, result.payment_method);
    Ok(HttpResponse::Ok().json(result))
}

route!(verify_payment => Post "/orders/verify" impl StorefrontDatabase, PaymentProvider);
/// The fallback for a browser that returns from the gateway before the webhook has arrived. Polls the gateway and
/// reconciles the payment if it has settled.
pub async fn verify_payment<B, P>(
    body: web::Json<VerifyPaymentRequest>,
    api: web::Data<OrderFlowApi<B, P>>,
) -> Result<HttpResponse, ServerError>
where
    B: StorefrontDatabase,
    P: PaymentProvider,
{
    let request = body.into_inner();
    debug!("💻️ POST verify_payment({}, #{})", request.gateway_order_ref, request.order_db_id);
    let outcome = api.verify_payment(&request.gateway_order_ref, request.order_db_id).await?;
    Ok(HttpResponse::Ok().json(outcome))
}

route!(payment_failed => Post "/orders/failed" impl StorefrontDatabase, PaymentProvider);
pub async fn payment_failed<B, P>(
    body: web::Json<PaymentFailureRequest>,
    api: web::Data<OrderFlowApi<B, P>>,
) -> Result<HttpResponse, ServerError>
where
    B: StorefrontDatabase,
    P: PaymentProvider,
{
    let request = body.into_inner();
    debug!("💻️ POST payment_failed({}): {}", request.gateway_order_ref, request.error_description);
    let changed = api
        .record_payment_failure(&request.gateway_order_ref, &request.error_description, request.order_db_id)
        .await?;
    let response = match changed {
        Some(order) => JsonResponse::success(format!("Order {} is now {}", order.order_id, order.order_status)),
        None => JsonResponse::success("The payment is no longer pending. Nothing was changed."),
    };
    Ok(HttpResponse::Ok().json(response))
}

route!(order_details => Get "/orders/{order_id}" impl StorefrontDatabase, PaymentProvider);
/// Fetches an order by its order id (`ORD042`) or its database id (`42`), with its items, payment and payment log.
pub async fn order_details<B, P>(
    path: web::Path<String>,
    api: web::Data<OrderFlowApi<B, P>>,
) -> Result<HttpResponse, ServerError>
where
    B: StorefrontDatabase,
    P: PaymentProvider,
{
    let id = path.into_inner();
    debug!("💻️ GET order_details({id})");
    let details = api.fetch_order_details(&id).await?;
    Ok(HttpResponse::Ok().json(details))
}

//----------------------------------------------   Payments  ----------------------------------------------------

route!(payment_webhook => Post "" impl StorefrontDatabase, PaymentProvider);
/// The gateway's payment webhook. Must be wrapped in the signature middleware.
///
/// Once a request is authenticated, the response is always a 200, otherwise the gateway keeps retrying. Only a body
/// that is not a webhook envelope at all is refused with a 400. Processing errors are logged.
pub async fn payment_webhook<B, P>(
    body: web::Bytes,
    api: web::Data<OrderFlowApi<B, P>>,
) -> Result<HttpResponse, ServerError>
where
    B: StorefrontDatabase,
    P: PaymentProvider,
{
    let raw = serde_json::from_slice::<Value>(&body).map_err(|e| {
        warn!("🪝️ Webhook body is not JSON. {e}");
        ServerError::CouldNotDeserializePayload
    })?;
    let event = serde_json::from_value::<GatewayWebhookEvent>(raw.clone()).map_err(|e| {
        warn!("🪝️ Webhook body is not a gateway event. {e}");
        ServerError::CouldNotDeserializePayload
    })?;
    trace!("🪝️ Received {} webhook for {}", event.event_type, event.data.order.order_id);
    let response = match api.ingest_gateway_event(event, raw).await {
        Ok(WebhookOutcome::Unmatched) => JsonResponse::success("No payment matches this event. It was logged."),
        Ok(WebhookOutcome::Matched { order_db_id, transitioned_to: Some(status) }) => {
            JsonResponse::success(format!("Order #{order_db_id} is now {status}"))
        },
        Ok(WebhookOutcome::Matched { .. }) => JsonResponse::success("Event processed. Nothing changed."),
        Err(e) => {
            error!("🪝️ Could not process webhook. {e}");
            JsonResponse::failure("The event was received but could not be processed.")
        },
    };
    Ok(HttpResponse::Ok().json(response))
}

route!(payment_status => Get "/payments/status/{gateway_order_ref}" impl StorefrontDatabase, PaymentProvider);
pub async fn payment_status<B, P>(
    path: web::Path<String>,
    api: web::Data<OrderFlowApi<B, P>>,
) -> Result<HttpResponse, ServerError>
where
    B: StorefrontDatabase,
    P: PaymentProvider,
{
    let reference = path.into_inner();
    debug!("💻️ GET payment_status({reference})");
    let status = api.payment_status(&reference).await?;
    Ok(HttpResponse::Ok().json(status))
}

//----------------------------------------------   Operator  ----------------------------------------------------

route!(complete_order => Put "/orders/{id}/complete" impl StorefrontDatabase, EmailSender);
pub async fn complete_order<B, E>(
    path: web::Path<i64>,
    api: web::Data<OperatorApi<B, E>>,
) -> Result<HttpResponse, ServerError>
where
    B: StorefrontDatabase,
    E: EmailSender,
{
    let id = path.into_inner();
    info!("🧑‍💼️ PUT complete_order(#{id})");
    let order = api.complete_order(id).await?;
    Ok(HttpResponse::Ok().json(OperatorActionResponse::new(format!("Order {} completed", order.order_id), order)))
}

route!(cancel_order => Put "/orders/{id}/cancel" impl StorefrontDatabase, EmailSender);
/// Cancels a pending or confirmed order. The customer is emailed in the background. Stock is not returned.
pub async fn cancel_order<B, E>(
    path: web::Path<i64>,
    api: web::Data<OperatorApi<B, E>>,
) -> Result<HttpResponse, ServerError>
where
    B: StorefrontDatabase,
    E: EmailSender,
{
    let id = path.into_inner();
    info!("🧑‍💼️ PUT cancel_order(#{id})");
    let order = api.cancel_order(id).await?;
    Ok(HttpResponse::Ok().json(OperatorActionResponse::new(format!("Order {} cancelled", order.order_id), order)))
}

route!(dispatch_notice => Post "/orders/{id}/dispatch-notice" impl StorefrontDatabase, EmailSender);
/// Emails the customer that the order has shipped. Unlike the other notifications, the send is awaited, and a failure
/// is reported so that the operator can retry.
pub async fn dispatch_notice<B, E>(
    path: web::Path<i64>,
    api: web::Data<OperatorApi<B, E>>,
) -> Result<HttpResponse, ServerError>
where
    B: StorefrontDatabase,
    E: EmailSender,
{
    let id = path.into_inner();
    info!("🧑‍💼️ POST dispatch_notice(#{id})");
    let order = api.send_dispatch_notice(id).await?;
    let message = format!("Dispatch notice sent to {}", order.customer.email);
    Ok(HttpResponse::Ok().json(OperatorActionResponse::new(message, order)))
}

//----------------------------------------------   WhatsApp  ----------------------------------------------------

/// The WhatsApp subscription handshake. Echoes the challenge back if the verify token matches.
#[get("/whatsapp/webhook")]
pub async fn whatsapp_subscribe(
    query: web::Query<SubscriptionQuery>,
    token: web::Data<SubscriptionToken>,
) -> HttpResponse {
    let query = query.into_inner();
    let token_matches = !token.0.is_empty() && constant_time_eq(query.verify_token.as_bytes(), token.0.reveal().as_bytes());
    if query.mode == "subscribe" && token_matches {
        info!("💬️ WhatsApp webhook subscription verified");
        HttpResponse::Ok().content_type("text/plain").body(query.challenge)
    } else {
        warn!("💬️ WhatsApp subscription handshake refused (mode '{}')", query.mode);
        HttpResponse::Forbidden().finish()
    }
}

route!(whatsapp_inbound => Post "" impl MessagingSessions);
/// Inbound WhatsApp messages. Must be wrapped in the signature middleware.
///
/// Each message opens (or extends) the 24 hour window in which we may send the sender free-form text. Responses are
/// always 200 once authenticated, otherwise the platform keeps retrying.
pub async fn whatsapp_inbound<S: MessagingSessions>(
    body: web::Bytes,
    sessions: web::Data<S>,
) -> Result<HttpResponse, ServerError> {
    let hook = serde_json::from_slice::<WhatsAppWebhook>(&body).map_err(|e| {
        warn!("💬️ WhatsApp webhook body could not be read. {e}");
        ServerError::CouldNotDeserializePayload
    })?;
    let now = Utc::now();
    let mut recorded = 0;
    for message in hook.inbound_messages() {
        match sessions.record_inbound_message(&message.from, message.sent_at(now)).await {
            Ok(()) => recorded += 1,
            Err(e) => error!("💬️ Could not record inbound message from {}. {e}", message.from),
        }
    }
    trace!("💬️ Recorded {recorded} inbound message(s)");
    Ok(HttpResponse::Ok().json(JsonResponse::success(format!("{recorded} message(s) recorded"))))
}
