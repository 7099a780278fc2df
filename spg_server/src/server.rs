use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use log::*;
use spg_engine::{events::EventProducers, OperatorApi, OrderFlowApi, SqliteDatabase};

use crate::{
    config::ServerConfig,
    data_objects::SubscriptionToken,
    errors::ServerError,
    integrations::{create_notification_handlers, EmailNotifier, HostedGateway, WhatsAppNotifier},
    middleware::{OperatorTokenMiddlewareFactory, SignatureMiddlewareFactory, SignatureScheme},
    routes::{
        health,
        whatsapp_subscribe,
        CancelOrderRoute,
        CompleteOrderRoute,
        CreateOrderRoute,
        DispatchNoticeRoute,
        OrderDetailsRoute,
        PaymentFailedRoute,
        PaymentStatusRoute,
        PaymentWebhookRoute,
        VerifyPaymentRoute,
        WhatsappInboundRoute,
    },
};

const MAX_DB_CONNECTIONS: u32 = 25;

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, MAX_DB_CONNECTIONS)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    if config.run_migrations {
        info!("🗃️ Running database migrations");
        db.run_migrations().await.map_err(|e| ServerError::InitializeError(format!("Migrations failed. {e}")))?;
    }
    let gateway =
        HostedGateway::new(config.gateway.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let mailer = EmailNotifier::new(config.email.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let messenger =
        WhatsAppNotifier::new(config.whatsapp.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let handlers = create_notification_handlers(config.event_buffer_size, db.clone(), mailer.clone(), messenger);
    let producers = handlers.producers();
    handlers.start_handlers().await;
    info!("📬️ Notification handlers started");
    let srv = create_server_instance(config, db, gateway, mailer, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    gateway: HostedGateway,
    mailer: EmailNotifier,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let srv = HttpServer::new(move || {
        let orders_api =
            OrderFlowApi::new(db.clone(), gateway.clone(), producers.clone()).with_config(config.order_flow.clone());
        let operator_api = OperatorApi::new(db.clone(), mailer.clone(), producers.clone());
        let app = App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("spg::access_log"))
            .app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(operator_api))
            .app_data(web::Data::new(db.clone()))
            .app_data(web::Data::new(SubscriptionToken(config.whatsapp.verify_token.clone())))
            .app_data(json_config());
        let webhook_scope = web::scope("/payments/webhook")
            .wrap(SignatureMiddlewareFactory::new(
                SignatureScheme::Gateway,
                config.webhook.secret.clone(),
                config.webhook.checks,
            ))
            .service(PaymentWebhookRoute::<SqliteDatabase, HostedGateway>::new());
        let whatsapp_scope = web::scope("/whatsapp/webhook")
            .wrap(SignatureMiddlewareFactory::new(SignatureScheme::Hub, config.whatsapp.app_secret.clone(), true))
            .service(WhatsappInboundRoute::<SqliteDatabase>::new());
        // Routes that require the operator token
        let operator_scope = web::scope("/api")
            .wrap(OperatorTokenMiddlewareFactory::new(config.operator_token.clone()))
            .service(CompleteOrderRoute::<SqliteDatabase, EmailNotifier>::new())
            .service(CancelOrderRoute::<SqliteDatabase, EmailNotifier>::new())
            .service(DispatchNoticeRoute::<SqliteDatabase, EmailNotifier>::new());
        app.service(health)
            .service(CreateOrderRoute::<SqliteDatabase, HostedGateway>::new())
            .service(VerifyPaymentRoute::<SqliteDatabase, HostedGateway>::new())
            .service(PaymentFailedRoute::<SqliteDatabase, HostedGateway>::new())
            .service(OrderDetailsRoute::<SqliteDatabase, HostedGateway>::new())
            .service(PaymentStatusRoute::<SqliteDatabase, HostedGateway>::new())
            .service(webhook_scope)
            // The handshake is unsigned, so it must be registered ahead of the signed scope on the same path
            .service(whatsapp_subscribe)
            .service(whatsapp_scope)
            .service(operator_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}

/// Malformed JSON bodies are reported in the same `{"error": ...}` shape as every other error.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        debug!("💻️ Could not read the JSON body. {err}");
        ServerError::InvalidRequestBody(err.to_string()).into()
    })
}
