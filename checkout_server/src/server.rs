use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use checkout_engine::{
    events::{EventHandlers, EventHooks, EventProducers, OrderFinalizedEvent},
    helpers::PaymentVerifier,
    CartApi,
    CatalogApi,
    OrderFinalizationApi,
    SqliteDatabase,
};
use futures::FutureExt;
use log::*;

use crate::{
    config::{ServerConfig, ServerOptions},
    errors::ServerError,
    routes::{
        health,
        AddCartItemRoute,
        FinalizeCheckoutRoute,
        MergeCartRoute,
        MyCartRoute,
        MyOrderByIdRoute,
        MyOrdersRoute,
        ProductByIdRoute,
        RemoveCartItemRoute,
        UpdateCartItemRoute,
    },
};

const EVENT_BUFFER_SIZE: usize = 25;

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, config.db_max_connections)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.run_migrations().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let handlers = EventHandlers::new(EVENT_BUFFER_SIZE, audit_hooks());
    let producers = handlers.producers();
    handlers.start_handlers().await;
    let srv = create_server_instance(config, db, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

/// Every newly finalized order is written to the `chk::audit` log target.
fn audit_hooks() -> EventHooks {
    let mut hooks = EventHooks::default();
    hooks.on_order_finalized(|ev: OrderFinalizedEvent| {
        async move {
            let order = &ev.order;
            info!(
                target: "chk::audit",
                "Order {} finalized. user: {}, total: {}, lines: {}, gateway payment: {}",
                order.id,
                order.user_id.as_ref().map(|u| u.as_str()).unwrap_or("guest"),
                order.total_amount,
                ev.items.len(),
                order.gateway_payment_id
            );
        }
        .boxed()
    });
    hooks
}

fn payment_verifier(config: &ServerConfig) -> Option<PaymentVerifier> {
    let secret = config.gateway_secret.clone()?;
    PaymentVerifier::new(secret).map_err(|e| error!("🪛️ {e}. Checkouts will be refused.")).ok()
}

/// Malformed JSON bodies are reported with the same JSON error body as every other failure.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| ServerError::InvalidRequestBody(err.to_string()).into())
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let verifier = payment_verifier(&config);
    let options = ServerOptions::from_config(&config);
    let access_log_format = if options.use_x_forwarded_for {
        "%t (%D ms) %s %{r}a %{Host}i %U"
    } else {
        "%t (%D ms) %s %a %{Host}i %U"
    };
    let (host, port) = (config.host.clone(), config.port);
    let srv = HttpServer::new(move || {
        let checkout_api = OrderFinalizationApi::new(db.clone(), verifier.clone())
            .with_payment_method(&config.payment_method)
            .with_timeout(config.checkout_timeout)
            .with_producers(producers.clone());
        let cart_api = CartApi::new(db.clone());
        let catalog_api = CatalogApi::new(db.clone());
        let app = App::new()
            .wrap(Logger::new(access_log_format).log_target("chk::access_log"))
            .app_data(json_config())
            .app_data(web::Data::new(checkout_api))
            .app_data(web::Data::new(cart_api))
            .app_data(web::Data::new(catalog_api))
            .app_data(web::Data::new(config.auth.clone()))
            .app_data(web::Data::new(options));
        // Routes that require authentication
        let auth_scope = web::scope("/api")
            .service(MyCartRoute::<SqliteDatabase>::new())
            .service(AddCartItemRoute::<SqliteDatabase>::new())
            .service(UpdateCartItemRoute::<SqliteDatabase>::new())
            .service(RemoveCartItemRoute::<SqliteDatabase>::new())
            .service(MergeCartRoute::<SqliteDatabase>::new())
            .service(MyOrdersRoute::<SqliteDatabase>::new())
            .service(MyOrderByIdRoute::<SqliteDatabase>::new());
        app.service(health)
            .service(ProductByIdRoute::<SqliteDatabase>::new())
            .service(FinalizeCheckoutRoute::<SqliteDatabase>::new())
            .service(auth_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((host.as_str(), port))?
    .run();
    Ok(srv)
}
