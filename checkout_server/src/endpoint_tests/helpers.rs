use actix_web::{
    http::StatusCode,
    test,
    test::TestRequest,
    web::{self, ServiceConfig},
    App,
};
use checkout_common::Secret;
use checkout_engine::{
    checkout_api::FinalizedOrder,
    db_types::{Money, Order, OrderId, OrderItem, OrderStatusType, PaymentStatus, UserId},
    helpers::{sign_payment, PaymentVerifier},
};
use chrono::{Duration, TimeZone, Utc};
use log::debug;
use serde_json::Value;

use crate::{
    auth::issue_token,
    config::{AuthConfig, ServerOptions},
    server::json_config,
};

// DO NOT re-use these secrets anywhere.
pub const JWT_SECRET: &str = "endpoint-tests-jwt-secret";
pub const GATEWAY_SECRET: &str = "endpoint-tests-gateway-secret";

pub fn get_auth_config() -> AuthConfig {
    AuthConfig::new(JWT_SECRET)
}

pub fn valid_token(user: &str) -> String {
    issue_token(&get_auth_config(), &UserId::from(user), Duration::days(1)).expect("Failed to sign token")
}

pub fn verifier() -> Option<PaymentVerifier> {
    Some(PaymentVerifier::new(Secret::new(GATEWAY_SECRET.to_string())).expect("valid secret"))
}

pub fn signature(gateway_order_id: &str, gateway_payment_id: &str) -> String {
    sign_payment(GATEWAY_SECRET, gateway_order_id, gateway_payment_id)
}

pub fn sample_order(gateway_payment_id: &str, user_id: Option<&str>) -> FinalizedOrder {
    let order_id = OrderId::from("order-1");
    let order = Order {
        id: order_id.clone(),
        user_id: user_id.map(UserId::from),
        total_amount: Money::from_minor_units(49_900),
        status: OrderStatusType::Paid,
        payment_method: "online".to_string(),
        payment_status: PaymentStatus::Captured,
        gateway_order_id: "gw_order_1".to_string(),
        gateway_payment_id: gateway_payment_id.to_string(),
        shipping_address: None,
        created_at: Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
    };
    let items = vec![OrderItem {
        id: 1,
        order_id,
        product_id: "p1".into(),
        quantity: 1,
        price: Money::from_minor_units(49_900),
    }];
    FinalizedOrder { order, items }
}

pub async fn send_request(
    req: TestRequest,
    token: &str,
    configure: fn(&mut ServiceConfig),
) -> (StatusCode, String) {
    let req = if token.is_empty() { req } else { req.insert_header(("Authorization", format!("Bearer {token}"))) };
    let app = App::new()
        .app_data(json_config())
        .app_data(web::Data::new(get_auth_config()))
        .app_data(web::Data::new(ServerOptions::default()))
        .configure(configure);
    let service = test::init_service(app).await;
    debug!("Making request");
    let res = test::call_service(&service, req.to_request()).await;
    let status = res.status();
    let body = test::read_body(res).await;
    (status, String::from_utf8_lossy(&body).into_owned())
}

pub async fn get_request(token: &str, path: &str, configure: fn(&mut ServiceConfig)) -> (StatusCode, String) {
    send_request(TestRequest::get().uri(path), token, configure).await
}

pub async fn post_request(
    token: &str,
    path: &str,
    body: Value,
    configure: fn(&mut ServiceConfig),
) -> (StatusCode, String) {
    send_request(TestRequest::post().uri(path).set_json(body), token, configure).await
}

pub fn json(body: &str) -> Value {
    serde_json::from_str(body).unwrap_or_else(|e| panic!("Response is not JSON ({e}): {body}"))
}
