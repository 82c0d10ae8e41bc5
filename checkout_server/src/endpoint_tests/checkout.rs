use actix_web::{http::StatusCode, web, web::ServiceConfig};
use checkout_engine::{checkout_api::FinalizeResult, traits::CheckoutError, OrderFinalizationApi};
use chrono::Duration;
use serde_json::{json, Value};

use super::{
    helpers::{json, post_request, sample_order, signature, valid_token, verifier},
    mocks::MockCheckoutDb,
};
use crate::{
    auth::issue_token,
    config::AuthConfig,
    errors::{INTERNAL_ERROR_MESSAGE, VERIFICATION_FAILED_MESSAGE},
    routes::FinalizeCheckoutRoute,
};

const GATEWAY_ORDER: &str = "gw_order_1";

fn checkout_body(payment_id: &str, with_items: bool) -> Value {
    let mut body = json!({
        "gatewayOrderId": GATEWAY_ORDER,
        "gatewayPaymentId": payment_id,
        "signature": signature(GATEWAY_ORDER, payment_id),
    });
    if with_items {
        body["orderDetails"] = json!({
            "cartItems": [{ "productId": "p1", "quantity": 1, "price": "499.00" }],
            "shippingAddress": { "city": "Cape Town" }
        });
    }
    body
}

#[actix_web::test]
async fn guest_checkout_with_items() {
    let _ = env_logger::try_init().ok();
    let (status, body) = post_request("", "/checkout/finalize", checkout_body("pay_1", true), configure).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let body = json(&body);
    assert_eq!(body["success"], true);
    assert_eq!(body["verified"], true);
    assert_eq!(body["orderId"], "order-1");
    assert_eq!(body["order"]["id"], "order-1");
    assert_eq!(body["order"]["totalAmount"], "499.00");
    assert_eq!(body["order"]["status"], "paid");
    assert_eq!(body["order"]["createdAt"], "2024-06-01T12:00:00Z");
}

#[actix_web::test]
async fn cart_checkout_requires_a_token() {
    let _ = env_logger::try_init().ok();
    let (status, body) = post_request("", "/checkout/finalize", checkout_body("pay_2", false), configure).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let body = json(&body);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("signed-in user"));
}

#[actix_web::test]
async fn cart_checkout_with_a_token() {
    let _ = env_logger::try_init().ok();
    let token = valid_token("alice");
    let (status, body) = post_request(&token, "/checkout/finalize", checkout_body("pay_3", false), configure).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(json(&body)["orderId"], "order-1");
}

#[actix_web::test]
async fn a_bad_token_is_not_treated_as_a_guest() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(&AuthConfig::new("someone-else"), &"alice".into(), Duration::days(1)).unwrap();
    let (status, body) = post_request(&token, "/checkout/finalize", checkout_body("pay_4", true), strict).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED, "{body}");
    assert_eq!(json(&body)["success"], false);
}

#[actix_web::test]
async fn replays_get_the_same_body() {
    let _ = env_logger::try_init().ok();
    let (status, first) = post_request("", "/checkout/finalize", checkout_body("pay_5", true), configure).await;
    assert_eq!(status, StatusCode::OK);
    let (status, replay) =
        post_request("", "/checkout/finalize", checkout_body("pay_replayed", true), configure).await;
    assert_eq!(status, StatusCode::OK);
    let (first, replay) = (json(&first), json(&replay));
    assert_eq!(first["orderId"], replay["orderId"]);
    assert_eq!(first["order"], replay["order"]);
}

#[actix_web::test]
async fn forged_signatures_are_rejected() {
    let _ = env_logger::try_init().ok();
    let mut body = checkout_body("pay_6", true);
    body["signature"] = json!(signature(GATEWAY_ORDER, "some_other_payment"));
    let (status, body) = post_request("", "/checkout/finalize", body, strict).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json(&body), json!({ "success": false, "verified": false, "message": VERIFICATION_FAILED_MESSAGE }));
}

#[actix_web::test]
async fn insufficient_stock_is_a_conflict() {
    let _ = env_logger::try_init().ok();
    let (status, body) = post_request("", "/checkout/finalize", checkout_body("pay_sold_out", true), configure).await;
    assert_eq!(status, StatusCode::CONFLICT);
    let body = json(&body);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("Insufficient stock for product p1"));
}

#[actix_web::test]
async fn empty_carts_are_unprocessable() {
    let _ = env_logger::try_init().ok();
    let token = valid_token("alice");
    let (status, _) = post_request(&token, "/checkout/finalize", checkout_body("pay_empty", false), configure).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[actix_web::test]
async fn unconfigured_gateway() {
    let _ = env_logger::try_init().ok();
    let (status, body) = post_request("", "/checkout/finalize", checkout_body("pay_7", true), unconfigured).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json(&body)["success"], false);
}

#[actix_web::test]
async fn malformed_requests() {
    let _ = env_logger::try_init().ok();
    let mut body = checkout_body("pay_8", true);
    body["orderDetails"]["cartItems"][0]["price"] = json!("4.999");
    let (status, res) = post_request("", "/checkout/finalize", body, strict).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json(&res)["success"], false);

    let mut body = checkout_body("pay_8", true);
    body["discount"] = json!("100%");
    let (status, _) = post_request("", "/checkout/finalize", body, strict).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut body = checkout_body("pay_8", true);
    body["orderDetails"]["cartItems"][0]["quantity"] = json!(0);
    let (status, res) = post_request("", "/checkout/finalize", body, strict).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json(&res)["error"].as_str().unwrap().contains("must be positive"));
}

#[actix_web::test]
async fn another_customers_receipt_is_a_conflict() {
    let _ = env_logger::try_init().ok();
    let (status, body) = post_request("", "/checkout/finalize", checkout_body("pay_taken", true), configure).await;
    assert_eq!(status, StatusCode::CONFLICT, "{body}");
    let body = json(&body);
    assert_eq!(body["success"], false);
    assert!(body.get("orderId").is_none());
}

#[actix_web::test]
async fn database_failures_do_not_leak_details() {
    let _ = env_logger::try_init().ok();
    let (status, body) = post_request("", "/checkout/finalize", checkout_body("pay_db_down", true), configure).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json(&body), json!({ "success": false, "error": INTERNAL_ERROR_MESSAGE }));
    assert!(!body.contains("cart_items"));
}

#[actix_web::test]
async fn unconfigured_gateway_keeps_its_message() {
    let _ = env_logger::try_init().ok();
    let (status, body) = post_request("", "/checkout/finalize", checkout_body("pay_9", true), unconfigured).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(json(&body)["error"].as_str().unwrap().contains("not been configured"));
}

fn configure(cfg: &mut ServiceConfig) {
    let mut db = MockCheckoutDb::new();
    db.expect_finalize_order().returning(|checkout| {
        let user = checkout.source().user_id().map(|u| u.to_string());
        match checkout.gateway_payment_id() {
            "pay_replayed" => Ok(FinalizeResult::AlreadyFinalized(sample_order("pay_replayed", user.as_deref()))),
            "pay_sold_out" => {
                Err(CheckoutError::InsufficientStock { product_id: "p1".into(), requested: 1, available: 0 })
            },
            "pay_empty" => Err(CheckoutError::EmptyCart),
            "pay_taken" => Err(CheckoutError::DuplicatePayment("pay_taken".into())),
            "pay_db_down" => Err(CheckoutError::DatabaseError(
                "error returned from database: (code: 1) no such table: cart_items".into(),
            )),
            pid => Ok(FinalizeResult::Created(sample_order(pid, user.as_deref()))),
        }
    });
    db.expect_fetch_order_by_payment_id().returning(|pid| Ok(Some(sample_order(pid, Some("alice")))));
    register(cfg, OrderFinalizationApi::new(db, verifier()));
}

/// The backend must not be reached at all
fn strict(cfg: &mut ServiceConfig) {
    let mut db = MockCheckoutDb::new();
    db.expect_finalize_order().never();
    register(cfg, OrderFinalizationApi::new(db, verifier()));
}

fn unconfigured(cfg: &mut ServiceConfig) {
    let mut db = MockCheckoutDb::new();
    db.expect_finalize_order().never();
    register(cfg, OrderFinalizationApi::new(db, None));
}

fn register(cfg: &mut ServiceConfig, api: OrderFinalizationApi<MockCheckoutDb>) {
    cfg.app_data(web::Data::new(api)).service(FinalizeCheckoutRoute::<MockCheckoutDb>::new());
}
