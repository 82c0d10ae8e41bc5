use actix_web::{http::StatusCode, web, web::ServiceConfig};
use checkout_engine::{
    db_types::{NewProduct, Product},
    CatalogApi,
    OrderFinalizationApi,
};
use chrono::Utc;

use super::{
    helpers::{get_request, json, sample_order, valid_token, verifier},
    mocks::{MockCatalog, MockCheckoutDb},
};
use crate::routes::{MyOrderByIdRoute, MyOrdersRoute, ProductByIdRoute};

#[actix_web::test]
async fn fetch_my_orders() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request(&valid_token("alice"), "/orders", configure).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let body = json(&body);
    assert_eq!(body.as_array().map(|a| a.len()), Some(1));
    assert_eq!(body[0]["gatewayPaymentId"], "pay_1");
    assert_eq!(body[0]["totalAmount"], "499.00");

    let (status, _) = get_request("", "/orders", configure).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn fetch_my_order_with_items() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request(&valid_token("alice"), "/orders/order-1", configure).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let body = json(&body);
    assert_eq!(body["order"]["id"], "order-1");
    assert_eq!(body["items"][0]["productId"], "p1");
    assert_eq!(body["items"][0]["price"], "499.00");
}

#[actix_web::test]
async fn other_users_orders_are_not_found() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request(&valid_token("mallory"), "/orders/order-1", configure).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json(&body)["success"], false);
    let (status, _) = get_request(&valid_token("alice"), "/orders/order-2", configure).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn product_lookup_is_public() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("", "/products/p1", configure).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let body = json(&body);
    assert_eq!(body["price"], "499.00");
    assert_eq!(body["stock"], 5);
    let (status, _) = get_request("", "/products/p9", configure).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

fn product(p: NewProduct) -> Product {
    Product { id: p.id, name: p.name, price: p.price, stock: p.stock, created_at: Utc::now(), updated_at: Utc::now() }
}

fn configure(cfg: &mut ServiceConfig) {
    let mut db = MockCheckoutDb::new();
    db.expect_fetch_orders_for_user().returning(|user_id| {
        let orders = vec![sample_order("pay_1", Some("alice")).order];
        Ok(orders.into_iter().filter(|o| o.user_id.as_ref() == Some(user_id)).collect())
    });
    db.expect_fetch_order().returning(|order_id| {
        Ok((order_id.as_str() == "order-1").then(|| sample_order("pay_1", Some("alice"))))
    });
    let mut catalog = MockCatalog::new();
    catalog.expect_fetch_product().returning(|product_id| {
        let p1 = NewProduct::new("p1", "Rooibos", "499.00".parse().unwrap(), 5);
        Ok((product_id.as_str() == "p1").then(|| product(p1)))
    });
    cfg.app_data(web::Data::new(OrderFinalizationApi::new(db, verifier())))
        .app_data(web::Data::new(CatalogApi::new(catalog)))
        .service(MyOrdersRoute::<MockCheckoutDb>::new())
        .service(MyOrderByIdRoute::<MockCheckoutDb>::new())
        .service(ProductByIdRoute::<MockCatalog>::new());
}
