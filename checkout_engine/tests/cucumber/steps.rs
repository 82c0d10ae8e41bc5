use std::str::FromStr;

use checkout_engine::{
    checkout_api::{FinalizeResult, PricedLine},
    db_types::{CartLine, Money, NewProduct, ProductId, UserId},
    CheckoutDatabase,
    CheckoutError,
    FinalizationError,
};
use cucumber::{given, then, when};

use crate::cucumber::{checkout_world::signed_request, CheckoutWorld};

fn money(s: &str) -> Money {
    Money::from_str(s).expect("Invalid amount")
}

/// Parses `"p1:2, p1:1, p2:1"` into cart lines
fn parse_lines(s: &str) -> Vec<CartLine> {
    s.split(',')
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(|l| {
            let (id, qty) = l.split_once(':').expect("Expected product:quantity");
            CartLine::new(id.trim(), qty.trim().parse().expect("Invalid quantity"))
        })
        .collect()
}

#[given(expr = "product {word} priced at {word} with {int} in stock")]
async fn product_in_stock(world: &mut CheckoutWorld, id: String, price: String, stock: i64) {
    let product = NewProduct::new(id.as_str(), &format!("Product {id}"), money(&price), stock);
    world.catalog().upsert_product(product).await.expect("Error saving product");
}

#[given(expr = "user {word} has {int} of {word} in their cart")]
async fn user_cart_item(world: &mut CheckoutWorld, user: String, quantity: i64, product: String) {
    let user = UserId::from(user);
    world.carts().add_item(&user, CartLine::new(product, quantity)).await.expect("Error adding to cart");
}

#[when(expr = "the price of {word} changes to {word}")]
async fn price_change(world: &mut CheckoutWorld, id: String, price: String) {
    let product = world.catalog().product(&ProductId::from(id)).await.expect("Product does not exist");
    let updated = NewProduct::new(product.id, &product.name, money(&price), product.stock);
    world.catalog().upsert_product(updated).await.expect("Error updating product");
}

#[when(expr = "user {word} checks out their cart with payment {word}")]
async fn checkout_cart(world: &mut CheckoutWorld, user: String, payment_id: String) {
    world.checkout(Some(&user), signed_request(&payment_id)).await;
}

#[when(expr = "user {word} checks out their cart with payment {word} and a forged signature")]
async fn checkout_forged(world: &mut CheckoutWorld, user: String, payment_id: String) {
    let mut request = signed_request(&payment_id);
    // a genuine signature, but for a different payment
    request.signature = signed_request(&format!("{payment_id}_other")).signature;
    world.checkout(Some(&user), request).await;
}

#[when(expr = "an anonymous visitor checks out a saved cart with payment {word}")]
async fn checkout_anonymous_cart(world: &mut CheckoutWorld, payment_id: String) {
    world.checkout(None, signed_request(&payment_id)).await;
}

#[when(expr = "a guest buys {int} of {word} at {word} with payment {word}")]
async fn guest_checkout(world: &mut CheckoutWorld, quantity: i64, product: String, price: String, payment_id: String) {
    let request = signed_request(&payment_id).with_items(vec![PricedLine::new(product, quantity, money(&price))]);
    world.checkout(None, request).await;
}

#[when(expr = "user {word} buys {int} of {word} directly at {word} with payment {word}")]
async fn direct_buy(
    world: &mut CheckoutWorld,
    user: String,
    quantity: i64,
    product: String,
    price: String,
    payment_id: String,
) {
    let request = signed_request(&payment_id).with_items(vec![PricedLine::new(product, quantity, money(&price))]);
    world.checkout(Some(&user), request).await;
}

#[when(expr = "user {word} signs in with the anonymous cart {string}")]
async fn merge_cart(world: &mut CheckoutWorld, user: String, lines: String) {
    let user = UserId::from(user);
    let (result, _cart) = world.carts().merge(&user, &parse_lines(&lines)).await.expect("Error merging carts");
    world.last_merge = Some(result);
}

#[then(expr = "the checkout creates an order with a total of {word}")]
async fn order_created(world: &mut CheckoutWorld, total: String) {
    match world.last_checkout() {
        Ok(FinalizeResult::Created(order)) => assert_eq!(order.order.total_amount, money(&total)),
        other => panic!("Expected a new order, got {other:?}"),
    }
}

#[then(expr = "the checkout returns the existing order for payment {word}")]
async fn order_replayed(world: &mut CheckoutWorld, payment_id: String) {
    let existing = world.api().db().fetch_order_by_payment_id(&payment_id).await.expect("Error fetching order");
    let existing = existing.expect("No order for the payment");
    match world.last_checkout() {
        Ok(FinalizeResult::AlreadyFinalized(order)) => assert_eq!(order.order.id, existing.order.id),
        other => panic!("Expected the existing order, got {other:?}"),
    }
}

#[then(expr = "the checkout fails with {word}")]
async fn checkout_failed(world: &mut CheckoutWorld, error: String) {
    let err = world.last_checkout().as_ref().expect_err("Expected the checkout to fail");
    let matched = match error.as_str() {
        "SignatureMismatch" => matches!(err, FinalizationError::SignatureMismatch),
        "Authentication" => matches!(err, FinalizationError::Authentication(_)),
        "EmptyCart" => matches!(err, FinalizationError::Checkout(CheckoutError::EmptyCart)),
        "InsufficientStock" => matches!(err, FinalizationError::Checkout(CheckoutError::InsufficientStock { .. })),
        "ProductNotFound" => matches!(err, FinalizationError::Checkout(CheckoutError::ProductNotFound(_))),
        "DuplicatePayment" => matches!(err, FinalizationError::Checkout(CheckoutError::DuplicatePayment(_))),
        other => panic!("Unknown error type {other}"),
    };
    assert!(matched, "Expected {error}, got {err:?}");
}

#[then(expr = "product {word} has {int} in stock")]
async fn stock_level(world: &mut CheckoutWorld, id: String, stock: i64) {
    let product = world.catalog().product(&ProductId::from(id)).await.expect("Product does not exist");
    assert_eq!(product.stock, stock);
}

#[then(expr = "user {word} has {int} orders")]
async fn order_count(world: &mut CheckoutWorld, user: String, count: usize) {
    let orders = world.api().orders_for_user(&UserId::from(user)).await.expect("Error fetching orders");
    assert_eq!(orders.len(), count);
}

#[then(expr = "there is no order for payment {word}")]
async fn no_order(world: &mut CheckoutWorld, payment_id: String) {
    let order = world.api().db().fetch_order_by_payment_id(&payment_id).await.expect("Error fetching order");
    assert!(order.is_none(), "Unexpected order {order:?}");
}

#[then(expr = "the order for payment {word} has {int} of {word} at {word}")]
async fn order_line(world: &mut CheckoutWorld, payment_id: String, quantity: i64, product: String, price: String) {
    let order = world.api().db().fetch_order_by_payment_id(&payment_id).await.expect("Error fetching order");
    let order = order.expect("No order for the payment");
    let item = order.items.iter().find(|i| i.product_id.as_str() == product).expect("Product is not in the order");
    assert_eq!(item.quantity, quantity);
    assert_eq!(item.price, money(&price));
}

#[then(expr = "the order for payment {word} has a total of {word}")]
async fn order_total(world: &mut CheckoutWorld, payment_id: String, total: String) {
    let order = world.api().db().fetch_order_by_payment_id(&payment_id).await.expect("Error fetching order");
    assert_eq!(order.expect("No order for the payment").order.total_amount, money(&total));
}

#[then(expr = "the order for payment {word} has no owner")]
async fn guest_order(world: &mut CheckoutWorld, payment_id: String) {
    let order = world.api().db().fetch_order_by_payment_id(&payment_id).await.expect("Error fetching order");
    assert_eq!(order.expect("No order for the payment").order.user_id, None);
}

#[then(expr = "the cart of user {word} is empty")]
async fn cart_empty(world: &mut CheckoutWorld, user: String) {
    let cart = world.carts().cart(&UserId::from(user)).await.expect("Error fetching cart");
    assert!(cart.is_empty(), "Cart is not empty: {cart:?}");
}

#[then(expr = "the cart of user {word} contains {int} of {word}")]
async fn cart_contains(world: &mut CheckoutWorld, user: String, quantity: i64, product: String) {
    let cart = world.carts().cart(&UserId::from(user)).await.expect("Error fetching cart");
    let entry = cart.iter().find(|e| e.product_id.as_str() == product).expect("Product is not in the cart");
    assert_eq!(entry.quantity, quantity);
}

#[then(expr = "the cart of user {word} has {int} lines")]
async fn cart_lines(world: &mut CheckoutWorld, user: String, lines: usize) {
    let cart = world.carts().cart(&UserId::from(user)).await.expect("Error fetching cart");
    assert_eq!(cart.len(), lines);
}

#[then(expr = "the merge skipped {int} products")]
async fn merge_skipped(world: &mut CheckoutWorld, skipped: usize) {
    let merge = world.last_merge.as_ref().expect("No merge has happened");
    assert_eq!(merge.skipped.len(), skipped);
}
