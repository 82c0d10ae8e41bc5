use chrono::Utc;
use log::*;
use sqlx::{types::Json, QueryBuilder, SqliteConnection};

use crate::{
    checkout_api::{FinalizedOrder, OrderSnapshot, VerifiedCheckout},
    db_types::{Order, OrderId, OrderItem, OrderStatusType, PaymentStatus, UserId},
    traits::CheckoutError,
};

/// Inserts a paid order for the snapshot. This is not atomic on its own; call it on the finalization transaction.
///
/// A second order for the same gateway payment id violates the unique constraint and is reported as
/// [`CheckoutError::DuplicatePayment`].
pub async fn insert_order(
    checkout: &VerifiedCheckout,
    snapshot: &OrderSnapshot,
    conn: &mut SqliteConnection,
) -> Result<Order, CheckoutError> {
    let id = OrderId::random();
    let result = sqlx::query_as(
        r#"
            INSERT INTO orders (
                id,
                user_id,
                total_amount,
                status,
                payment_method,
                payment_status,
                gateway_order_id,
                gateway_payment_id,
                shipping_address,
                created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *;
        "#,
    )
    .bind(id.as_str())
    .bind(checkout.source().user_id().map(UserId::as_str))
    .bind(snapshot.total().value())
    .bind(OrderStatusType::Paid)
    .bind(checkout.payment_method())
    .bind(PaymentStatus::Captured)
    .bind(checkout.gateway_order_id())
    .bind(checkout.gateway_payment_id())
    .bind(checkout.shipping_address().map(Json))
    .bind(Utc::now())
    .fetch_one(conn)
    .await;
    match result {
        Ok(order) => {
            debug!("📝️ Order {id} inserted for payment {}", checkout.gateway_payment_id());
            Ok(order)
        },
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            Err(CheckoutError::DuplicatePayment(checkout.gateway_payment_id().to_string()))
        },
        Err(e) => Err(e.into()),
    }
}

/// Stores one order item per snapshot line, carrying the snapshot unit price.
pub async fn insert_order_items(
    order_id: &OrderId,
    snapshot: &OrderSnapshot,
    conn: &mut SqliteConnection,
) -> Result<Vec<OrderItem>, sqlx::Error> {
    let mut builder = QueryBuilder::new("INSERT INTO order_items (order_id, product_id, quantity, price) ");
    builder.push_values(snapshot.lines(), |mut row, line| {
        row.push_bind(order_id.as_str())
            .push_bind(line.product_id.as_str())
            .push_bind(line.quantity)
            .push_bind(line.unit_price.value());
    });
    builder.build().execute(&mut *conn).await?;
    fetch_order_items(order_id, conn).await
}

pub async fn fetch_order(order_id: &OrderId, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let order =
        sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(order_id.as_str()).fetch_optional(conn).await?;
    Ok(order)
}

pub async fn fetch_order_by_payment_id(
    gateway_payment_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE gateway_payment_id = $1")
        .bind(gateway_payment_id)
        .fetch_optional(conn)
        .await?;
    Ok(order)
}

pub async fn fetch_order_items(order_id: &OrderId, conn: &mut SqliteConnection) -> Result<Vec<OrderItem>, sqlx::Error> {
    let items = sqlx::query_as("SELECT * FROM order_items WHERE order_id = $1 ORDER BY id")
        .bind(order_id.as_str())
        .fetch_all(conn)
        .await?;
    Ok(items)
}

/// Loads the order and its items.
pub async fn fetch_finalized_order(
    order: Order,
    conn: &mut SqliteConnection,
) -> Result<FinalizedOrder, sqlx::Error> {
    let items = fetch_order_items(&order.id, conn).await?;
    Ok(FinalizedOrder { order, items })
}

pub async fn fetch_orders_for_user(user_id: &UserId, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let orders = sqlx::query_as("SELECT * FROM orders WHERE user_id = $1 ORDER BY created_at DESC, rowid DESC")
        .bind(user_id.as_str())
        .fetch_all(conn)
        .await?;
    Ok(orders)
}
