use log::*;
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    db_types::{CartEntry, CartItem, CartLine, ProductId, UserId},
    traits::CartError,
};

pub async fn fetch_cart_items(user_id: &UserId, conn: &mut SqliteConnection) -> Result<Vec<CartItem>, sqlx::Error> {
    let items = sqlx::query_as("SELECT * FROM cart_items WHERE user_id = $1 ORDER BY id")
        .bind(user_id.as_str())
        .fetch_all(conn)
        .await?;
    Ok(items)
}

/// The user's cart lines joined with their current catalog name and price.
pub async fn fetch_cart_entries(user_id: &UserId, conn: &mut SqliteConnection) -> Result<Vec<CartEntry>, sqlx::Error> {
    let entries = sqlx::query_as(
        r#"
            SELECT c.product_id, p.name, c.quantity, p.price AS unit_price
            FROM cart_items c JOIN products p ON p.id = c.product_id
            WHERE c.user_id = $1
            ORDER BY c.id
        "#,
    )
    .bind(user_id.as_str())
    .fetch_all(conn)
    .await?;
    Ok(entries)
}

/// Adds the line to the cart, adding to the quantity if the product is already there.
pub async fn add_item(user_id: &UserId, line: &CartLine, conn: &mut SqliteConnection) -> Result<CartItem, CartError> {
    let item: CartItem = sqlx::query_as(
        r#"
            INSERT INTO cart_items (user_id, product_id, quantity) VALUES ($1, $2, $3)
            ON CONFLICT (user_id, product_id) DO UPDATE SET
                quantity = quantity + excluded.quantity,
                updated_at = CURRENT_TIMESTAMP
            RETURNING *;
        "#,
    )
    .bind(user_id.as_str())
    .bind(line.product_id.as_str())
    .bind(line.quantity)
    .fetch_one(conn)
    .await?;
    trace!("🛒️ {user_id} now has {} of {} in their cart", item.quantity, item.product_id);
    Ok(item)
}

pub async fn set_quantity(
    user_id: &UserId,
    product_id: &ProductId,
    quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<CartItem>, sqlx::Error> {
    let item = sqlx::query_as(
        r#"
            UPDATE cart_items SET quantity = $1, updated_at = CURRENT_TIMESTAMP
            WHERE user_id = $2 AND product_id = $3
            RETURNING *;
        "#,
    )
    .bind(quantity)
    .bind(user_id.as_str())
    .bind(product_id.as_str())
    .fetch_optional(conn)
    .await?;
    Ok(item)
}

pub async fn increment_quantity(
    user_id: &UserId,
    product_id: &ProductId,
    by: i64,
    conn: &mut SqliteConnection,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
            UPDATE cart_items SET quantity = quantity + $1, updated_at = CURRENT_TIMESTAMP
            WHERE user_id = $2 AND product_id = $3
        "#,
    )
    .bind(by)
    .bind(user_id.as_str())
    .bind(product_id.as_str())
    .execute(conn)
    .await?;
    Ok(result.rows_affected())
}

/// Inserts all the lines in a single multi-row `INSERT`. None of the products may already be in the user's cart.
pub async fn insert_items(user_id: &UserId, lines: &[CartLine], conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
    if lines.is_empty() {
        return Ok(0);
    }
    let mut builder = QueryBuilder::new("INSERT INTO cart_items (user_id, product_id, quantity) ");
    builder.push_values(lines, |mut row, line| {
        row.push_bind(user_id.as_str()).push_bind(line.product_id.as_str()).push_bind(line.quantity);
    });
    let result = builder.build().execute(conn).await?;
    Ok(result.rows_affected())
}

pub async fn remove_item(
    user_id: &UserId,
    product_id: &ProductId,
    conn: &mut SqliteConnection,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM cart_items WHERE user_id = $1 AND product_id = $2")
        .bind(user_id.as_str())
        .bind(product_id.as_str())
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn clear_cart(user_id: &UserId, conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM cart_items WHERE user_id = $1").bind(user_id.as_str()).execute(conn).await?;
    trace!("🛒️ Cleared {} lines from the cart of {user_id}", result.rows_affected());
    Ok(result.rows_affected())
}
