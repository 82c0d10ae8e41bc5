use log::*;
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewProduct, Product, ProductId},
    traits::CheckoutError,
};

pub async fn fetch_product(product_id: &ProductId, conn: &mut SqliteConnection) -> Result<Option<Product>, sqlx::Error> {
    let product =
        sqlx::query_as("SELECT * FROM products WHERE id = $1").bind(product_id.as_str()).fetch_optional(conn).await?;
    Ok(product)
}

pub async fn fetch_products(conn: &mut SqliteConnection) -> Result<Vec<Product>, sqlx::Error> {
    let products = sqlx::query_as("SELECT * FROM products ORDER BY id").fetch_all(conn).await?;
    Ok(products)
}

pub async fn product_exists(product_id: &ProductId, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let row: Option<(i64,)> =
        sqlx::query_as("SELECT 1 FROM products WHERE id = $1").bind(product_id.as_str()).fetch_optional(conn).await?;
    Ok(row.is_some())
}

pub async fn fetch_stock(product_id: &ProductId, conn: &mut SqliteConnection) -> Result<Option<i64>, sqlx::Error> {
    let stock: Option<(i64,)> =
        sqlx::query_as("SELECT stock FROM products WHERE id = $1").bind(product_id.as_str()).fetch_optional(conn).await?;
    Ok(stock.map(|(s,)| s))
}

/// Inserts the product, or overwrites the name, price and stock of an existing one.
pub async fn upsert_product(product: NewProduct, conn: &mut SqliteConnection) -> Result<Product, sqlx::Error> {
    let product: Product = sqlx::query_as(
        r#"
            INSERT INTO products (id, name, price, stock) VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE SET
                name = excluded.name,
                price = excluded.price,
                stock = excluded.stock,
                updated_at = CURRENT_TIMESTAMP
            RETURNING *;
        "#,
    )
    .bind(product.id.as_str())
    .bind(product.name)
    .bind(product.price.value())
    .bind(product.stock)
    .fetch_one(conn)
    .await?;
    debug!("🏷️ Product {} saved. Price {}, stock {}", product.id, product.price, product.stock);
    Ok(product)
}

/// Takes `quantity` units of the product out of stock, if and only if at least that many are available.
///
/// The check and the decrement are a single statement, so two callers can never both take the last unit. This does
/// not open a transaction or retry; run it on the caller's transaction so a later failure undoes it.
pub async fn reserve_stock(
    product_id: &ProductId,
    quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<(), CheckoutError> {
    let result = sqlx::query(
        "UPDATE products SET stock = stock - $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 AND stock >= $1",
    )
    .bind(quantity)
    .bind(product_id.as_str())
    .execute(&mut *conn)
    .await?;
    if result.rows_affected() == 1 {
        trace!("🏷️ Reserved {quantity} of {product_id}");
        return Ok(());
    }
    match fetch_stock(product_id, conn).await? {
        None => Err(CheckoutError::ProductNotFound(product_id.clone())),
        Some(available) => {
            debug!("🏷️ Cannot reserve {quantity} of {product_id}. Only {available} left.");
            Err(CheckoutError::InsufficientStock { product_id: product_id.clone(), requested: quantity, available })
        },
    }
}
