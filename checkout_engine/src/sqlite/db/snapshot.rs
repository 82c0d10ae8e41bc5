use log::*;
use sqlx::{FromRow, SqliteConnection};

use crate::{
    checkout_api::{CartSource, OrderSnapshot, SnapshotLine},
    db_types::{Money, ProductId, UserId},
    traits::CheckoutError,
};

#[derive(FromRow)]
struct PersistedLine {
    product_id: ProductId,
    quantity: i64,
    unit_price: Option<Money>,
}

/// Resolves the immutable list of lines an order is built from.
///
/// For the user's persisted cart, unit prices are the catalog prices read here, on the caller's connection. Supplied
/// lines keep the prices they came with.
pub async fn resolve_snapshot(source: &CartSource, conn: &mut SqliteConnection) -> Result<OrderSnapshot, CheckoutError> {
    let lines = match source {
        CartSource::UserCart(user_id) => persisted_lines(user_id, conn).await?,
        CartSource::Supplied { items, .. } => items.iter().map(SnapshotLine::from).collect(),
    };
    let snapshot = OrderSnapshot::try_new(lines)?;
    trace!("🧾️ Snapshot resolved: {} lines, total {}", snapshot.lines().len(), snapshot.total());
    Ok(snapshot)
}

async fn persisted_lines(user_id: &UserId, conn: &mut SqliteConnection) -> Result<Vec<SnapshotLine>, CheckoutError> {
    let rows: Vec<PersistedLine> = sqlx::query_as(
        r#"
            SELECT c.product_id, c.quantity, p.price AS unit_price
            FROM cart_items c LEFT JOIN products p ON p.id = c.product_id
            WHERE c.user_id = $1
            ORDER BY c.id
        "#,
    )
    .bind(user_id.as_str())
    .fetch_all(conn)
    .await?;
    rows.into_iter()
        .map(|row| match row.unit_price {
            Some(unit_price) => Ok(SnapshotLine { product_id: row.product_id, quantity: row.quantity, unit_price }),
            None => Err(CheckoutError::ProductNotFound(row.product_id)),
        })
        .collect()
}
