//! `SqliteDatabase` is the SQLite implementation of the checkout engine backend.
//!
//! It implements all the traits defined in the [`crate::traits`] module.
use std::fmt::Debug;

use log::*;
use sqlx::{migrate::MigrateError, SqliteConnection, SqlitePool};

use super::db::{begin_write, cart, db_url, new_pool, orders, products, snapshot};
use crate::{
    checkout_api::{CartSource, FinalizationStage, FinalizeResult, FinalizedOrder, MergeResult, OrderSnapshot, VerifiedCheckout},
    db_types::{CartEntry, CartItem, CartLine, NewProduct, Order, OrderId, Product, ProductId, UserId},
    traits::{CartError, CartManagement, CatalogError, CheckoutDatabase, CheckoutError, ProductCatalog},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl CheckoutDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn finalize_order(&self, checkout: &VerifiedCheckout) -> Result<FinalizeResult, CheckoutError> {
        let payment_id = checkout.gateway_payment_id();
        let mut tx = begin_write(&self.pool).await?;
        match finalize_in_transaction(checkout, &mut tx).await {
            Ok(result) => {
                tx.commit().await.map_err(|e| {
                    error!("🧾️ [{payment_id}] Commit failed. The order was not created. {e}");
                    CheckoutError::TransactionError(e.to_string())
                })?;
                debug!("🧾️ [{payment_id}] {}", FinalizationStage::Committed);
                Ok(result)
            },
            Err(e) => {
                if let Err(rollback_err) = tx.rollback().await {
                    // The connection discards the transaction when it is returned to the pool
                    warn!("🧾️ [{payment_id}] Explicit rollback failed: {rollback_err}");
                }
                debug!("🧾️ [{payment_id}] {}: {e}", FinalizationStage::RolledBack);
                Err(e)
            },
        }
    }

    async fn resolve_snapshot(&self, source: &CartSource) -> Result<OrderSnapshot, CheckoutError> {
        let mut conn = self.pool.acquire().await?;
        snapshot::resolve_snapshot(source, &mut conn).await
    }

    async fn fetch_order_by_payment_id(
        &self,
        gateway_payment_id: &str,
    ) -> Result<Option<FinalizedOrder>, CheckoutError> {
        let mut conn = self.pool.acquire().await?;
        match orders::fetch_order_by_payment_id(gateway_payment_id, &mut conn).await? {
            Some(order) => Ok(Some(orders::fetch_finalized_order(order, &mut conn).await?)),
            None => Ok(None),
        }
    }

    async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<FinalizedOrder>, CheckoutError> {
        let mut conn = self.pool.acquire().await?;
        match orders::fetch_order(order_id, &mut conn).await? {
            Some(order) => Ok(Some(orders::fetch_finalized_order(order, &mut conn).await?)),
            None => Ok(None),
        }
    }

    async fn fetch_orders_for_user(&self, user_id: &UserId) -> Result<Vec<Order>, CheckoutError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::fetch_orders_for_user(user_id, &mut conn).await?;
        Ok(orders)
    }

    async fn close(&mut self) -> Result<(), CheckoutError> {
        self.pool.close().await;
        Ok(())
    }
}

/// Steps 3 to 6 of the finalization. The caller owns the transaction and commits or rolls back.
async fn finalize_in_transaction(
    checkout: &VerifiedCheckout,
    conn: &mut SqliteConnection,
) -> Result<FinalizeResult, CheckoutError> {
    let payment_id = checkout.gateway_payment_id();
    if let Some(existing) = orders::fetch_order_by_payment_id(payment_id, &mut *conn).await? {
        if existing.user_id.as_ref() != checkout.source().user_id() {
            warn!(
                "🧾️ [{payment_id}] Payment was already finalized as order {} for a different customer. Refusing to \
                 return it.",
                existing.id
            );
            return Err(CheckoutError::DuplicatePayment(payment_id.to_string()));
        }
        info!("🧾️ [{payment_id}] Payment was already finalized as order {}. Nothing to do.", existing.id);
        let order = orders::fetch_finalized_order(existing, &mut *conn).await?;
        return Ok(FinalizeResult::AlreadyFinalized(order));
    }
    let snapshot = snapshot::resolve_snapshot(checkout.source(), &mut *conn).await?;
    trace!("🧾️ [{payment_id}] {}", FinalizationStage::Reserving);
    for line in snapshot.lines() {
        products::reserve_stock(&line.product_id, line.quantity, &mut *conn).await?;
    }
    trace!("🧾️ [{payment_id}] {}", FinalizationStage::Persisting);
    let order = orders::insert_order(checkout, &snapshot, &mut *conn).await?;
    let items = orders::insert_order_items(&order.id, &snapshot, &mut *conn).await?;
    let source = checkout.source();
    if let Some(user_id) = source.user_id().filter(|_| source.clears_cart()) {
        trace!("🧾️ [{payment_id}] {}", FinalizationStage::ClearingCart);
        cart::clear_cart(user_id, &mut *conn).await?;
    }
    info!("🧾️ [{payment_id}] Order {} created. {} items, total {}", order.id, items.len(), order.total_amount);
    Ok(FinalizeResult::Created(FinalizedOrder { order, items }))
}

impl CartManagement for SqliteDatabase {
    async fn fetch_cart(&self, user_id: &UserId) -> Result<Vec<CartEntry>, CartError> {
        let mut conn = self.pool.acquire().await?;
        let entries = cart::fetch_cart_entries(user_id, &mut conn).await?;
        Ok(entries)
    }

    async fn add_to_cart(&self, user_id: &UserId, line: &CartLine) -> Result<CartItem, CartError> {
        if line.quantity <= 0 {
            return Err(CartError::InvalidQuantity(format!("{} must be positive", line.quantity)));
        }
        let mut tx = begin_write(&self.pool).await?;
        if !products::product_exists(&line.product_id, &mut tx).await? {
            return Err(CartError::ProductNotFound(line.product_id.clone()));
        }
        let item = cart::add_item(user_id, line, &mut tx).await?;
        tx.commit().await?;
        Ok(item)
    }

    async fn set_cart_quantity(
        &self,
        user_id: &UserId,
        product_id: &ProductId,
        quantity: i64,
    ) -> Result<Option<CartItem>, CartError> {
        let mut conn = self.pool.acquire().await?;
        match quantity {
            q if q < 0 => Err(CartError::InvalidQuantity(format!("{q} cannot be negative"))),
            0 => {
                cart::remove_item(user_id, product_id, &mut conn).await?;
                Ok(None)
            },
            q => cart::set_quantity(user_id, product_id, q, &mut conn)
                .await?
                .map(Some)
                .ok_or_else(|| CartError::ItemNotFound(product_id.clone())),
        }
    }

    async fn remove_from_cart(&self, user_id: &UserId, product_id: &ProductId) -> Result<bool, CartError> {
        let mut conn = self.pool.acquire().await?;
        let removed = cart::remove_item(user_id, product_id, &mut conn).await?;
        Ok(removed)
    }

    async fn merge_cart(&self, user_id: &UserId, lines: &[CartLine]) -> Result<MergeResult, CartError> {
        if let Some(line) = lines.iter().find(|l| l.quantity <= 0) {
            return Err(CartError::InvalidQuantity(format!("{} for product {}", line.quantity, line.product_id)));
        }
        let mut tx = begin_write(&self.pool).await?;
        let existing = cart::fetch_cart_items(user_id, &mut tx).await?;
        let mut result = MergeResult::default();
        let mut new_lines = Vec::with_capacity(lines.len());
        for line in lines {
            if existing.iter().any(|item| item.product_id == line.product_id) {
                result.updated += cart::increment_quantity(user_id, &line.product_id, line.quantity, &mut tx).await?
                    as usize;
            } else if products::product_exists(&line.product_id, &mut tx).await? {
                new_lines.push(line.clone());
            } else {
                warn!("🛒️ Product {} in the anonymous cart of {user_id} no longer exists. Skipping it.", line.product_id);
                result.skipped.push(line.product_id.clone());
            }
        }
        result.inserted = cart::insert_items(user_id, &new_lines, &mut tx).await? as usize;
        tx.commit().await?;
        debug!(
            "🛒️ Merged anonymous cart for {user_id}: {} updated, {} inserted, {} skipped",
            result.updated,
            result.inserted,
            result.skipped.len()
        );
        Ok(result)
    }
}

impl ProductCatalog for SqliteDatabase {
    async fn fetch_product(&self, product_id: &ProductId) -> Result<Option<Product>, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        let product = products::fetch_product(product_id, &mut conn).await?;
        Ok(product)
    }

    async fn fetch_products(&self) -> Result<Vec<Product>, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        let products = products::fetch_products(&mut conn).await?;
        Ok(products)
    }

    async fn upsert_product(&self, product: NewProduct) -> Result<Product, CatalogError> {
        if product.stock < 0 {
            return Err(CatalogError::InvalidProduct(format!("stock for {} cannot be negative", product.id)));
        }
        let mut conn = self.pool.acquire().await?;
        let product = products::upsert_product(product, &mut conn).await?;
        Ok(product)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Brings the schema up to date.
    pub async fn run_migrations(&self) -> Result<(), MigrateError> {
        sqlx::migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
