use thiserror::Error;

use crate::db_types::{NewProduct, Product, ProductId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Invalid product: {0}")]
    InvalidProduct(String),
}

impl From<sqlx::Error> for CatalogError {
    fn from(e: sqlx::Error) -> Self {
        CatalogError::DatabaseError(e.to_string())
    }
}

#[allow(async_fn_in_trait)]
pub trait ProductCatalog {
    async fn fetch_product(&self, product_id: &ProductId) -> Result<Option<Product>, CatalogError>;

    async fn fetch_products(&self) -> Result<Vec<Product>, CatalogError>;

    /// Inserts the product, or replaces name, price and stock if it already exists.
    async fn upsert_product(&self, product: NewProduct) -> Result<Product, CatalogError>;
}
