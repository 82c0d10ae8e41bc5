use std::fmt::Debug;

use crate::{
    checkout_api::errors::CatalogApiError,
    db_types::{NewProduct, Product, ProductId},
    traits::ProductCatalog,
};

/// Read access to the catalog, plus the upsert used to stock it.
pub struct CatalogApi<B> {
    db: B,
}

impl<B: Debug> Debug for CatalogApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CatalogApi ({:?})", self.db)
    }
}

impl<B> CatalogApi<B>
where B: ProductCatalog
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub async fn product(&self, product_id: &ProductId) -> Result<Product, CatalogApiError> {
        self.db.fetch_product(product_id).await?.ok_or_else(|| CatalogApiError::ProductNotFound(product_id.to_string()))
    }

    pub async fn products(&self) -> Result<Vec<Product>, CatalogApiError> {
        Ok(self.db.fetch_products().await?)
    }

    pub async fn upsert_product(&self, product: NewProduct) -> Result<Product, CatalogApiError> {
        Ok(self.db.upsert_product(product).await?)
    }
}
