use thiserror::Error;

use crate::{
    checkout_api::MergeResult,
    db_types::{CartEntry, CartItem, CartLine, ProductId, UserId},
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Product {0} does not exist")]
    ProductNotFound(ProductId),
    #[error("Product {0} is not in the cart")]
    ItemNotFound(ProductId),
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),
}

impl From<sqlx::Error> for CartError {
    fn from(e: sqlx::Error) -> Self {
        CartError::DatabaseError(e.to_string())
    }
}

/// Persisted, per-user carts. A user has at most one line per product.
#[allow(async_fn_in_trait)]
pub trait CartManagement {
    /// The user's cart lines, priced at the current catalog price, in the order they were added.
    async fn fetch_cart(&self, user_id: &UserId) -> Result<Vec<CartEntry>, CartError>;

    /// Adds the line to the user's cart. If the product is already in the cart, the quantities are added together.
    async fn add_to_cart(&self, user_id: &UserId, line: &CartLine) -> Result<CartItem, CartError>;

    /// Sets the quantity of a cart line. A quantity of zero removes the line, and `None` is returned.
    async fn set_cart_quantity(
        &self,
        user_id: &UserId,
        product_id: &ProductId,
        quantity: i64,
    ) -> Result<Option<CartItem>, CartError>;

    /// Removes the line for the product. Returns false if it was not in the cart.
    async fn remove_from_cart(&self, user_id: &UserId, product_id: &ProductId) -> Result<bool, CartError>;

    /// Merges an anonymous cart into the user's persisted cart.
    ///
    /// `lines` must already be aggregated (one line per product) and carry positive quantities. Existing lines are
    /// incremented, new lines are inserted in one statement, and products that are not in the catalog are skipped.
    async fn merge_cart(&self, user_id: &UserId, lines: &[CartLine]) -> Result<MergeResult, CartError>;
}
