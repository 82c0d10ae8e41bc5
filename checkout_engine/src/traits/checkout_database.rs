use thiserror::Error;

use crate::{
    checkout_api::{CartSource, FinalizeResult, FinalizedOrder, OrderSnapshot, VerifiedCheckout},
    db_types::{Order, OrderId, ProductId, UserId},
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckoutError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("The transaction could not be committed: {0}")]
    TransactionError(String),
    #[error("There is nothing to check out. The cart is empty.")]
    EmptyCart,
    #[error("Invalid order line: {0}")]
    InvalidLine(String),
    #[error("Insufficient stock for product {product_id}. Requested {requested}, but only {available} available.")]
    InsufficientStock { product_id: ProductId, requested: i64, available: i64 },
    #[error("Product {0} does not exist")]
    ProductNotFound(ProductId),
    #[error("An order for payment {0} has already been created")]
    DuplicatePayment(String),
    #[error("Order {0} does not exist")]
    OrderNotFound(OrderId),
}

impl From<sqlx::Error> for CheckoutError {
    fn from(e: sqlx::Error) -> Self {
        CheckoutError::DatabaseError(e.to_string())
    }
}

/// The storage side of order finalization.
///
/// Implementations must run [`Self::finalize_order`] as a single atomic unit: either every effect (stock decrements,
/// order and order item rows, cart clearing) is committed, or none is.
#[allow(async_fn_in_trait)]
pub trait CheckoutDatabase: Clone {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Turns a verified payment into an order. In one transaction:
    /// * If an order already exists for the gateway payment id, it is returned as
    ///   [`FinalizeResult::AlreadyFinalized`] and nothing else happens.
    /// * The order snapshot is resolved from the checkout's [`CartSource`].
    /// * Stock is reserved for every line. Any shortfall aborts the whole transaction with
    ///   [`CheckoutError::InsufficientStock`].
    /// * The order and its items are stored, with the snapshot prices and total.
    /// * The user's persisted cart is cleared, if the order was built from it.
    ///
    /// If a concurrent call for the same payment commits first, [`CheckoutError::DuplicatePayment`] is returned.
    async fn finalize_order(&self, checkout: &VerifiedCheckout) -> Result<FinalizeResult, CheckoutError>;

    /// Resolves an order snapshot without reserving stock or writing anything. Useful for previews.
    async fn resolve_snapshot(&self, source: &CartSource) -> Result<OrderSnapshot, CheckoutError>;

    async fn fetch_order_by_payment_id(&self, gateway_payment_id: &str)
        -> Result<Option<FinalizedOrder>, CheckoutError>;

    async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<FinalizedOrder>, CheckoutError>;

    /// All orders for the user, newest first.
    async fn fetch_orders_for_user(&self, user_id: &UserId) -> Result<Vec<Order>, CheckoutError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), CheckoutError> {
        Ok(())
    }
}
