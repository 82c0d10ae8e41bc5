use thiserror::Error;

use crate::traits::{CartError, CatalogError, CheckoutError};

/// Everything that can go wrong while finalizing an order.
///
/// `Validation`, `Authentication`, `GatewayNotConfigured` and `SignatureMismatch` are raised before any transaction is
/// opened and never have side effects. Errors from the backend are only returned after its transaction was rolled
/// back.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FinalizationError {
    #[error("Invalid checkout request: {0}")]
    Validation(String),
    #[error("Authentication required: {0}")]
    Authentication(String),
    #[error("The payment gateway secret has not been configured")]
    GatewayNotConfigured,
    #[error("Payment signature verification failed")]
    SignatureMismatch,
    #[error("Order finalization did not complete within {0} ms")]
    Timeout(u64),
    #[error("{0}")]
    Checkout(#[from] CheckoutError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartApiError {
    #[error("Invalid cart request: {0}")]
    Validation(String),
    #[error("{0}")]
    Cart(#[from] CartError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogApiError {
    #[error("Product {0} does not exist")]
    ProductNotFound(String),
    #[error("{0}")]
    Catalog(#[from] CatalogError),
}
