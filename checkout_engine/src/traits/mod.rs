//! # Backend contracts
//!
//! These traits define what a storage backend must provide for the checkout engine. The public APIs in
//! [`crate::checkout_api`] are generic over them, so that alternative backends (or mocks, in tests) can be dropped in.
//!
//! * [`CheckoutDatabase`] runs the order finalization transaction and answers order queries.
//! * [`CartManagement`] manages persisted carts, including reconciliation of an anonymous cart after sign-in.
//! * [`ProductCatalog`] reads and maintains the catalog rows that price and stock come from.
mod cart_management;
mod checkout_database;
mod product_catalog;

pub use cart_management::{CartError, CartManagement};
pub use checkout_database::{CheckoutDatabase, CheckoutError};
pub use product_catalog::{CatalogError, ProductCatalog};
