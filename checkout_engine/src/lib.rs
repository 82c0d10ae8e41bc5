//! Checkout Engine
//!
//! The order finalization engine turns a client's claim "I paid" into a durable, correct, non-duplicable order while
//! safely mutating shared inventory. It
//!
//! 1. verifies the payment gateway's signed receipt without trusting any client input,
//! 2. snapshots the cart into an immutable list of priced lines,
//! 3. decrements stock for every line without ever overselling, even under concurrent checkouts,
//! 4. stores the order and clears the originating cart,
//!
//! with steps 2 to 4 running as one transaction that is rolled back on any failure. Receipts are idempotent: a payment
//! that was already finalized returns the existing order.
//!
//! The library is divided into two main sections:
//! 1. Storage ([`mod@traits`] and the SQLite backend). Backends implement the traits; the data types they exchange are
//!    defined in [`mod@db_types`].
//! 2. The public API ([`mod@checkout_api`]): [`OrderFinalizationApi`], [`CartApi`] (including reconciliation of an
//!    anonymous cart on sign-in) and [`CatalogApi`].
//!
//! Newly finalized orders are published as [`events::OrderFinalizedEvent`]s to any registered hooks.
pub mod checkout_api;
pub mod db_types;
pub mod events;
pub mod helpers;
pub mod traits;

#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use checkout_api::{
    cart_api::CartApi,
    catalog_api::CatalogApi,
    errors::{CartApiError, CatalogApiError, FinalizationError},
    finalization_api::{OrderFinalizationApi, DEFAULT_CHECKOUT_TIMEOUT, DEFAULT_PAYMENT_METHOD},
};
#[cfg(feature = "sqlite")]
pub use sqlite::{db as sqlite_db, SqliteDatabase};
pub use traits::{CartError, CartManagement, CatalogError, CheckoutDatabase, CheckoutError, ProductCatalog};
