//! # Checkout engine public API
//!
//! The API is modular, and each part is generic over the backend trait it needs:
//!
//! * [`finalization_api`] turns a signed payment receipt into an order ([`crate::CheckoutDatabase`]).
//! * [`cart_api`] manages persisted carts and reconciles anonymous carts on sign-in ([`crate::CartManagement`]).
//! * [`catalog_api`] reads and maintains the product catalog ([`crate::ProductCatalog`]).
//!
//! ```rust,ignore
//! use checkout_engine::{OrderFinalizationApi, SqliteDatabase, helpers::PaymentVerifier};
//! let db = SqliteDatabase::new_with_url("sqlite://data/checkout.db", 25).await?;
//! let verifier = PaymentVerifier::new(secret)?;
//! let api = OrderFinalizationApi::new(db, Some(verifier));
//! let result = api.finalize(Some(user_id), request).await?;
//! ```
pub mod cart_api;
pub mod catalog_api;
pub mod checkout_objects;
pub mod errors;
pub mod finalization_api;

pub use checkout_objects::{
    aggregate_lines,
    CartSource,
    CheckoutRequest,
    FinalizationStage,
    FinalizeResult,
    FinalizedOrder,
    MergeResult,
    OrderDetails,
    OrderSnapshot,
    PricedLine,
    SnapshotLine,
    VerifiedCheckout,
};
