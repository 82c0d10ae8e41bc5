//! # Checkout server
//!
//! The HTTP front end of the checkout engine. It is responsible for:
//! * Accepting signed payment receipts from clients and finalizing them into orders.
//! * Managing the signed-in user's persisted cart, including merging the anonymous cart after sign-in.
//! * Serving the user's order history and public catalog reads.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/checkout/finalize`: Finalizes an order for a payment receipt. Identity is optional.
//! * `/products/{id}`: Public catalog read.
//! * `/api/cart`, `/api/cart/items`, `/api/cart/merge`, `/api/orders`: Routes that require a bearer token.
pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod helpers;
pub mod routes;
pub mod server;
