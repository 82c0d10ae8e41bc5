//! # SQLite Database methods
//!
//! This module contains "low-level" SQLite database interactions.
//!
//! All these interactions are simple functions (rather than stateful structs) that accept a `&mut SqliteConnection`
//! argument. Callers can obtain a connection from a pool, or create an atomic transaction as the need arises and call
//! through to the functions without any other changes.
use std::{env, str::FromStr, time::Duration};

use log::*;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    Error as SqlxError,
    Sqlite,
    SqlitePool,
    Transaction,
};

pub mod cart;
pub mod orders;
pub mod products;
pub mod snapshot;

const SQLITE_DB_URL: &str = "sqlite://data/checkout.db";
/// How long a connection waits for a competing writer before giving up with `SQLITE_BUSY`
const BUSY_TIMEOUT: Duration = Duration::from_secs(30);

pub fn db_url() -> String {
    let result = env::var("CHK_DATABASE_URL").unwrap_or_else(|_| {
        info!("CHK_DATABASE_URL is not set. Using the default.");
        SQLITE_DB_URL.to_string()
    });
    info!("Using database URL: {result}");
    result
}

pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, SqlxError> {
    let options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true)
        .busy_timeout(BUSY_TIMEOUT);
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect_with(options).await?;
    Ok(pool)
}

/// Opens a transaction that holds the database write lock from the start.
///
/// SQLite transactions are deferred: two transactions that both read and then try to write would deadlock, and one of
/// them fails immediately with `SQLITE_BUSY`. Issuing a no-op write first makes competing writers queue on the busy
/// timeout instead.
pub async fn begin_write(pool: &SqlitePool) -> Result<Transaction<'static, Sqlite>, SqlxError> {
    let mut tx = pool.begin().await?;
    sqlx::query("UPDATE products SET stock = stock WHERE 0").execute(&mut *tx).await?;
    trace!("🗃️ Write transaction opened");
    Ok(tx)
}
