use log::*;
use sqlx::{migrate::MigrateDatabase, Sqlite};

use crate::{
    db_types::{Money, NewProduct},
    ProductCatalog,
    SqliteDatabase,
};

/// Creates a fresh database at `url`, runs the migrations and returns a connected backend.
pub async fn prepare_test_env(url: &str) -> SqliteDatabase {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    debug!("🚀️ Logging initialised");
    create_database(url).await;
    let db = SqliteDatabase::new_with_url(url, 25).await.expect("Error creating connection to database");
    db.run_migrations().await.expect("Error running DB migrations");
    db
}

pub fn random_db_path() -> String {
    let dir = std::env::temp_dir();
    format!("sqlite://{}/test_checkout_{}.db", dir.display(), rand::random::<u64>())
}

pub async fn create_database(url: &str) {
    if let Err(e) = Sqlite::drop_database(url).await {
        trace!("Could not drop database {url}: {e:?}");
    }
    Sqlite::create_database(url).await.expect("Error creating database");
    info!("Created Sqlite database {url}");
}

/// Stocks the catalog. `products` are `(id, price, stock)` triples, with prices as decimal strings.
pub async fn seed_products(db: &SqliteDatabase, products: &[(&str, &str, i64)]) {
    for (id, price, stock) in products {
        let price = price.parse::<Money>().expect("Invalid price");
        let product = NewProduct::new(*id, &format!("Product {id}"), price, *stock);
        db.upsert_product(product).await.expect("Error seeding product");
    }
}
