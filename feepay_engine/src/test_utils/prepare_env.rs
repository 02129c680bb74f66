use std::path::Path;

use fpg_common::Rupiah;
use log::*;
use sqlx::{migrate::MigrateDatabase, Sqlite};

use crate::{db_types::NewProduct, traits::Catalog, SqliteDatabase};

/// Creates a fresh database at `url` with the schema applied.
pub async fn prepare_test_env(url: &str) -> SqliteDatabase {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    debug!("🚀️ Logging initialised");
    create_database(url).await;
    let db = SqliteDatabase::new_with_url(url, 5).await.expect("Error creating connection to database");
    db.migrate().await.expect("Error running DB migrations");
    info!("🚀️ Migrations complete");
    db
}

pub fn random_db_path() -> String {
    let path = std::env::temp_dir().join(format!("feepay_test_{}.db", rand::random::<u64>()));
    format!("sqlite://{}", path.display())
}

pub async fn create_database<P: AsRef<Path>>(path: P) {
    let p = path.as_ref().as_os_str().to_str().unwrap();
    if let Err(e) = Sqlite::drop_database(p).await {
        trace!("Error dropping database {p}: {e:?}");
    }
    Sqlite::create_database(p).await.expect("Error creating database");
    info!("Created Sqlite database {p}");
}

/// Adds an active product at the given whole-rupiah selling price.
pub async fn seed_product(db: &SqliteDatabase, sku: &str, name: &str, selling_price: i64) {
    let cost = Rupiah::from_rupiah(selling_price - 1_000);
    let product = NewProduct::new(sku, name, cost, Rupiah::from_rupiah(selling_price));
    db.upsert_products(vec![product]).await.expect("Error seeding product");
}
