//! Test database bootstrap: every integration test gets its own throwaway SQLite file with the schema applied.
use log::*;
use sqlx::{migrate, migrate::MigrateDatabase, Sqlite};

use crate::SqliteDatabase;

/// A unique database URL under the workspace `data/` directory.
pub fn random_db_path() -> String {
    format!("sqlite://../data/plateful_test_{:08x}", rand::random::<u32>())
}

/// Drops any stale database at `url`, recreates it and applies the schema. Also initialises logging from
/// `.env.test`. Call once at the top of each test.
pub async fn prepare_test_env(url: &str) {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    if let Err(e) = Sqlite::drop_database(url).await {
        trace!("🧪️ Nothing to drop at {url}: {e}");
    }
    Sqlite::create_database(url).await.expect("Error creating test database");
    debug!("🧪️ Test database created at {url}");
    run_migrations(url).await;
}

pub async fn run_migrations(url: &str) {
    let db = SqliteDatabase::new_with_url(url, 5).await.expect("Error connecting to test database");
    migrate!("./src/sqlite/migrations").run(db.pool()).await.expect("Error applying schema migrations");
    debug!("🧪️ Schema applied to {url}");
}
