//! Persistence for the gallery and job history.
//!
//! Two backends implement the [`GalleryStore`](store::GalleryStore)
//! contract: Postgres via `sqlx` (selected when `DATABASE_URL` is set) and
//! a JSON-file store for credential-free deployments. Job-history tracking
//! only exists on the relational backend; the file store accepts the same
//! calls as no-ops.

pub mod file;
pub mod models;
pub mod postgres;
pub mod store;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

pub use file::FileGalleryStore;
pub use postgres::PostgresGalleryStore;
pub use store::{GalleryStore, StoreError};

/// Open a Postgres pool against `database_url`.
pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(25)
        .connect(database_url)
        .await
}

/// Apply embedded migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

/// Cheap liveness probe for the pool.
pub async fn health_check(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}
