//! Schema provisioning over a direct database connection
//!
//! The application itself only talks to the hosted REST interface; this
//! module applies the bundled migrations (tables, the one-registration-per-
//! user-and-event constraint, row-level policies) to the backing Postgres.

use sqlx::{Pool, Postgres};
use crate::config::DatabaseConfig;
use crate::utils::errors::CampusError;

pub type DatabasePool = Pool<Postgres>;

/// Create a new database connection pool
pub async fn create_pool(config: &DatabaseConfig) -> Result<DatabasePool, CampusError> {
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(config.acquire_timeout())
        .idle_timeout(config.idle_timeout())
        .connect(&config.url)
        .await?;

    // Test the connection
    sqlx::query("SELECT 1")
        .execute(&pool)
        .await?;

    tracing::info!("Database connection pool created successfully");
    Ok(pool)
}

/// Run database migrations
pub async fn run_migrations(pool: &DatabasePool) -> Result<(), CampusError> {
    tracing::info!("Running database migrations...");

    sqlx::migrate!("./migrations")
        .run(pool)
        .await?;

    tracing::info!("Database migrations completed successfully");
    Ok(())
}

/// Connect and migrate in one go
pub async fn provision(config: &DatabaseConfig) -> Result<(), CampusError> {
    let pool = create_pool(config).await?;
    run_migrations(&pool).await?;
    pool.close().await;
    Ok(())
}
