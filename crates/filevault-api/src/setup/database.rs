//! Database pool and migrations.

use anyhow::Result;
use filevault_core::Config;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::path::Path;
use std::time::Duration;

/// Connect to Postgres and run pending migrations.
pub async fn setup_database(config: &Config) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections())
        .acquire_timeout(Duration::from_secs(config.db_timeout_seconds()))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .connect(config.database_url())
        .await?;

    let migrations_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../migrations");
    let migrator = Migrator::new(migrations_dir).await?;
    migrator.run(&pool).await?;

    tracing::info!(
        max_connections = config.db_max_connections(),
        "Database connected and migrated"
    );
    Ok(pool)
}
