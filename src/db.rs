use crate::config::DatabaseSettings;
use anyhow::{Context, Result};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;
use std::time::Duration;
use tracing::info;

pub async fn create_pool(settings: &DatabaseSettings) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .min_connections(settings.min_connections)
        .acquire_timeout(Duration::from_secs(settings.connect_timeout_seconds))
        .idle_timeout(Duration::from_secs(60))
        .max_lifetime(Duration::from_secs(3600))
        .connect_with(
            settings
                .connection_string()
                .parse::<PgConnectOptions>()
                .context("Invalid database connection string")?,
        )
        .await
        .context("Failed to create database connection pool")?;

    // Verify the pool is usable before running migrations
    pool.acquire()
        .await
        .context("Failed to acquire initial database connection")?;

    run_migrations(&pool).await?;

    info!(
        "Database pool ready ({}..{} connections to {}:{}/{})",
        settings.min_connections,
        settings.max_connections,
        settings.host,
        settings.port,
        settings.database_name
    );

    Ok(pool)
}

pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("Failed to run database migrations")
}
