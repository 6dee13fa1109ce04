use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::{debug, info};

use shared_config::AppConfig;

use crate::error::DatabaseError;

const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

fn pool_options(config: &AppConfig) -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(config.database_max_connections.max(1))
        .acquire_timeout(ACQUIRE_TIMEOUT)
}

/// Open the shared connection pool, failing fast if the database is unreachable.
pub async fn connect(config: &AppConfig) -> Result<PgPool> {
    debug!("Connecting to database with {} max connections", config.database_max_connections);

    let pool = pool_options(config)
        .connect(&config.database_url)
        .await
        .context("failed to connect to PostgreSQL")?;

    info!("Connected to PostgreSQL");
    Ok(pool)
}

/// Pool that only dials on first use. Lets routers be built without a live database.
pub fn connect_lazy(config: &AppConfig) -> Result<PgPool> {
    pool_options(config)
        .connect_lazy(&config.database_url)
        .context("invalid DATABASE_URL")
}

pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("failed to apply database migrations")?;

    info!("Database schema is up to date");
    Ok(())
}

pub async fn ping(pool: &PgPool) -> Result<(), DatabaseError> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}
