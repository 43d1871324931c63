use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Executor;
use std::time::Duration;

use super::EngineConfig;

const SCHEMA: &str = include_str!("../../migrations/0001_congestion.sql");

pub async fn create_pool(config: &EngineConfig) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .min_connections(config.db_min_connections)
        .acquire_timeout(Duration::from_secs(config.db_acquire_timeout_secs))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .test_before_acquire(true)
        .connect(&config.database_url)
        .await?;

    sqlx::query("SELECT 1")
        .execute(&pool)
        .await
        .map_err(|e| anyhow::anyhow!("Database connection validation failed: {}", e))?;

    Ok(pool)
}

/// Applies the bundled DDL. Every statement is `IF NOT EXISTS`.
pub async fn init_schema(pool: &PgPool) -> anyhow::Result<()> {
    pool.execute(SCHEMA)
        .await
        .map_err(|e| anyhow::anyhow!("Schema initialisation failed: {}", e))?;
    Ok(())
}
