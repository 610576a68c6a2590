use once_cell::sync::OnceCell;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::config;
use crate::database::ServiceRole;

/// Errors from DatabaseManager
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error("Query error: {0}")]
    QueryError(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Connection pool manager for the caller-scoped and service-role pools.
///
/// `DATABASE_URL` backs the caller-scoped pool; `SERVICE_DATABASE_URL` (a role
/// that may bypass row-level security) backs the service pool and falls back to
/// `DATABASE_URL` in single-role deployments. Pools connect lazily so the
/// server can boot before the database is reachable.
pub struct DatabaseManager;

impl DatabaseManager {
    /// Get the caller-scoped application pool
    pub fn app_pool() -> Result<PgPool, DatabaseError> {
        static POOL: OnceCell<PgPool> = OnceCell::new();
        POOL.get_or_try_init(|| {
            let url = std::env::var("DATABASE_URL")
                .map_err(|_| DatabaseError::ConfigMissing("DATABASE_URL"))?;
            Self::build_pool(&url)
        })
        .cloned()
    }

    /// Get the service-role pool wrapped in its capability type
    pub fn service_role() -> Result<ServiceRole, DatabaseError> {
        static POOL: OnceCell<PgPool> = OnceCell::new();
        POOL.get_or_try_init(|| {
            let url = std::env::var("SERVICE_DATABASE_URL")
                .or_else(|_| std::env::var("DATABASE_URL"))
                .map_err(|_| DatabaseError::ConfigMissing("DATABASE_URL"))?;
            Self::build_pool(&url)
        })
        .cloned()
        .map(ServiceRole::new)
    }

    fn build_pool(database_url: &str) -> Result<PgPool, DatabaseError> {
        let parsed = url::Url::parse(database_url).map_err(|_| DatabaseError::InvalidDatabaseUrl)?;
        info!(
            "creating database pool for {}{}",
            parsed.host_str().unwrap_or("localhost"),
            parsed.path()
        );

        let db_config = &config::config().database;
        let pool = PgPoolOptions::new()
            .max_connections(db_config.max_connections)
            .acquire_timeout(Duration::from_secs(db_config.acquire_timeout_secs))
            .connect_lazy(database_url)?;

        Ok(pool)
    }

    /// Run embedded migrations against the given pool
    pub async fn migrate(pool: &PgPool) -> Result<(), DatabaseError> {
        sqlx::migrate!()
            .run(pool)
            .await
            .map_err(|e| DatabaseError::QueryError(e.to_string()))
    }

    /// Pings the application pool to ensure connectivity
    pub async fn health_check(pool: &PgPool) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(pool).await?;
        Ok(())
    }
}
