use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{Connection, PgPool};
use std::str::FromStr;
use std::time::Duration;

pub mod migrate;
pub mod queries;
pub mod schema;
pub mod seed;

/// Connection bounds for the managed Postgres instance.
///
/// The provider caps the server at 22 connections; 20 are left for the app
/// and 2 for admin/monitoring sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolPolicy {
    pub max_open: u32,
    /// Maps to sqlx `min_connections`: a floor of connections kept warm,
    /// not a cap on idle ones. Clamped to `max_open`.
    pub max_idle: u32,
    pub max_lifetime: Duration,
    pub max_idle_time: Duration,
}

pub const POOL_POLICY: PoolPolicy = PoolPolicy {
    max_open: 20,
    max_idle: 10,
    max_lifetime: Duration::from_secs(60 * 60),
    max_idle_time: Duration::from_secs(10 * 60),
};

impl PoolPolicy {
    pub fn options(&self) -> PgPoolOptions {
        PgPoolOptions::new()
            .max_connections(self.max_open)
            .min_connections(self.max_idle.min(self.max_open))
            .max_lifetime(self.max_lifetime)
            .idle_timeout(self.max_idle_time)
    }
}

/// Which step of bringing the pool up failed.
#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    #[error("Invalid DATABASE_URL: {0}")]
    InvalidDsn(#[source] sqlx::Error),

    #[error("Failed to connect to database: {0}")]
    Open(#[source] sqlx::Error),

    #[error("Failed to get database instance: {0}")]
    Acquire(#[source] sqlx::Error),

    #[error("Database ping failed: {0}")]
    Ping(#[source] sqlx::Error),
}

/// Open the pool and prove the server answers with an explicit round-trip.
pub async fn init_pool(database_url: &str) -> Result<PgPool, ConnectError> {
    let pool = open_pool(database_url, POOL_POLICY.options()).await?;

    tracing::info!(
        max_open = POOL_POLICY.max_open,
        max_idle = POOL_POLICY.max_idle,
        "Connected to PostgreSQL with connection pooling"
    );
    Ok(pool)
}

async fn open_pool(database_url: &str, pool_options: PgPoolOptions) -> Result<PgPool, ConnectError> {
    let options = PgConnectOptions::from_str(database_url).map_err(ConnectError::InvalidDsn)?;

    let pool = pool_options
        .connect_with(options)
        .await
        .map_err(ConnectError::Open)?;

    ping(&pool).await?;
    Ok(pool)
}

pub async fn ping(pool: &PgPool) -> Result<(), ConnectError> {
    let mut conn = pool.acquire().await.map_err(ConnectError::Acquire)?;
    conn.ping().await.map_err(ConnectError::Ping)
}

/// Bring the store to a servable state: connect, then migrate and seed.
pub async fn init(database_url: &str) -> Result<PgPool, crate::error::StartupError> {
    tracing::info!("Connecting to PostgreSQL database");
    let pool = init_pool(database_url).await?;

    migrate::run(&pool).await?;

    Ok(pool)
}
