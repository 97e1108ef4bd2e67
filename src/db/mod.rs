//! Database module for persistent storage.
//!
//! Async SQLite access through SQLx for:
//! - Accounts and their Discord / Twitch identities
//! - The append-only PB log
//! - Qualifying events and eligibility

mod events;
mod scores;
mod users;

pub use events::{Event, EventRepository, IneligibleReason};
pub use scores::{ScoreRecord, ScoreRepository};
pub use users::{Account, Identity, UserRepository};
#[cfg(test)]
pub(crate) use users::link_identity;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

static MEMDB_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(sqlx::Error),
    #[error("migration error: {0}")]
    Migration(sqlx::migrate::MigrateError),
    #[error("event already exists: {0}")]
    EventExists(String),
    #[error("internal error: {0}")]
    Internal(String),
}

/// Database handle with connection pool.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

    /// Idle timeout for file-backed pools.
    const IDLE_TIMEOUT: Duration = Duration::from_secs(60);

    /// Open the database at `path` and apply pending migrations.
    ///
    /// `":memory:"` opens a private in-memory database. Otherwise the parent
    /// directory must already exist; `config::validate` reports it when it
    /// does not.
    pub async fn new(path: &str) -> Result<Self, DbError> {
        let pool = if path == ":memory:" {
            // A shared-cache memdb lives only while a connection holds it, so
            // the single connection is never reaped.
            let id = MEMDB_COUNTER.fetch_add(1, Ordering::Relaxed);
            let name = format!(
                "file:ctmbot-memdb-{}-{}?mode=memory&cache=shared",
                std::process::id(),
                id
            );
            Self::pool_options(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(Self::connect_options(&name).shared_cache(true))
                .await?
        } else {
            Self::pool_options(5)
                .idle_timeout(Some(Self::IDLE_TIMEOUT))
                .connect_with(Self::connect_options(path))
                .await?
        };

        info!(path = %path, "Database connected");

        Self::run_migrations(&pool).await?;

        for pragma in ["PRAGMA journal_mode=WAL", "PRAGMA synchronous=NORMAL"] {
            sqlx::query(pragma).execute(&pool).await?;
        }

        Ok(Self { pool })
    }

    fn pool_options(max_connections: u32) -> SqlitePoolOptions {
        SqlitePoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Self::ACQUIRE_TIMEOUT)
            .test_before_acquire(true)
    }

    fn connect_options(filename: &str) -> SqliteConnectOptions {
        SqliteConnectOptions::new()
            .filename(filename)
            .create_if_missing(true)
            .foreign_keys(true)
    }

    /// Get reference to the underlying connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Run embedded migrations.
    async fn run_migrations(pool: &SqlitePool) -> Result<(), DbError> {
        sqlx::migrate!("./migrations")
            .run(pool)
            .await
            .map_err(DbError::Migration)?;

        info!("Database migrations checked/applied");
        Ok(())
    }

    /// Get user repository.
    pub fn users(&self) -> UserRepository<'_> {
        UserRepository::new(&self.pool)
    }

    /// Get score repository.
    pub fn scores(&self) -> ScoreRepository<'_> {
        ScoreRepository::new(&self.pool)
    }

    /// Get event repository.
    pub fn events(&self) -> EventRepository<'_> {
        EventRepository::new(&self.pool)
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        DbError::Sqlx(err)
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::Migration(err)
    }
}
