//! # SQLite Pool
//!
//! One [`Database`] handle per process: it opens the file, applies
//! pending migrations, and hands out repositories that share the pool.
//! [`DbConfig`] carries the tuning knobs; handlers borrow connections
//! through the repositories and never touch sqlx directly.
//!
//! ## WAL Mode
//! The pool opens the file in WAL (Write-Ahead Logging) mode so report
//! reads and ledger writes do not block each other. The single-writer
//! lock is what makes the guarded decrements in the repositories sound:
//! two conflicting decrements never interleave.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::rendition::RenditionRepository;
use crate::repository::sale::SaleRepository;
use crate::repository::stock::StockRepository;
use crate::repository::user::UserRepository;

// =============================================================================
// Configuration
// =============================================================================

/// Pool and migration settings for one database handle.
///
/// ## Example
/// ```rust,ignore
/// let config = DbConfig::new("/path/to/reparto.db").max_connections(8);
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// File the pool opens. `:memory:` for tests.
    pub database_path: PathBuf,

    /// Pool ceiling. Default 5 - a handful of route handlers and a
    /// report reader are the whole workload.
    pub max_connections: u32,

    /// Connections kept warm. Default 1.
    pub min_connections: u32,

    /// How long to wait for a free connection. Default 30 seconds.
    pub connect_timeout: Duration,

    /// Idle time before a connection is retired. Default 10 minutes.
    pub idle_timeout: Duration,

    /// Whether `Database::new` applies pending migrations. Default true.
    pub run_migrations: bool,
}

impl DbConfig {
    /// Creates a configuration with defaults for the given file path.
    /// The file is created on first connect if it does not exist.
    ///
    /// ## Example
    /// ```rust,ignore
    /// let config = DbConfig::new("./data/reparto.db");
    /// ```
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
            run_migrations: true,
        }
    }

    /// Overrides the pool ceiling.
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Overrides how many connections stay warm.
    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    /// Overrides the acquire timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Disables (or re-enables) applying migrations on connect.
    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    /// Configuration for an isolated in-memory database.
    ///
    /// Every test that calls this gets its own blank schema; nothing
    /// leaks between cases.
    pub fn in_memory() -> Self {
        DbConfig {
            database_path: PathBuf::from(":memory:"),
            // A second connection would see a different empty database
            max_connections: 1,
            min_connections: 1,
            connect_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(60),
            run_migrations: true,
        }
    }
}

// =============================================================================
// Database
// =============================================================================

/// Shared handle that hands out repositories over one pool.
///
/// ## Explicit Handle
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Lifecycle                                                              │
/// │                                                                         │
/// │  main() builds the handle once and threads it through AppState:        │
/// │                                                                         │
/// │  Database::new(config) ──► AppState { db, .. } ──► handlers            │
/// │                                        │                                │
/// │                                        └──► db.close() on shutdown     │
/// │                                                                         │
/// │  No global connection: every access point receives the handle,         │
/// │  so tests can build an isolated in-memory database per case.           │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
///
/// ## Usage in Handlers
/// ```rust,ignore
/// async fn list_stock(
///     State(state): State<AppState>,
/// ) -> Result<Json<Vec<StockItemDto>>, ApiError> {
///     let items = state.db.stocks().list().await?;
///     Ok(Json(items.into_iter().map(StockItemDto::from).collect()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens the database (creating the file if needed), builds the
    /// pool with WAL journaling and foreign keys on, then applies
    /// pending migrations unless the config disabled them.
    ///
    /// ## Returns
    /// * `Ok(Database)` - pool is live, schema is current
    /// * `Err(DbError)` - the file could not be opened or a migration
    ///   failed
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(
            path = %config.database_path.display(),
            "Opening database"
        );

        // mode=rwc creates the file on first open
        let connect_url = format!("sqlite://{}?mode=rwc", config.database_path.display());

        let connect_options = SqliteConnectOptions::from_str(&connect_url)
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
            .journal_mode(SqliteJournalMode::Wal)
            // NORMAL is durable against corruption; a crash may lose the
            // final transaction, which the ledger tolerates
            .synchronous(SqliteSynchronous::Normal)
            // SQLite ships with foreign keys off
            .foreign_keys(true)
            .create_if_missing(true);

        debug!("Connect options ready");

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.connect_timeout)
            .idle_timeout(Some(config.idle_timeout))
            .connect_with(connect_options)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        info!(
            max_connections = config.max_connections,
            "Pool ready"
        );

        let db = Database { pool };

        if config.run_migrations {
            db.run_migrations().await?;
        }

        Ok(db)
    }

    /// Applies all pending migrations in order.
    ///
    /// Applied versions are tracked in `_sqlx_migrations`, so running
    /// this again is a no-op. `new()` calls it automatically unless the
    /// config says otherwise.
    pub async fn run_migrations(&self) -> DbResult<()> {
        info!("Applying pending migrations");
        migrations::run_migrations(&self.pool).await?;
        info!("Schema is current");
        Ok(())
    }

    /// Direct pool access for queries no repository covers (startup
    /// status probes, ad-hoc maintenance). Handlers go through the
    /// repositories.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Repository for the stock ledger.
    ///
    /// ## Example
    /// ```rust,ignore
    /// let items = db.stocks().list().await?;
    /// ```
    pub fn stocks(&self) -> StockRepository {
        StockRepository::new(self.pool.clone())
    }

    /// Repository for the daily and weekly sale buckets.
    pub fn sales(&self) -> SaleRepository {
        SaleRepository::new(self.pool.clone())
    }

    /// Repository for renditions and contrafactura state.
    pub fn renditions(&self) -> RenditionRepository {
        RenditionRepository::new(self.pool.clone())
    }

    /// Repository for user accounts and revoked tokens.
    pub fn users(&self) -> UserRepository {
        UserRepository::new(self.pool.clone())
    }

    /// Closes the pool. Called on graceful shutdown; every repository
    /// operation after this fails.
    pub async fn close(&self) {
        info!("Closing database pool");
        self.pool.close().await;
    }

    /// True when the database still answers a trivial query.
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .is_ok()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_database() {
        let config = DbConfig::in_memory();
        let db = Database::new(config).await.unwrap();

        assert!(db.health_check().await);
    }

    #[tokio::test]
    async fn test_config_builder() {
        let config = DbConfig::new("/tmp/reparto-test.db")
            .max_connections(8)
            .min_connections(2);

        assert_eq!(config.max_connections, 8);
        assert_eq!(config.min_connections, 2);
    }

    #[tokio::test]
    async fn test_migrations_idempotent() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        // Running again must be a no-op, not an error
        db.run_migrations().await.unwrap();
    }
}
