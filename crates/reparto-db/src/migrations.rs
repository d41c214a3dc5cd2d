//! # Schema Migrations
//!
//! The schema ships inside the binary: `sqlx::migrate!` embeds every file
//! under `migrations/sqlite/` at compile time, and startup applies the ones
//! `_sqlx_migrations` has not recorded yet, in filename order. A fresh
//! deployment and a long-lived one converge on the same schema with no
//! runtime file access.
//!
//! To extend the schema, add `migrations/sqlite/NNN_description.sql`
//! with the next sequence number (e.g. `003_add_routes_table.sql`) and
//! prefer `IF NOT EXISTS` forms. Applied files are checksummed, so
//! history is append-only; editing an old file makes startup fail.

use sqlx::SqlitePool;
use tracing::info;

use crate::error::DbResult;

/// The compiled-in migration set.
///
/// ```text
/// migrations/sqlite/
/// ├── 001_initial_schema.sql  # Stock ledger, sale buckets, renditions
/// ├── 002_users_auth.sql      # Users and token revocation
/// └── ...
/// ```
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Applies every migration the database has not seen yet.
///
/// Each migration runs in its own transaction and is recorded with its
/// checksum, so re-running is a no-op and an edited historical file is
/// refused instead of silently diverging.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    MIGRATOR.run(pool).await?;

    info!("Migrations applied");
    Ok(())
}

/// Returns `(total_migrations, applied_migrations)` for startup logging
/// and health checks.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let total = MIGRATOR.migrations.len();

    // The table does not exist before the first run_migrations
    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations")
        .fetch_one(pool)
        .await
        .unwrap_or(0);

    Ok((total, applied as usize))
}
