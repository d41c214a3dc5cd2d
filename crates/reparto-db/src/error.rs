//! # Storage Errors
//!
//! Everything a repository can fail with funnels through [`DbError`].
//! Failures arrive from two directions: the SQLite driver (connection,
//! constraint, and query errors) and `reparto-core` rule checks, which
//! run inside repository transactions and surface as [`DbError::Domain`].
//! The server layer turns a `DbError` into a status code and JSON body;
//! nothing below the HTTP surface formats user-facing messages.

use thiserror::Error;

use reparto_core::DomainError;

/// Everything a repository call can fail with.
#[derive(Debug, Error)]
pub enum DbError {
    /// A business rule rejected the operation.
    ///
    /// ## When This Occurs
    /// - Rendition creation fails a check (identity, delinquency, stock)
    /// - A stock decrement would push quantity negative
    /// - A payment posting exceeds the outstanding balance
    ///
    /// The checks run inside the repository so they see the same
    /// transaction as the writes they guard.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// A lookup by id matched nothing.
    ///
    /// Raised both when `fetch_one` comes back empty and when a caller
    /// asks for an entity that was never created.
    #[error("{entity} not found: {id}")]
    NotFound {
        entity: String,
        id: String,
    },

    /// An INSERT collided with a UNIQUE index.
    ///
    /// ## When This Occurs
    /// - Registering a username that is already taken
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation {
        field: String,
        value: String,
    },

    /// CHECK constraint violation.
    ///
    /// ## When This Occurs
    /// - A write slips past a repository guard (quantity < 0,
    ///   balance < 0, unknown payment method)
    ///
    /// The schema carries CHECKs as a second line of defense, so this
    /// surfacing means a repository bug, not bad user input.
    #[error("Check constraint violation: {message}")]
    CheckViolation {
        message: String,
    },

    /// The database file could not be opened or the pool is gone.
    /// Usually a missing parent directory, bad permissions, or a full
    /// disk.
    #[error("Database connection failed: {0}")]
    ConnectionFailed(String),

    /// A schema migration did not apply. Bad SQL in a new migration,
    /// or a historical file was edited after being applied and its
    /// checksum no longer matches.
    #[error("Schema migration failed: {0}")]
    MigrationFailed(String),

    /// SQLite rejected a statement for a reason that is not a
    /// recognized constraint.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Transaction failed to commit, or a row changed underneath an
    /// optimistic update. No partial state was written.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// Every pooled connection stayed busy past the acquire timeout.
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Driver errors with no better classification.
    #[error("Internal storage error: {0}")]
    Internal(String),
}

impl DbError {
    /// Builds [`DbError::NotFound`] for an entity type and id.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Shorthand for [`DbError::UniqueViolation`].
    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// Classify driver errors.
///
/// SQLite reports every constraint violation as an opaque `Database`
/// error, so the message text is the only way to tell a UNIQUE failure
/// from a CHECK failure. The formats are stable:
/// `UNIQUE constraint failed: <table>.<column>` and
/// `CHECK constraint failed: <detail>`.
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "Record".to_string(),
                id: "unknown".to_string(),
            },

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                if msg.contains("UNIQUE constraint failed") {
                    // Keep the table.column suffix as the field name
                    let field = msg
                        .split("UNIQUE constraint failed: ")
                        .nth(1)
                        .unwrap_or("unknown")
                        .to_string();
                    DbError::UniqueViolation {
                        field,
                        value: "unknown".to_string(),
                    }
                } else if msg.contains("CHECK constraint failed") {
                    DbError::CheckViolation {
                        message: msg.to_string(),
                    }
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => {
                DbError::ConnectionFailed("pool is closed".to_string())
            }

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Shorthand for repository results.
pub type DbResult<T> = Result<T, DbError>;
