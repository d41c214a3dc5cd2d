//! # reparto-db
//!
//! SQLite persistence for the Reparto tracker, async via sqlx. The
//! crate owns the pool, the embedded migrations, and the repositories;
//! callers never see a raw connection.
//!
//! ```text
//!   handler ─► Database ─► StockRepository / SaleRepository /
//!                          RenditionRepository / UserRepository
//!                              │
//!                              ▼
//!                  reparto.db (WAL, path from REPARTO_DB_PATH)
//! ```
//!
//! - [`pool`] - [`Database`] handle and [`DbConfig`] tuning
//! - [`migrations`] - schema files compiled into the binary
//! - [`error`] - [`DbError`] classification
//! - [`repository`] - all the SQL
//!
//! ## Usage
//!
//! ```rust,ignore
//! use reparto_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/reparto.db")).await?;
//! let stock = db.stocks().apply("Sifón 1.5L", StockAction::Add, 40, "user-1").await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::rendition::RenditionRepository;
pub use repository::sale::SaleRepository;
pub use repository::stock::StockRepository;
pub use repository::user::UserRepository;
