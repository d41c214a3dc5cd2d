//! # Repositories
//!
//! All SQL lives here. Handlers call a repository method; the method
//! owns the statements, the guards, and (where several writes must
//! land together) the transaction. Each repository clones the shared
//! pool, so they are cheap to hand out per request.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  handler ──► db.stocks().apply("Sifón", Sale, 3, user)      │
//! │                  │                                           │
//! │                  ▼                                           │
//! │  StockRepository: guard check ► UPDATE ► daily_sales append  │
//! │                  │                                           │
//! │                  ▼                                           │
//! │  SQLite (WAL, single writer)                                 │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`stock::StockRepository`] - Stock ledger mutations and reads
//! - [`sale::SaleRepository`] - Daily/weekly sale buckets and archival
//! - [`rendition::RenditionRepository`] - Rendition lifecycle and payments
//! - [`user::UserRepository`] - Principals and token revocation

pub mod rendition;
pub mod sale;
pub mod stock;
pub mod user;
