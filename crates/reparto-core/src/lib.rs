//! # reparto-core
//!
//! The rules that keep stock levels, sale records, and client balances
//! consistent. Everything in this crate is a pure function over plain
//! types: no database, no network, no clock. The server and the
//! repositories call in; nothing calls out.
//!
//! ```text
//!   apps/server (HTTP)
//!        │
//!        ▼
//!   reparto-core ── types · money · rendition rules · validation
//!        │
//!        ▼
//!   reparto-db (SQLite repositories)
//! ```
//!
//! ## Modules
//!
//! - [`types`] - StockItem, Sale, Rendition, User, and friends
//! - [`money`] - integer-centavo [`Money`]
//! - [`rendition`] - reconciliation rules: box closure, balances, payments
//! - [`error`] - typed domain failures
//! - [`validation`] - field-level input checks
//!
//! Amounts are `i64` centavos throughout, failures are enum variants
//! rather than strings, and every function here gives the same answer
//! for the same input.
//!
//! ```rust
//! use reparto_core::money::Money;
//!
//! let sale = Money::from_cents(10_000);    // $100.00
//! let payment = Money::from_cents(4_000);  // $40.00
//!
//! // Outstanding balance never goes below zero
//! let balance = sale.saturating_sub(payment);
//! assert_eq!(balance.cents(), 6_000);
//! assert_eq!(payment.saturating_sub(sale), Money::zero());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod rendition;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports
// =============================================================================
// `use reparto_core::Money` instead of `use reparto_core::money::Money`

pub use error::{DomainError, DomainResult, ValidationError};
pub use money::Money;
pub use rendition::RenditionInput;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum length of a product name in the stock ledger.
///
/// Product names double as primary keys, so runaway strings would bloat
/// every index that references them.
pub const MAX_PRODUCT_NAME_LEN: usize = 120;

/// Maximum length of a client identifier on a rendition.
pub const MAX_CLIENT_ID_LEN: usize = 80;

/// Maximum length of the free-text client details binding.
pub const MAX_CLIENT_DETAILS_LEN: usize = 500;

/// Maximum quantity accepted by a single stock mutation.
///
/// A route truck carries boxes, not container ships; anything above this
/// is a typo (e.g. a scanned barcode landing in the quantity field).
pub const MAX_MUTATION_QUANTITY: i64 = 1_000_000;

/// Maximum monetary amount (in cents) accepted on a rendition or payment.
///
/// Keeps balance sums far away from i64 overflow territory.
pub const MAX_AMOUNT_CENTS: i64 = 10_000_000_000; // $100M
