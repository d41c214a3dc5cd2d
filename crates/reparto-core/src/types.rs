//! # Core Types
//!
//! The records and enums every other crate speaks in.
//!
//! ```text
//!   StockItem            Sale                 Rendition
//!   ├ product (key)      ├ id (UUID)          ├ id (UUID)
//!   └ quantity ≥ 0       ├ product            ├ client_id
//!                        ├ quantity > 0       ├ boxes in/out
//!                        └ user_id            └ balance_cents
//!
//!   StockAction          PaymentMethod        Role
//!   ├ Add  ├ Return      ├ Cash               ├ Admin
//!   ├ Request            └ Transfer           └ User
//!   └ Sale
//! ```
//!
//! ## Identity
//! Sales, renditions and users carry UUID v4 ids. Stock items use the
//! product name itself as the key - the ledger is a product → quantity map.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::money::Money;

// =============================================================================
// Stock Action
// =============================================================================

/// A mutation applied to the stock ledger.
///
/// Closed set: an unrecognized tag fails deserialization instead of hitting
/// a runtime default branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StockAction {
    /// New merchandise arriving from the supplier. Increments.
    Add,
    /// Boxes coming back from a route unsold. Increments.
    Return,
    /// Boxes withdrawn for a route without a consummated sale. Decrements.
    Request,
    /// A consummated sale. Decrements and appends a Sale record.
    Sale,
}

impl StockAction {
    /// True for actions that take stock out of the ledger.
    #[inline]
    pub const fn is_decrement(&self) -> bool {
        matches!(self, StockAction::Request | StockAction::Sale)
    }

    /// True for the one action that also appends a Sale record.
    ///
    /// ## Rules
    /// `request` withdraws stock for a route but records no sale; only
    /// `sale` writes into the daily sale bucket.
    #[inline]
    pub const fn records_sale(&self) -> bool {
        matches!(self, StockAction::Sale)
    }
}

impl fmt::Display for StockAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            StockAction::Add => "add",
            StockAction::Return => "return",
            StockAction::Request => "request",
            StockAction::Sale => "sale",
        };
        f.write_str(tag)
    }
}

// =============================================================================
// Stock Item
// =============================================================================

/// A per-product stock level.
///
/// Created implicitly the first time an `add`/`return` references an unseen
/// product; never deleted in normal flow. `quantity` never goes negative -
/// decrements are rejected up front rather than repaired after the fact.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StockItem {
    /// Product name - the ledger key.
    pub product: String,

    /// Units on hand. Invariant: >= 0.
    pub quantity: i64,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Sale
// =============================================================================

/// A recorded sale in the daily bucket.
///
/// Immutable once created; the only lifecycle event is bulk archival into
/// [`WeeklySale`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Sale {
    /// UUID v4 primary key.
    pub id: String,

    pub product: String,

    /// Units sold. Invariant: > 0.
    pub quantity: i64,

    /// Principal the sale is attributed to.
    pub user_id: String,

    /// Server-assigned timestamp.
    pub created_at: DateTime<Utc>,
}

/// A sale that has been rolled over into the weekly archive.
///
/// Same shape as [`Sale`] plus the archival stamp; `id`, `created_at` and
/// attribution are preserved verbatim by the roll-over.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct WeeklySale {
    pub id: String,
    pub product: String,
    pub quantity: i64,
    pub user_id: String,
    pub created_at: DateTime<Utc>,

    /// When the roll-over that captured this sale ran.
    pub archived_at: DateTime<Utc>,
}

// =============================================================================
// Payment Method
// =============================================================================

/// How a rendition's payment was made.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Physical cash handed over on the route.
    Cash,
    /// Bank transfer.
    Transfer,
}

impl Default for PaymentMethod {
    fn default() -> Self {
        PaymentMethod::Cash
    }
}

// =============================================================================
// Rendition
// =============================================================================

/// One reconciliation event between the business and a client.
///
/// ## Invariants
/// - `sold_boxes <= initial_boxes + recharge_boxes - return_boxes`
/// - `balance_cents >= 0` always; at creation `payment_amount_cents` may
///   never exceed `sale_amount_cents` (hard reject, no clamp)
/// - `client_details` is bound by the client's first rendition; later
///   renditions must carry the identical string
/// - any rendition with `balance_cents > 0` marks the client delinquent
///   and blocks new renditions for that client
///
/// Mutated only by payment postings (payment goes up, balance goes down);
/// deleted only by a per-principal bulk reset.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Rendition {
    /// UUID v4 primary key.
    pub id: String,

    /// Principal that submitted the rendition.
    pub user_id: String,

    /// Product type being reconciled; must exist in the stock ledger.
    pub product_type: String,

    /// Client business identifier.
    pub client_id: String,

    /// Free-text identity binding (name, address, tax id...).
    pub client_details: String,

    /// Boxes the client started the period with.
    pub initial_boxes: i64,

    /// Boxes delivered during the period.
    pub recharge_boxes: i64,

    /// Boxes the client sold.
    pub sold_boxes: i64,

    /// Boxes handed back unsold.
    pub return_boxes: i64,

    /// Total owed for the period, in cents.
    pub sale_amount_cents: i64,

    /// Paid so far, in cents. Only ever increases.
    pub payment_amount_cents: i64,

    pub payment_method: PaymentMethod,

    /// Outstanding contrafactura, in cents. Derived:
    /// `max(sale_amount_cents - payment_amount_cents, 0)`.
    pub balance_cents: i64,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Rendition {
    /// Sale total as [`Money`].
    #[inline]
    pub fn sale_amount(&self) -> Money {
        Money::from_cents(self.sale_amount_cents)
    }

    /// Payments received so far as [`Money`].
    #[inline]
    pub fn payment_amount(&self) -> Money {
        Money::from_cents(self.payment_amount_cents)
    }

    /// Outstanding balance as [`Money`].
    #[inline]
    pub fn balance(&self) -> Money {
        Money::from_cents(self.balance_cents)
    }

    /// A settled rendition has been paid down to zero.
    ///
    /// Settled is terminal for payments: any further posting fails with
    /// an over-payment error since the remaining balance is 0.
    #[inline]
    pub fn is_settled(&self) -> bool {
        self.balance_cents == 0
    }

    /// True while the rendition still carries a contrafactura.
    #[inline]
    pub fn is_pending(&self) -> bool {
        self.balance_cents > 0
    }
}

// =============================================================================
// Principal
// =============================================================================

/// Role attached to a principal. Gates registration and reports.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    #[inline]
    pub const fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::User
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Admin => f.write_str("admin"),
            Role::User => f.write_str("user"),
        }
    }
}

/// An authenticated principal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct User {
    /// UUID v4 primary key.
    pub id: String,

    pub username: String,

    /// Argon2id PHC string. Never serialized outward.
    #[serde(skip_serializing)]
    pub password_hash: String,

    pub role: Role,

    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================
