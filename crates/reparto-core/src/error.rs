//! # Domain Failures
//!
//! Two layers: [`ValidationError`] for field-level input problems, and
//! [`DomainError`] for business rules (field checks fold into it via
//! `From`). The database crate wraps both in its own error, and the
//! server maps that onto status codes, so the chain a client sees is
//! `ValidationError → DomainError → DbError → ApiError`.
//!
//! Every variant carries the context a route message needs (product,
//! client id, amounts), and every variant is detected before any state
//! is mutated.

use thiserror::Error;

// =============================================================================
// Domain Error
// =============================================================================

/// Business rule violations.
///
/// All of these are terminal for the request that triggered them: the caller
/// must correct the input and retry. None of them leaves partial state
/// behind.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Product does not exist in the stock ledger.
    ///
    /// ## When This Occurs
    /// - A rendition references a `product_type` the ledger has never seen
    /// - A stock read targets an unknown product
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Stock cannot cover the requested decrement.
    ///
    /// ## When This Occurs
    /// - A `request`/`sale` stock action exceeds the current quantity
    ///   (a missing product counts as quantity 0 on this path)
    /// - A rendition's `sold_boxes` exceeds the ledger quantity for its
    ///   `product_type`
    #[error("Insufficient stock for {product}: available {available}, requested {requested}")]
    InsufficientStock {
        product: String,
        available: i64,
        requested: i64,
    },

    /// Payment exceeds the sale amount at rendition creation.
    ///
    /// Creation is a hard rejection; only the payment-posting path clamps.
    #[error("Payment {payment_cents} exceeds sale amount {sale_cents}")]
    InvalidPayment { sale_cents: i64, payment_cents: i64 },

    /// Sold boxes exceed what the client could possibly have on hand.
    ///
    /// The box-accounting closure is
    /// `sold_boxes <= initial_boxes + recharge_boxes - return_boxes`.
    #[error("Sold boxes {sold} exceed available boxes {available}")]
    BoxOverrun { sold: i64, available: i64 },

    /// Submitted client details differ from the identity bound at the
    /// client's first rendition.
    #[error("Client details for {client_id} do not match the registered details")]
    ClientIdentityConflict { client_id: String },

    /// The client still owes money on a prior rendition.
    ///
    /// ## When This Occurs
    /// Any existing rendition for the client has `balance > 0`. New
    /// renditions are blocked until the contrafactura is paid down to zero.
    #[error("Client {client_id} has an outstanding contrafactura of {outstanding_cents} cents")]
    ClientDelinquent {
        client_id: String,
        outstanding_cents: i64,
    },

    /// Rendition not found.
    #[error("Rendition not found: {0}")]
    RenditionNotFound(String),

    /// Payment posting amount is zero or negative.
    #[error("Invalid payment amount: {amount_cents} cents")]
    InvalidAmount { amount_cents: i64 },

    /// Payment posting amount exceeds the remaining balance.
    ///
    /// A settled rendition (balance 0) rejects every further payment with
    /// this error.
    #[error("Payment of {amount_cents} cents exceeds outstanding balance of {balance_cents} cents")]
    OverPayment {
        amount_cents: i64,
        balance_cents: i64,
    },

    /// A field check failed before any rule ran.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Field-level rejections, raised by the `validation` module before any
/// business rule runs. The display strings are exactly what route
/// handlers put in the error body, so they name the field first.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Empty or missing where a value is mandatory.
    #[error("{field} is required")]
    Required { field: String },

    /// Under the field's minimum length.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Over the field's maximum length.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Outside the field's numeric bounds.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Zero or negative where only positive counts make sense.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Negative where zero is still acceptable.
    #[error("{field} must not be negative")]
    MustBeNonNegative { field: String },

    /// Malformed content, e.g. forbidden characters in a username.
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Shorthand for fallible rule evaluations.
pub type DomainResult<T> = Result<T, DomainError>;

// =============================================================================
// Unit Tests
// =============================================================================
