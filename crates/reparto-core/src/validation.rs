//! # Field Validation
//!
//! Length, range, and sign checks for request fields. These run after
//! axum has already rejected malformed bodies and closed-enum misses,
//! and before any business check or write; the schema's NOT NULL and
//! CHECK constraints sit underneath as the last line.
//!
//! ```rust
//! use reparto_core::validation::{validate_product_name, validate_quantity};
//!
//! validate_product_name("Sifón 1.5L").unwrap();
//! validate_quantity(12).unwrap();
//! assert!(validate_quantity(0).is_err());
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::{
    MAX_AMOUNT_CENTS, MAX_CLIENT_DETAILS_LEN, MAX_CLIENT_ID_LEN, MAX_MUTATION_QUANTITY,
    MAX_PRODUCT_NAME_LEN,
};

/// Shorthand for fallible field checks.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a product name (the stock ledger key).
///
/// ## Rules
/// - Must not be empty after trimming
/// - Must be at most [`MAX_PRODUCT_NAME_LEN`] characters
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "product".to_string(),
        });
    }

    if name.len() > MAX_PRODUCT_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "product".to_string(),
            max: MAX_PRODUCT_NAME_LEN,
        });
    }

    Ok(())
}

/// Validates a client identifier on a rendition.
pub fn validate_client_id(client_id: &str) -> ValidationResult<()> {
    let client_id = client_id.trim();

    if client_id.is_empty() {
        return Err(ValidationError::Required {
            field: "clientId".to_string(),
        });
    }

    if client_id.len() > MAX_CLIENT_ID_LEN {
        return Err(ValidationError::TooLong {
            field: "clientId".to_string(),
            max: MAX_CLIENT_ID_LEN,
        });
    }

    Ok(())
}

/// Validates the free-text client details binding.
pub fn validate_client_details(details: &str) -> ValidationResult<()> {
    let details = details.trim();

    if details.is_empty() {
        return Err(ValidationError::Required {
            field: "clientDetails".to_string(),
        });
    }

    if details.len() > MAX_CLIENT_DETAILS_LEN {
        return Err(ValidationError::TooLong {
            field: "clientDetails".to_string(),
            max: MAX_CLIENT_DETAILS_LEN,
        });
    }

    Ok(())
}

/// Validates a username.
///
/// ## Rules
/// - 3 to 40 characters
/// - Letters, digits, `_`, `.`, `-` only
pub fn validate_username(username: &str) -> ValidationResult<()> {
    let username = username.trim();

    if username.is_empty() {
        return Err(ValidationError::Required {
            field: "username".to_string(),
        });
    }

    if username.len() < 3 {
        return Err(ValidationError::TooShort {
            field: "username".to_string(),
            min: 3,
        });
    }

    if username.len() > 40 {
        return Err(ValidationError::TooLong {
            field: "username".to_string(),
            max: 40,
        });
    }

    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.' || c == '-')
    {
        return Err(ValidationError::InvalidFormat {
            field: "username".to_string(),
            reason: "must contain only letters, digits, underscores, dots, and hyphens"
                .to_string(),
        });
    }

    Ok(())
}

/// Validates a password at registration time.
///
/// Only length is enforced; composition rules are left to the operator.
pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.len() < 8 {
        return Err(ValidationError::TooShort {
            field: "password".to_string(),
            min: 8,
        });
    }

    if password.len() > 128 {
        return Err(ValidationError::TooLong {
            field: "password".to_string(),
            max: 128,
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a stock mutation quantity.
///
/// ## Rules
/// - Strictly positive
/// - At most [`MAX_MUTATION_QUANTITY`]
pub fn validate_quantity(quantity: i64) -> ValidationResult<()> {
    if quantity <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if quantity > MAX_MUTATION_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_MUTATION_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a box count on a rendition (zero is allowed).
pub fn validate_box_count(field: &str, count: i64) -> ValidationResult<()> {
    if count < 0 {
        return Err(ValidationError::MustBeNonNegative {
            field: field.to_string(),
        });
    }

    if count > MAX_MUTATION_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_MUTATION_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a monetary amount on a rendition (zero is allowed).
pub fn validate_amount(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::MustBeNonNegative {
            field: field.to_string(),
        });
    }

    if amount.cents() > MAX_AMOUNT_CENTS {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_AMOUNT_CENTS,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
