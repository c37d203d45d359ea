//! # Error Types
//!
//! Domain-specific error types for vitrine-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  vitrine-core errors (this file)                                       │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  vitrine-db errors (separate crate)                                    │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → caller                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::money::Money;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations raised while assembling a workflow.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Not enough stock at the boutique to complete a sale.
    ///
    /// ## When This Occurs
    /// - No Stock row exists for (boutique, product)
    /// - The Stock row holds fewer units than the sale line requests
    #[error(
        "Insufficient stock for product {product_id} at boutique {boutique_id}: available {available}, requested {requested}"
    )]
    InsufficientStock {
        boutique_id: String,
        product_id: String,
        available: i64,
        requested: i64,
    },

    /// A sale must carry at least one line.
    #[error("Sale has no items")]
    EmptySale,

    /// A stock receipt must carry at least one line.
    #[error("Stock receipt has no items")]
    EmptyReceipt,

    /// Split payments do not add up to the sale total.
    #[error("Payments total {paid} but sale total is {total}")]
    PaymentMismatch { total: Money, paid: Money },

    /// A line discount exceeds the line amount.
    #[error("Discount {discount} exceeds line amount {line_amount} for product {product_id}")]
    DiscountTooLarge {
        product_id: String,
        discount: Money,
        line_amount: Money,
    },

    /// Sale is not in a state that allows the requested operation.
    #[error("Sale {sale_id} is {status}, cannot perform operation")]
    InvalidSaleStatus { sale_id: String, status: String },

    /// Email/password pair did not match an active account.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// The account exists but is not allowed to sign in.
    #[error("User {email} is {status}")]
    UserInactive { email: String, status: String },

    /// The password hasher rejected its input.
    #[error("Password hashing failed: {0}")]
    PasswordHash(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These fire before any SQL runs, so the database only ever sees inputs
/// that already satisfy the field rules.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g., invalid UUID, invalid email).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
