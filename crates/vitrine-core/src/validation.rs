//! # Validation Module
//!
//! Field rules checked before any row reaches SQLite.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Create inputs (NewUser, NewSaleOrder, ...)                   │
//! │  ├── validate() calls the functions in THIS MODULE                     │
//! │  └── Fails fast with ValidationError, no SQL issued                    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Workflow repositories (vitrine-db)                           │
//! │  ├── Stock availability, payment totals                                │
//! │  └── CoreError for business rule violations                            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  ├── UNIQUE constraints (email, sku, code, offlineId, stock pair)      │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use vitrine_core::validation::{validate_sku, validate_quantity};
//!
//! validate_sku("BISSAP-1L").unwrap();
//! validate_quantity(5).unwrap();
//! ```

use rust_decimal::Decimal;

use crate::error::ValidationError;
use crate::money::{Money, TaxRate};
use crate::{MAX_LINES, MAX_LINE_QUANTITY, MAX_MONEY_UNITS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Minimum length of a plaintext password.
pub const MIN_PASSWORD_LEN: usize = 8;

// =============================================================================
// String Validators
// =============================================================================

/// Rejects empty or whitespace-only values.
pub fn validate_required(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates a free-text name (product, boutique, supplier, person).
///
/// ## Rules
/// - Must not be empty
/// - At most `max` characters
pub fn validate_name(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    validate_required(field, value)?;

    if value.trim().chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

/// Validates an email address.
///
/// ## Rules
/// - Exactly one `@` with a non-empty local part
/// - Domain contains a dot and no whitespace
/// - At most 254 characters
///
/// ## Example
/// ```rust
/// use vitrine_core::validation::validate_email;
///
/// assert!(validate_email("awa@boutique.sn").is_ok());
/// assert!(validate_email("awa@localhost").is_err());
/// assert!(validate_email("not an email").is_err());
/// ```
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let email = email.trim();
    validate_required("email", email)?;

    if email.len() > 254 {
        return Err(ValidationError::TooLong {
            field: "email".to_string(),
            max: 254,
        });
    }

    let invalid = |reason: &str| ValidationError::InvalidFormat {
        field: "email".to_string(),
        reason: reason.to_string(),
    };

    if email.chars().any(char::is_whitespace) {
        return Err(invalid("must not contain spaces"));
    }

    let (local, domain) = email.split_once('@').ok_or_else(|| invalid("missing @"))?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid("must contain exactly one @ after a name"));
    }
    if !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
        return Err(invalid("domain must contain a dot"));
    }

    Ok(())
}

/// Canonical stored form of an email: trimmed and lowercased.
///
/// Uniqueness of `User.email` is checked on this form.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validates a value against a closed set of strings (`status` columns).
pub fn validate_one_of(field: &str, value: &str, allowed: &[&str]) -> ValidationResult<()> {
    if !allowed.contains(&value) {
        return Err(ValidationError::NotAllowed {
            field: field.to_string(),
            allowed: allowed.iter().map(|s| s.to_string()).collect(),
        });
    }
    Ok(())
}

/// Validates a SKU (Stock Keeping Unit).
///
/// ## Rules
/// - Must not be empty
/// - Must be between 1 and 50 characters
/// - Only alphanumeric characters, hyphens, underscores
///
/// ## Example
/// ```rust
/// use vitrine_core::validation::validate_sku;
///
/// assert!(validate_sku("BISSAP-1L").is_ok());
/// assert!(validate_sku("").is_err());
/// assert!(validate_sku("A".repeat(100).as_str()).is_err());
/// ```
pub fn validate_sku(sku: &str) -> ValidationResult<()> {
    validate_code("sku", sku, 50)
}

/// Validates a boutique code such as `DKR-01`.
///
/// Same character rules as a SKU, at most 20 characters.
pub fn validate_boutique_code(code: &str) -> ValidationResult<()> {
    validate_code("code", code, 20)
}

fn validate_code(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();
    validate_required(field, value)?;

    if value.len() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    if !value
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates an ISO 4217 currency code (`XOF`, `EUR`).
pub fn validate_currency(code: &str) -> ValidationResult<()> {
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_uppercase()) {
        return Err(ValidationError::InvalidFormat {
            field: "currency".to_string(),
            reason: "must be three uppercase letters".to_string(),
        });
    }
    Ok(())
}

/// Validates a plaintext password before hashing.
pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::TooShort {
            field: "password".to_string(),
            min: MIN_PASSWORD_LEN,
        });
    }
    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates the quantity of a sale or receipt line.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_LINE_QUANTITY (9 999)
///
/// ## User Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Register: Add Line                                                     │
/// │                                                                         │
/// │  Cashier enters quantity: 5                                            │
/// │       │                                                                 │
/// │       ▼                                                                 │
/// │  validate_quantity(5) ← THIS FUNCTION                                  │
/// │       │                                                                 │
/// │       ├── qty <= 0? → Error: "quantity must be positive"               │
/// │       │                                                                 │
/// │       ├── qty > 9999? → Error: "quantity must be between 1 and 9999"   │
/// │       │                                                                 │
/// │       └── OK → line accepted                                           │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
    }

    Ok(())
}

/// Validates an on-hand stock level. Zero is allowed.
pub fn validate_stock_quantity(qty: i64) -> ValidationResult<()> {
    if qty < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: "quantity".to_string(),
        });
    }
    Ok(())
}

/// Validates a price, cost or discount.
///
/// ## Example
/// ```rust
/// use rust_decimal::Decimal;
/// use vitrine_core::money::Money;
/// use vitrine_core::validation::validate_money_non_negative;
///
/// assert!(validate_money_non_negative("price", Money::new(Decimal::new(1099, 2))).is_ok());
/// assert!(validate_money_non_negative("price", Money::zero()).is_ok());
/// assert!(validate_money_non_negative("price", Money::new(Decimal::new(-1, 0))).is_err());
/// ```
pub fn validate_money_non_negative(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }
    validate_money_magnitude(field, amount)
}

/// Rejects amounts above [`MAX_MONEY_UNITS`].
fn validate_money_magnitude(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.amount().abs() > Decimal::from(MAX_MONEY_UNITS) {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_MONEY_UNITS,
        });
    }
    Ok(())
}

/// Validates a payment amount.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed `MAX_MONEY_UNITS`
pub fn validate_payment_amount(amount: Money) -> ValidationResult<()> {
    if !amount.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "payment amount".to_string(),
        });
    }
    validate_money_magnitude("payment amount", amount)
}

/// Validates a tax rate percentage.
///
/// ## Rules
/// - Must be between 0 and 100
pub fn validate_tax_rate(rate: TaxRate) -> ValidationResult<()> {
    if rate.percent() < Decimal::ZERO || rate.percent() > Decimal::ONE_HUNDRED {
        return Err(ValidationError::OutOfRange {
            field: "taxRate".to_string(),
            min: 0,
            max: 100,
        });
    }
    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates the number of lines on a sale or stock receipt.
pub fn validate_line_count(field: &str, lines: usize) -> ValidationResult<()> {
    if lines > MAX_LINES {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 1,
            max: MAX_LINES as i64,
        });
    }
    Ok(())
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a UUID string format.
///
/// ## Example
/// ```rust
/// use vitrine_core::validation::validate_uuid;
///
/// assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("not-a-uuid").is_err());
/// ```
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    validate_required("id", id)?;

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_validate_sku() {
        assert!(validate_sku("BISSAP-1L").is_ok());
        assert!(validate_sku("ABC123").is_ok());
        assert!(validate_sku("product_1").is_ok());

        assert!(validate_sku("").is_err());
        assert!(validate_sku("   ").is_err());
        assert!(validate_sku("has space").is_err());
        assert!(validate_sku(&"A".repeat(100)).is_err());
    }

    #[test]
    fn test_validate_boutique_code() {
        assert!(validate_boutique_code("DKR-01").is_ok());
        assert!(validate_boutique_code(&"B".repeat(21)).is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("awa@boutique.sn").is_ok());
        assert!(validate_email(" moussa.diop@example.com ").is_ok());

        assert!(validate_email("").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("a@b@c.com").is_err());
        assert!(validate_email("awa@localhost").is_err());
        assert!(validate_email("a wa@example.com").is_err());
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Awa@Boutique.SN "), "awa@boutique.sn");
    }

    #[test]
    fn test_validate_one_of() {
        assert!(validate_one_of("status", "active", &["active", "disabled"]).is_ok());
        assert!(validate_one_of("status", "banned", &["active", "disabled"]).is_err());
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("name", "Bissap 1L", 200).is_ok());
        assert!(validate_name("name", "", 200).is_err());
        assert!(validate_name("name", &"A".repeat(300), 200).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(MAX_LINE_QUANTITY).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(MAX_LINE_QUANTITY + 1).is_err());
    }

    #[test]
    fn test_validate_stock_quantity() {
        assert!(validate_stock_quantity(0).is_ok());
        assert!(validate_stock_quantity(-1).is_err());
    }

    #[test]
    fn test_validate_money() {
        assert!(validate_money_non_negative("cost", Money::new(dec!(0))).is_ok());
        assert!(validate_money_non_negative("cost", Money::new(dec!(-0.01))).is_err());
        assert!(validate_payment_amount(Money::new(dec!(0.01))).is_ok());
        assert!(validate_payment_amount(Money::zero()).is_err());
    }

    #[test]
    fn test_validate_money_upper_bound() {
        let max = Money::new(Decimal::from(MAX_MONEY_UNITS));
        assert!(validate_money_non_negative("unitPrice", max).is_ok());
        assert!(validate_payment_amount(max).is_ok());

        let over = Money::new(Decimal::MAX);
        assert!(matches!(
            validate_money_non_negative("unitPrice", over),
            Err(ValidationError::OutOfRange { .. })
        ));
        assert!(validate_payment_amount(over).is_err());
    }

    #[test]
    fn test_validate_tax_rate() {
        assert!(validate_tax_rate(TaxRate::new(dec!(0))).is_ok());
        assert!(validate_tax_rate(TaxRate::new(dec!(18))).is_ok());
        assert!(validate_tax_rate(TaxRate::new(dec!(100))).is_ok());
        assert!(validate_tax_rate(TaxRate::new(dec!(100.01))).is_err());
        assert!(validate_tax_rate(TaxRate::new(dec!(-1))).is_err());
    }

    #[test]
    fn test_validate_currency() {
        assert!(validate_currency("XOF").is_ok());
        assert!(validate_currency("xof").is_err());
        assert!(validate_currency("EURO").is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("correct horse").is_ok());
        assert!(validate_password("short").is_err());
    }

    #[test]
    fn test_validate_line_count() {
        assert!(validate_line_count("items", MAX_LINES).is_ok());
        assert!(validate_line_count("items", MAX_LINES + 1).is_err());
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_uuid("").is_err());
        assert!(validate_uuid("not-a-uuid").is_err());
    }
}
