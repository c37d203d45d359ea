//! # vitrine-core: Pure Domain Types for Vitrine POS
//!
//! Entity definitions, create inputs, exact money arithmetic and validation
//! rules for the retail data model. Nothing in this crate touches a database,
//! a socket or the file system.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Vitrine Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │               ★ vitrine-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │   input   │  │ validation│  │   │
//! │  │   │ User Sale │  │   Money   │  │  NewSale  │  │   rules   │  │   │
//! │  │   │ Stock ... │  │  TaxRate  │  │  Order... │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  vitrine-db (Data-Access Layer)                 │   │
//! │  │      SQLite schema, delegates, filters, aggregates, txns        │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Entities (User, Boutique, Product, Stock, Sale, ...)
//! - [`input`] - Create inputs and multi-entity workflow inputs
//! - [`money`] - Decimal `Money` and `TaxRate`
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//! - [`password`] - argon2 hashing for `User.passwordHash`
//!
//! ## Example Usage
//!
//! ```rust
//! use rust_decimal::Decimal;
//! use vitrine_core::money::{Money, TaxRate};
//!
//! let price = Money::new(Decimal::new(1099, 2)); // 10.99
//! let tax = price.calculate_tax(TaxRate::new(Decimal::new(18, 0)));
//! assert_eq!(tax.to_string(), "1.98");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod input;
pub mod money;
pub mod password;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use input::*;
pub use money::{Money, TaxRate};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Currency recorded on a sale when the caller does not name one.
pub const DEFAULT_CURRENCY: &str = "XOF";

/// Status of a freshly created user account.
pub const USER_STATUS_ACTIVE: &str = "active";

/// Status of an account that may no longer sign in.
pub const USER_STATUS_DISABLED: &str = "disabled";

/// Status of a recorded, paid sale.
pub const SALE_STATUS_COMPLETED: &str = "completed";

/// Status of a sale that was cancelled after recording.
pub const SALE_STATUS_VOIDED: &str = "voided";

/// Accepted values of `User.status`.
pub const USER_STATUSES: [&str; 2] = [USER_STATUS_ACTIVE, USER_STATUS_DISABLED];

/// Accepted values of `Sale.status`.
pub const SALE_STATUSES: [&str; 2] = [SALE_STATUS_COMPLETED, SALE_STATUS_VOIDED];

/// Maximum quantity of a single sale or receipt line.
///
/// ## Business Reason
/// Catches typing 10000 instead of 10 at the register.
pub const MAX_LINE_QUANTITY: i64 = 9_999;

/// Maximum number of lines on one sale or stock receipt.
pub const MAX_LINES: usize = 200;

/// Largest accepted price, cost, discount or payment, in whole units.
///
/// Keeps line totals and sale totals (at most [`MAX_LINES`] lines of
/// [`MAX_LINE_QUANTITY`]) far inside `Decimal`'s range.
pub const MAX_MONEY_UNITS: i64 = 1_000_000_000_000_000;
