//! # Domain Types
//!
//! The eleven entities of the Vitrine retail schema.
//!
//! ## Entity Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌──────────┐ cashier  ┌──────────┐  items   ┌──────────┐              │
//! │  │   User   │─────────▶│   Sale   │─────────▶│ SaleItem │──┐           │
//! │  │  email ★ │          │offlineId★│─────┐    └──────────┘  │           │
//! │  └────┬─────┘          └────▲─────┘     │    ┌──────────┐  │           │
//! │       │ creator             │           └───▶│ Payment  │  │           │
//! │       ▼                     │                └──────────┘  │           │
//! │  ┌──────────┐          ┌────┴─────┐     ┌──────────┐       │           │
//! │  │StockEntry│          │ Boutique │────▶│  Stock   │◀──┐   │           │
//! │  └──┬────▲──┘          │  code ★  │     │(b,p) ★   │   │   │           │
//! │     │    │             └──────────┘     └──────────┘   │   │           │
//! │     │  ┌─┴────────┐                              ┌─────┴───▼┐          │
//! │     │  │ Supplier │                              │ Product  │          │
//! │     │  └──────────┘                              │  sku ★   │          │
//! │     ▼                                            └────▲─────┘          │
//! │  ┌──────────────┐                                     │                │
//! │  │StockEntryItem│─────────────────────────────────────┘                │
//! │  └──────────────┘                                                       │
//! │                                                                         │
//! │  ┌──────────┐  standalone, append-only, no relations                   │
//! │  │ AuditLog │                                                           │
//! │  └──────────┘                     ★ = unique                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Naming
//! Rust fields are snake_case. Tables carry the model name (`"StockEntry"`)
//! and columns the camelCase field name (`"boutiqueId"`); serde output uses
//! the same camelCase so JSON, SQL and the generated TypeScript agree.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::{Money, TaxRate};

// =============================================================================
// Role
// =============================================================================

/// Access role of a user account.
///
/// ## Hierarchy
/// ```text
/// super_admin  →  pdg  →  dg  →  employee
/// (platform)     (CEO)   (store   (cashier,
///                         manager) stock clerk)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SuperAdmin,
    Pdg,
    Dg,
    Employee,
}

impl Role {
    /// Every role, highest privilege first.
    pub const ALL: [Role; 4] = [Role::SuperAdmin, Role::Pdg, Role::Dg, Role::Employee];

    /// The stored string value.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "super_admin",
            Role::Pdg => "pdg",
            Role::Dg => "dg",
            Role::Employee => "employee",
        }
    }

    /// Whether this role may manage boutiques, products and other users.
    pub fn is_manager(&self) -> bool {
        !matches!(self, Role::Employee)
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::Employee
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "role".to_string(),
                allowed: Role::ALL.iter().map(|r| r.as_str().to_string()).collect(),
            })
    }
}

// =============================================================================
// User
// =============================================================================

/// A staff account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "camelCase"))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct User {
    pub id: String,

    /// Login identifier, unique across the platform.
    pub email: String,

    /// argon2 PHC string. Never serialized.
    #[serde(skip_serializing, default)]
    #[ts(skip)]
    pub password_hash: String,

    pub full_name: String,
    pub role: Role,

    /// `active` or `disabled`.
    pub status: String,

    #[ts(as = "Option<String>")]
    pub last_login_at: Option<DateTime<Utc>>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Whether the account may sign in.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.status == crate::USER_STATUS_ACTIVE
    }
}

// =============================================================================
// Boutique
// =============================================================================

/// A retail location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "camelCase"))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Boutique {
    pub id: String,
    pub name: String,

    /// Short business code printed on receipts (`DKR-01`), unique.
    pub code: String,

    pub address: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Product
// =============================================================================

/// A product available for sale at any boutique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "camelCase"))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Stock Keeping Unit - business identifier, unique.
    pub sku: String,

    /// Display name shown to cashier and on receipt.
    pub name: String,

    pub category: Option<String>,

    /// Selling price.
    #[ts(as = "String")]
    pub price: Money,

    /// Purchase cost (for margin reports).
    #[ts(as = "Option<String>")]
    pub cost: Option<Money>,

    /// Barcode (EAN-13, UPC-A, etc.).
    pub barcode: Option<String>,

    /// Tax rate as a percentage (`18` = 18%).
    #[ts(as = "String")]
    pub tax_rate: TaxRate,

    /// Whether product is offered for sale.
    pub is_active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Tax due on one unit at the product's rate.
    #[inline]
    pub fn unit_tax(&self) -> Money {
        self.price.calculate_tax(self.tax_rate)
    }

    /// Margin per unit, when the cost is known.
    pub fn unit_margin(&self) -> Option<Money> {
        self.cost.map(|cost| self.price - cost)
    }
}

// =============================================================================
// Stock
// =============================================================================

/// On-hand quantity of a product at a boutique.
///
/// One row per (boutique, product) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "camelCase"))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Stock {
    pub id: String,
    pub boutique_id: String,
    pub product_id: String,
    pub quantity: i64,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Supplier
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "camelCase"))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Supplier {
    pub id: String,
    pub name: String,
    pub contact_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Stock Entry
// =============================================================================

/// One inbound stock receipt, optionally from a supplier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "camelCase"))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct StockEntry {
    pub id: String,

    /// Nulled when the supplier is deleted.
    pub supplier_id: Option<String>,

    /// Delivery note or invoice number.
    pub reference: Option<String>,

    pub created_by_user_id: String,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// A line of a [`StockEntry`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "camelCase"))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct StockEntryItem {
    pub id: String,
    pub stock_entry_id: String,
    pub product_id: String,
    pub quantity: i64,

    #[ts(as = "String")]
    pub unit_cost: Money,
}

impl StockEntryItem {
    /// unit_cost × quantity.
    #[inline]
    pub fn line_cost(&self) -> Money {
        self.unit_cost.multiply_quantity(self.quantity)
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A point-of-sale transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "camelCase"))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Sale {
    pub id: String,
    pub boutique_id: String,
    pub cashier_user_id: String,

    /// Σ(unit_price × quantity − discount) over the items.
    #[ts(as = "String")]
    pub total: Money,

    /// Primary tender (`cash`, `card`, `mobile_money`, `mixed`, ...).
    pub payment_method: String,

    /// ISO 4217 code.
    pub currency: String,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    /// Client-generated id of a sale rung up while offline. Unique when set.
    pub offline_id: Option<String>,

    /// `completed` or `voided`.
    pub status: String,
}

impl Sale {
    #[inline]
    pub fn is_voided(&self) -> bool {
        self.status == crate::SALE_STATUS_VOIDED
    }
}

/// A line item of a sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "camelCase"))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,
    pub product_id: String,
    pub quantity: i64,

    /// Unit price at time of sale (frozen).
    #[ts(as = "String")]
    pub unit_price: Money,

    /// Absolute discount on the whole line.
    #[ts(as = "String")]
    pub discount: Money,
}

impl SaleItem {
    /// unit_price × quantity − discount.
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity) - self.discount
    }
}

// =============================================================================
// Payment
// =============================================================================

/// A payment towards a sale.
/// A sale can have multiple payments for split tender scenarios.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "camelCase"))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Payment {
    pub id: String,
    pub sale_id: String,
    pub method: String,

    #[ts(as = "String")]
    pub amount: Money,

    /// External reference (card auth code, mobile money transaction id).
    pub reference: Option<String>,
}

// =============================================================================
// Audit Log
// =============================================================================

/// Append-only record of who did what.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "camelCase"))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct AuditLog {
    pub id: String,
    pub actor_id: Option<String>,

    /// Role of the actor at the time of the action.
    pub role: Option<String>,

    /// Verb, e.g. `sale.create`, `user.login`.
    pub action: String,

    /// Entity name, e.g. `Sale`.
    pub resource: String,

    pub resource_id: Option<String>,

    /// Free-form JSON payload.
    #[cfg_attr(feature = "sqlx", sqlx(json))]
    #[ts(type = "any")]
    pub metadata: serde_json::Value,

    pub ip: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn product(price: Money, cost: Option<Money>) -> Product {
        Product {
            id: "p-1".to_string(),
            sku: "SKU-1".to_string(),
            name: "Bissap 1L".to_string(),
            category: None,
            price,
            cost,
            barcode: None,
            tax_rate: TaxRate::new(dec!(18)),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_role_strings() {
        assert_eq!(Role::SuperAdmin.as_str(), "super_admin");
        assert_eq!("pdg".parse::<Role>().unwrap(), Role::Pdg);
        assert!("admin".parse::<Role>().is_err());
        assert_eq!(Role::default(), Role::Employee);
    }

    #[test]
    fn test_role_serde_matches_storage() {
        let json = serde_json::to_string(&Role::SuperAdmin).unwrap();
        assert_eq!(json, "\"super_admin\"");
    }

    #[test]
    fn test_role_is_manager() {
        assert!(Role::Dg.is_manager());
        assert!(!Role::Employee.is_manager());
    }

    #[test]
    fn test_product_margin_and_tax() {
        let p = product(Money::new(dec!(1000)), Some(Money::new(dec!(650))));
        assert_eq!(p.unit_margin().unwrap().amount(), dec!(350));
        assert_eq!(p.unit_tax().amount(), dec!(180));

        let p = product(Money::new(dec!(1000)), None);
        assert!(p.unit_margin().is_none());
    }

    #[test]
    fn test_sale_item_line_total() {
        let item = SaleItem {
            id: "i-1".to_string(),
            sale_id: "s-1".to_string(),
            product_id: "p-1".to_string(),
            quantity: 3,
            unit_price: Money::new(dec!(2.50)),
            discount: Money::new(dec!(0.50)),
        };
        assert_eq!(item.line_total().amount(), dec!(7.00));
    }

    #[test]
    fn test_user_password_hash_not_serialized() {
        let user = User {
            id: "u-1".to_string(),
            email: "awa@example.com".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            full_name: "Awa Ndiaye".to_string(),
            role: Role::Dg,
            status: "active".to_string(),
            last_login_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert_eq!(json["fullName"], "Awa Ndiaye");
        assert!(user.is_active());
    }
}
