//! # Create Inputs
//!
//! The data needed to insert a row, one struct per entity, plus the two
//! multi-entity workflow inputs (`NewSaleOrder`, `NewStockReceipt`).
//!
//! ## Defaults
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Field left as None           Value written                             │
//! │  ───────────────────────────  ───────────────────────────────────────   │
//! │  id                           fresh UUID v4                             │
//! │  User.role / User.status      employee / active                         │
//! │  Product.taxRate / isActive   0 / true                                  │
//! │  Stock.quantity               0                                         │
//! │  Sale.currency / status       XOF / completed                           │
//! │  SaleItem.discount            0                                         │
//! │  AuditLog.metadata            {}                                        │
//! │  createdAt / updatedAt        now (UTC)                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every input has a `validate()` that runs before SQL is issued.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::{Money, TaxRate};
use crate::types::Role;
use crate::validation::{
    validate_boutique_code, validate_currency, validate_email, validate_line_count,
    validate_money_non_negative, validate_name, validate_one_of, validate_password,
    validate_payment_amount, validate_quantity, validate_required, validate_sku,
    validate_stock_quantity, validate_tax_rate, ValidationResult,
};
use crate::{SALE_STATUSES, USER_STATUSES};

// =============================================================================
// Entity Create Inputs
// =============================================================================

/// Insert a `User` row. The password must already be hashed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewUser {
    pub id: Option<String>,
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub role: Option<Role>,
    pub status: Option<String>,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl NewUser {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_email(&self.email)?;
        validate_required("passwordHash", &self.password_hash)?;
        validate_name("fullName", &self.full_name, 120)?;
        if let Some(status) = &self.status {
            validate_one_of("status", status, &USER_STATUSES)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewBoutique {
    pub id: Option<String>,
    pub name: String,
    pub code: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
}

impl NewBoutique {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_name("name", &self.name, 120)?;
        validate_boutique_code(&self.code)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewProduct {
    pub id: Option<String>,
    pub sku: String,
    pub name: String,
    pub category: Option<String>,
    pub price: Money,
    pub cost: Option<Money>,
    pub barcode: Option<String>,
    pub tax_rate: Option<TaxRate>,
    pub is_active: Option<bool>,
}

impl NewProduct {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_sku(&self.sku)?;
        validate_name("name", &self.name, 200)?;
        validate_money_non_negative("price", self.price)?;
        if let Some(cost) = self.cost {
            validate_money_non_negative("cost", cost)?;
        }
        if let Some(rate) = self.tax_rate {
            validate_tax_rate(rate)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewStock {
    pub id: Option<String>,
    pub boutique_id: String,
    pub product_id: String,
    pub quantity: Option<i64>,
}

impl NewStock {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_required("boutiqueId", &self.boutique_id)?;
        validate_required("productId", &self.product_id)?;
        validate_stock_quantity(self.quantity.unwrap_or(0))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewSupplier {
    pub id: Option<String>,
    pub name: String,
    pub contact_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

impl NewSupplier {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_name("name", &self.name, 120)?;
        if let Some(email) = &self.email {
            validate_email(email)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewStockEntry {
    pub id: Option<String>,
    pub supplier_id: Option<String>,
    pub reference: Option<String>,
    pub created_by_user_id: String,
    pub created_at: Option<DateTime<Utc>>,
}

impl NewStockEntry {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_required("createdByUserId", &self.created_by_user_id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewStockEntryItem {
    pub id: Option<String>,
    pub stock_entry_id: String,
    pub product_id: String,
    pub quantity: i64,
    pub unit_cost: Money,
}

impl NewStockEntryItem {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_required("stockEntryId", &self.stock_entry_id)?;
        validate_required("productId", &self.product_id)?;
        validate_quantity(self.quantity)?;
        validate_money_non_negative("unitCost", self.unit_cost)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewSale {
    pub id: Option<String>,
    pub boutique_id: String,
    pub cashier_user_id: String,
    pub total: Money,
    pub payment_method: String,
    pub currency: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub offline_id: Option<String>,
    pub status: Option<String>,
}

impl NewSale {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_required("boutiqueId", &self.boutique_id)?;
        validate_required("cashierUserId", &self.cashier_user_id)?;
        validate_required("paymentMethod", &self.payment_method)?;
        validate_money_non_negative("total", self.total)?;
        if let Some(currency) = &self.currency {
            validate_currency(currency)?;
        }
        if let Some(offline_id) = &self.offline_id {
            validate_required("offlineId", offline_id)?;
        }
        if let Some(status) = &self.status {
            validate_one_of("status", status, &SALE_STATUSES)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewSaleItem {
    pub id: Option<String>,
    pub sale_id: String,
    pub product_id: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub discount: Option<Money>,
}

impl NewSaleItem {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_required("saleId", &self.sale_id)?;
        validate_required("productId", &self.product_id)?;
        validate_quantity(self.quantity)?;
        validate_money_non_negative("unitPrice", self.unit_price)?;
        if let Some(discount) = self.discount {
            validate_money_non_negative("discount", discount)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewPayment {
    pub id: Option<String>,
    pub sale_id: String,
    pub method: String,
    pub amount: Money,
    pub reference: Option<String>,
}

impl NewPayment {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_required("saleId", &self.sale_id)?;
        validate_required("method", &self.method)?;
        validate_payment_amount(self.amount)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewAuditLog {
    pub id: Option<String>,
    pub actor_id: Option<String>,
    pub role: Option<String>,
    pub action: String,
    pub resource: String,
    pub resource_id: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub ip: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl NewAuditLog {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_name("action", &self.action, 100)?;
        validate_name("resource", &self.resource, 100)
    }
}

// =============================================================================
// Workflow Inputs
// =============================================================================

/// A sale as rung up at the register: header, lines and tenders.
///
/// ## Flow
/// ```text
/// NewSaleOrder ──validate()──▶ total() ──▶ Sale + SaleItem[] + Payment[]
///                                          └─▶ Stock decremented per line
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewSaleOrder {
    pub boutique_id: String,
    pub cashier_user_id: String,

    /// Recorded on the sale; also the method of the implicit single payment
    /// when `payments` is empty.
    pub payment_method: String,

    pub currency: Option<String>,

    /// Client-generated id; replaying the same id returns the first sale.
    pub offline_id: Option<String>,

    pub items: Vec<NewSaleLine>,
    pub payments: Vec<NewPaymentLine>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewSaleLine {
    pub product_id: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub discount: Money,
}

impl NewSaleLine {
    /// unit_price × quantity − discount.
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity) - self.discount
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewPaymentLine {
    pub method: String,
    pub amount: Money,
    pub reference: Option<String>,
}

impl NewSaleOrder {
    /// Σ line totals.
    pub fn total(&self) -> Money {
        self.items.iter().map(NewSaleLine::line_total).sum()
    }

    /// Σ payment amounts.
    pub fn paid(&self) -> Money {
        self.payments.iter().map(|p| p.amount).sum()
    }

    /// Checks header, lines and tenders.
    ///
    /// Payments are optional; when given they must add up to [`total`](Self::total).
    pub fn validate(&self) -> CoreResult<()> {
        validate_required("boutiqueId", &self.boutique_id)?;
        validate_required("cashierUserId", &self.cashier_user_id)?;
        validate_required("paymentMethod", &self.payment_method)?;
        if let Some(currency) = &self.currency {
            validate_currency(currency)?;
        }
        if let Some(offline_id) = &self.offline_id {
            validate_required("offlineId", offline_id)?;
        }

        if self.items.is_empty() {
            return Err(CoreError::EmptySale);
        }
        validate_line_count("items", self.items.len())?;

        for line in &self.items {
            validate_required("productId", &line.product_id)?;
            validate_quantity(line.quantity)?;
            validate_money_non_negative("unitPrice", line.unit_price)?;
            validate_money_non_negative("discount", line.discount)?;

            let line_amount = line.unit_price.multiply_quantity(line.quantity);
            if line.discount > line_amount {
                return Err(CoreError::DiscountTooLarge {
                    product_id: line.product_id.clone(),
                    discount: line.discount,
                    line_amount,
                });
            }
        }

        if !self.payments.is_empty() {
            validate_line_count("payments", self.payments.len())?;
            for payment in &self.payments {
                validate_required("method", &payment.method)?;
                validate_payment_amount(payment.amount)?;
            }

            let total = self.total();
            let paid = self.paid();
            if paid != total {
                return Err(CoreError::PaymentMismatch { total, paid });
            }
        }

        Ok(())
    }
}

/// A delivery received at a boutique.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewStockReceipt {
    /// Boutique whose Stock rows are incremented.
    pub boutique_id: String,
    pub supplier_id: Option<String>,
    pub reference: Option<String>,
    pub created_by_user_id: String,
    pub items: Vec<NewReceiptLine>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewReceiptLine {
    pub product_id: String,
    pub quantity: i64,
    pub unit_cost: Money,
}

impl NewStockReceipt {
    /// Σ unit_cost × quantity.
    pub fn total_cost(&self) -> Money {
        self.items
            .iter()
            .map(|line| line.unit_cost.multiply_quantity(line.quantity))
            .sum()
    }

    pub fn validate(&self) -> CoreResult<()> {
        validate_required("boutiqueId", &self.boutique_id)?;
        validate_required("createdByUserId", &self.created_by_user_id)?;

        if self.items.is_empty() {
            return Err(CoreError::EmptyReceipt);
        }
        validate_line_count("items", self.items.len())?;

        for line in &self.items {
            validate_required("productId", &line.product_id)?;
            validate_quantity(line.quantity)?;
            validate_money_non_negative("unitCost", line.unit_cost)?;
        }

        Ok(())
    }
}

/// Sign-up data with a plaintext password, hashed before insert.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewUserAccount {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub role: Option<Role>,
}

impl NewUserAccount {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_email(&self.email)?;
        validate_password(&self.password)?;
        validate_name("fullName", &self.full_name, 120)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
