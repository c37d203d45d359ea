//! # Schema
//!
//! One module per table group. Each declares the table's column enum, its
//! unique key enum, and wires the `vitrine-core` entity and create input to
//! the [`Model`](crate::model::Model) / [`Insertable`](crate::model::Insertable)
//! traits.
//!
//! ## Tables
//! ```text
//! ┌──────────┐ 1   * ┌───────┐ *   1 ┌─────────┐
//! │ Boutique │───────│ Stock │───────│ Product │
//! └──────────┘       └───────┘       └─────────┘
//!      │ 1                              │ 1  │ 1
//!      │ *                              │ *  │ *
//! ┌──────────┐ 1   * ┌──────────┐       │  ┌────────────────┐
//! │   Sale   │───────│ SaleItem │───────┘  │ StockEntryItem │
//! └──────────┘       └──────────┘          └────────────────┘
//!   │ 1  │ *                                     │ *
//!   │ *  │ 1                                     │ 1
//! ┌─────────┐  ┌──────┐ 1   * ┌────────────┐ *  1 ┌──────────┐
//! │ Payment │  │ User │───────│ StockEntry │──────│ Supplier │
//! └─────────┘  └──────┘       └────────────┘      └──────────┘
//!
//! AuditLog stands alone.
//! ```

pub mod audit_log;
pub mod boutique;
pub mod product;
pub mod relations;
pub mod sale;
pub mod stock;
pub mod stock_entry;
pub mod supplier;
pub mod user;

pub use audit_log::{AuditLogColumn, AuditLogKey};
pub use boutique::{BoutiqueColumn, BoutiqueKey};
pub use product::{ProductColumn, ProductKey};
pub use sale::{PaymentColumn, PaymentKey, SaleColumn, SaleItemColumn, SaleItemKey, SaleKey};
pub use stock::{StockColumn, StockKey};
pub use stock_entry::{StockEntryColumn, StockEntryItemColumn, StockEntryItemKey, StockEntryKey};
pub use supplier::{SupplierColumn, SupplierKey};
pub use user::{UserColumn, UserKey};

/// Declares a key enum whose only unique field is `id`.
macro_rules! id_key {
    ($(#[$meta:meta])* $name:ident => $column:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub enum $name {
            Id(String),
        }

        impl $crate::model::UniqueKey for $name {
            type Column = $column;

            fn fields(&self) -> Vec<($column, $crate::query::Value)> {
                match self {
                    $name::Id(id) => vec![($column::Id, id.into())],
                }
            }
        }
    };
}

pub(crate) use id_key;
