//! # Query Building Blocks
//!
//! Typed columns, filters, find arguments, change sets and aggregations that
//! the [`Delegate`](crate::delegate::Delegate) renders into SQLite SQL.
//!
//! ## How a call becomes SQL
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  db.products().find_many(                                              │
//! │      FindMany::new()                                                    │
//! │          .filter(ProductColumn::Price.gte(dec!(1000))                   │
//! │              .and(ProductColumn::Name.contains("thé")))                 │
//! │          .order_by(ProductColumn::Name, Direction::Asc)                 │
//! │          .take(20))                                                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SELECT * FROM "Product"                                               │
//! │  WHERE (CAST("Product"."price" AS REAL) >= CAST(? AS REAL)             │
//! │     AND "Product"."name" LIKE ? ESCAPE '\')                            │
//! │  ORDER BY "Product"."name" ASC                                         │
//! │  LIMIT ?                                                                │
//! │                                                                         │
//! │  Every value is a bound parameter; identifiers come only from the      │
//! │  column enums, never from user input.                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::fmt;
use std::hash::Hash;

pub mod aggregate;
pub mod args;
pub mod filter;
pub mod value;

pub use aggregate::{AggFn, Aggregate, AggregateResult, GroupBy, GroupRow, Having};
pub use args::{Changes, Direction, FindMany};
pub use filter::{BelongsTo, CmpOp, ColumnExt, Filter, HasMany};
pub use value::Value;

// =============================================================================
// Columns
// =============================================================================

/// How a column's values are stored and compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Integer,
    /// Exact decimal stored as TEXT; compared numerically.
    Decimal,
    Boolean,
    Timestamp,
    Json,
}

impl ColumnKind {
    /// Whether `increment`/`decrement`/... may target the column.
    pub fn supports_arithmetic(&self) -> bool {
        matches!(self, ColumnKind::Integer | ColumnKind::Decimal)
    }

    /// Whether `_sum`/`_avg` may target the column.
    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnKind::Integer | ColumnKind::Decimal)
    }
}

/// A column of one table.
///
/// Implemented by the per-entity column enums generated with `columns!`.
pub trait Column: Copy + Eq + Hash + fmt::Debug + Send + Sync + 'static {
    /// Table the column belongs to.
    const TABLE: &'static str;

    /// Column name as stored (camelCase).
    fn name(&self) -> &'static str;

    fn kind(&self) -> ColumnKind;

    /// Every column of the table, in declaration order.
    fn all() -> &'static [Self];

    /// `"Table"."column"`.
    fn qualified(&self) -> String {
        format!("\"{}\".\"{}\"", Self::TABLE, self.name())
    }

    /// `"column"`.
    fn quoted(&self) -> String {
        format!("\"{}\"", self.name())
    }
}

/// Declares a column enum and its [`Column`] impl.
///
/// ```text
/// columns! {
///     pub enum StockColumn for "Stock" {
///         Id => "id": Text,
///         Quantity => "quantity": Integer,
///     }
/// }
/// ```
macro_rules! columns {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident for $table:literal {
            $($variant:ident => $column:literal : $kind:ident),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $($variant),+
        }

        impl $crate::query::Column for $name {
            const TABLE: &'static str = $table;

            fn name(&self) -> &'static str {
                match self {
                    $($name::$variant => $column),+
                }
            }

            fn kind(&self) -> $crate::query::ColumnKind {
                match self {
                    $($name::$variant => $crate::query::ColumnKind::$kind),+
                }
            }

            fn all() -> &'static [Self] {
                &[$($name::$variant),+]
            }
        }
    };
}

pub(crate) use columns;
