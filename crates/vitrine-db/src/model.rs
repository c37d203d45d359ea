//! # Model Traits
//!
//! What the generic [`Delegate`](crate::delegate::Delegate) needs to know
//! about an entity: its column enum, its unique keys and how a create input
//! turns into a row.
//!
//! ```text
//! ┌──────────────┐   Model::Column    ┌──────────────┐
//! │   Product    │ ─────────────────▶ │ ProductColumn│  names, kinds
//! │ (FromRow)    │   Model::Key       ├──────────────┤
//! │              │ ─────────────────▶ │ ProductKey   │  Id | Sku
//! │              │   Model::Create    ├──────────────┤
//! │              │ ─────────────────▶ │ NewProduct   │  into_row()
//! └──────────────┘                    └──────────────┘
//! ```

use sqlx::sqlite::SqliteRow;
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::DbResult;
use crate::query::{Changes, Column, ColumnExt, Filter, Value};

/// A persisted entity with a table of its own.
pub trait Model: for<'r> FromRow<'r, SqliteRow> + Send + Unpin + 'static {
    type Column: Column;

    /// Unique lookups accepted by `find_unique`, `update`, `delete`, `upsert`.
    type Key: UniqueKey<Column = Self::Column>;

    /// Create input.
    type Create: Insertable<Column = Self::Column> + Send;

    /// Entity name used in errors and logs.
    const ENTITY: &'static str;

    /// Column refreshed on every update, if the table has one.
    const UPDATED_AT: Option<Self::Column>;

    /// Normalises assigned values the way `Create::into_row` normalises a
    /// new row, so updates cannot store what inserts would not.
    fn prepare_changes(changes: Changes<Self::Column>) -> Changes<Self::Column> {
        changes
    }
}

/// A value identifying at most one row.
pub trait UniqueKey: Send + Sync {
    type Column: Column;

    /// Column/value pairs that together are unique.
    fn fields(&self) -> Vec<(Self::Column, Value)>;

    fn to_filter(&self) -> Filter<Self::Column> {
        Filter::all_of(self.fields().into_iter().map(|(c, v)| c.equals(v)))
    }

    /// `email=a@b.c` style rendering for `NotFound` errors.
    fn describe(&self) -> String {
        self.fields()
            .iter()
            .map(|(c, v)| format!("{}={}", c.name(), v))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// A create input that can be written as one row.
pub trait Insertable {
    type Column: Column;

    /// Validates, applies defaults and returns every column to insert.
    ///
    /// Every input of a given type yields the same columns in the same
    /// order, so batches can share one column list.
    fn into_row(self) -> DbResult<Vec<(Self::Column, Value)>>;
}

/// Uses the caller's id or generates a v4 UUID.
pub fn generate_id(id: Option<String>) -> String {
    id.filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::test_support::ItemColumn;

    struct ByName(&'static str);

    impl UniqueKey for ByName {
        type Column = ItemColumn;

        fn fields(&self) -> Vec<(ItemColumn, Value)> {
            vec![(ItemColumn::Name, Value::from(self.0)), (ItemColumn::Qty, Value::Int(1))]
        }
    }

    #[test]
    fn test_describe_key() {
        assert_eq!(ByName("thé").describe(), "name=thé, qty=1");
    }

    #[test]
    fn test_generate_id() {
        assert_eq!(generate_id(Some("abc".to_string())), "abc");
        let id = generate_id(None);
        assert!(Uuid::parse_str(&id).is_ok());
        assert_ne!(generate_id(Some("  ".to_string())), "  ");
    }
}
