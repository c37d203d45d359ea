//! `StockEntry` and `StockEntryItem` tables: goods received.

use chrono::Utc;

use vitrine_core::{NewStockEntry, NewStockEntryItem, StockEntry, StockEntryItem};

use crate::error::DbResult;
use crate::model::{generate_id, Insertable, Model};
use crate::query::{columns, Value};
use crate::schema::id_key;

// =============================================================================
// StockEntry
// =============================================================================

columns! {
    pub enum StockEntryColumn for "StockEntry" {
        Id => "id": Text,
        SupplierId => "supplierId": Text,
        Reference => "reference": Text,
        CreatedByUserId => "createdByUserId": Text,
        CreatedAt => "createdAt": Timestamp,
    }
}

id_key!(StockEntryKey => StockEntryColumn);

impl Model for StockEntry {
    type Column = StockEntryColumn;
    type Key = StockEntryKey;
    type Create = NewStockEntry;

    const ENTITY: &'static str = "StockEntry";
    const UPDATED_AT: Option<StockEntryColumn> = None;
}

impl Insertable for NewStockEntry {
    type Column = StockEntryColumn;

    fn into_row(self) -> DbResult<Vec<(StockEntryColumn, Value)>> {
        self.validate()?;

        Ok(vec![
            (StockEntryColumn::Id, generate_id(self.id).into()),
            (StockEntryColumn::SupplierId, self.supplier_id.into()),
            (StockEntryColumn::Reference, self.reference.into()),
            (StockEntryColumn::CreatedByUserId, self.created_by_user_id.into()),
            (
                StockEntryColumn::CreatedAt,
                self.created_at.unwrap_or_else(Utc::now).into(),
            ),
        ])
    }
}

// =============================================================================
// StockEntryItem
// =============================================================================

columns! {
    pub enum StockEntryItemColumn for "StockEntryItem" {
        Id => "id": Text,
        StockEntryId => "stockEntryId": Text,
        ProductId => "productId": Text,
        Quantity => "quantity": Integer,
        UnitCost => "unitCost": Decimal,
    }
}

id_key!(StockEntryItemKey => StockEntryItemColumn);

impl Model for StockEntryItem {
    type Column = StockEntryItemColumn;
    type Key = StockEntryItemKey;
    type Create = NewStockEntryItem;

    const ENTITY: &'static str = "StockEntryItem";
    const UPDATED_AT: Option<StockEntryItemColumn> = None;
}

impl Insertable for NewStockEntryItem {
    type Column = StockEntryItemColumn;

    fn into_row(self) -> DbResult<Vec<(StockEntryItemColumn, Value)>> {
        self.validate()?;

        Ok(vec![
            (StockEntryItemColumn::Id, generate_id(self.id).into()),
            (StockEntryItemColumn::StockEntryId, self.stock_entry_id.into()),
            (StockEntryItemColumn::ProductId, self.product_id.into()),
            (StockEntryItemColumn::Quantity, self.quantity.into()),
            (StockEntryItemColumn::UnitCost, self.unit_cost.into()),
        ])
    }
}
