//! `Stock` table: quantity of one product at one boutique.

use chrono::Utc;

use vitrine_core::{NewStock, Stock};

use crate::error::DbResult;
use crate::model::{generate_id, Insertable, Model, UniqueKey};
use crate::query::{columns, Value};

columns! {
    pub enum StockColumn for "Stock" {
        Id => "id": Text,
        BoutiqueId => "boutiqueId": Text,
        ProductId => "productId": Text,
        Quantity => "quantity": Integer,
        UpdatedAt => "updatedAt": Timestamp,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StockKey {
    Id(String),
    /// The `(boutiqueId, productId)` pair.
    BoutiqueProduct {
        boutique_id: String,
        product_id: String,
    },
}

impl StockKey {
    pub fn pair(boutique_id: impl Into<String>, product_id: impl Into<String>) -> Self {
        StockKey::BoutiqueProduct {
            boutique_id: boutique_id.into(),
            product_id: product_id.into(),
        }
    }
}

impl UniqueKey for StockKey {
    type Column = StockColumn;

    fn fields(&self) -> Vec<(StockColumn, Value)> {
        match self {
            StockKey::Id(id) => vec![(StockColumn::Id, id.into())],
            StockKey::BoutiqueProduct {
                boutique_id,
                product_id,
            } => vec![
                (StockColumn::BoutiqueId, boutique_id.into()),
                (StockColumn::ProductId, product_id.into()),
            ],
        }
    }
}

impl Model for Stock {
    type Column = StockColumn;
    type Key = StockKey;
    type Create = NewStock;

    const ENTITY: &'static str = "Stock";
    const UPDATED_AT: Option<StockColumn> = Some(StockColumn::UpdatedAt);
}

impl Insertable for NewStock {
    type Column = StockColumn;

    fn into_row(self) -> DbResult<Vec<(StockColumn, Value)>> {
        self.validate()?;

        Ok(vec![
            (StockColumn::Id, generate_id(self.id).into()),
            (StockColumn::BoutiqueId, self.boutique_id.into()),
            (StockColumn::ProductId, self.product_id.into()),
            (StockColumn::Quantity, self.quantity.unwrap_or(0).into()),
            (StockColumn::UpdatedAt, Utc::now().into()),
        ])
    }
}
