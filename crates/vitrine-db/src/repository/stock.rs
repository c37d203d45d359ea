//! # Stock Repository
//!
//! Deliveries in, manual corrections, and stock levels.
//!
//! ```text
//! receive(NewStockReceipt)                adjust(boutique, product, delta)
//!   ├── INSERT StockEntry                   delta >= 0: upsert quantity + delta
//!   ├── per line:                           delta <  0: UPDATE .. WHERE quantity >= -delta
//!   │     INSERT StockEntryItem                         0 rows → InsufficientStock
//!   │     upsert Stock quantity + n
//!   └── COMMIT
//! ```

use serde::Serialize;
use tracing::{debug, info};

use vitrine_core::{
    CoreError, NewStock, NewStockEntry, NewStockEntryItem, NewStockReceipt, Stock, StockEntry,
    StockEntryItem,
};

use crate::error::{DbError, DbResult};
use crate::model::UniqueKey;
use crate::pool::Database;
use crate::query::{Changes, ColumnExt, Direction, FindMany};
use crate::schema::{StockColumn, StockKey};
use crate::transaction::Transaction;

/// A recorded delivery.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceivedStock {
    pub entry: StockEntry,
    pub items: Vec<StockEntryItem>,
}

/// Repository for stock workflows.
#[derive(Debug, Clone)]
pub struct StockRepository {
    db: Database,
}

impl StockRepository {
    pub fn new(db: Database) -> Self {
        StockRepository { db }
    }

    /// Records a delivery and adds its quantities to the boutique's stock.
    ///
    /// Stock rows missing for a product are created.
    pub async fn receive(&self, receipt: NewStockReceipt) -> DbResult<ReceivedStock> {
        receipt.validate()?;
        debug!(
            boutique_id = %receipt.boutique_id,
            lines = receipt.items.len(),
            "Receiving stock"
        );

        let mut tx = self.db.transaction().await?;

        let entry = tx
            .stock_entries()
            .create(NewStockEntry {
                id: None,
                supplier_id: receipt.supplier_id.clone(),
                reference: receipt.reference.clone(),
                created_by_user_id: receipt.created_by_user_id.clone(),
                created_at: None,
            })
            .await?;

        let mut items = Vec::with_capacity(receipt.items.len());
        for line in &receipt.items {
            let item = tx
                .stock_entry_items()
                .create(NewStockEntryItem {
                    id: None,
                    stock_entry_id: entry.id.clone(),
                    product_id: line.product_id.clone(),
                    quantity: line.quantity,
                    unit_cost: line.unit_cost,
                })
                .await?;
            items.push(item);

            add_to_stock(&mut tx, &receipt.boutique_id, &line.product_id, line.quantity).await?;
        }

        tx.commit().await?;

        info!(
            entry_id = %entry.id,
            total_cost = %receipt.total_cost(),
            "Stock received"
        );
        Ok(ReceivedStock { entry, items })
    }

    /// Adds `delta` (which may be negative) to a stock level.
    ///
    /// ## Errors
    /// * `DbError::Core(InsufficientStock)` - the level would drop below zero
    /// * `DbError::InvalidArgument` - `delta` is `i64::MIN`
    pub async fn adjust(&self, boutique_id: &str, product_id: &str, delta: i64) -> DbResult<Stock> {
        let wanted = delta.checked_neg().ok_or_else(|| {
            DbError::InvalidArgument(format!("stock delta {} is out of range", delta))
        })?;

        let mut tx = self.db.transaction().await?;

        let stock = if delta >= 0 {
            add_to_stock(&mut tx, boutique_id, product_id, delta).await?
        } else {
            let taken = tx
                .stocks()
                .update_many(
                    StockKey::pair(boutique_id, product_id)
                        .to_filter()
                        .and(StockColumn::Quantity.gte(wanted)),
                    Changes::new().decrement(StockColumn::Quantity, wanted),
                )
                .await?;

            let current = tx
                .stocks()
                .find_unique(StockKey::pair(boutique_id, product_id))
                .await?;
            match current {
                Some(stock) if taken > 0 => stock,
                current => {
                    return Err(CoreError::InsufficientStock {
                        boutique_id: boutique_id.to_string(),
                        product_id: product_id.to_string(),
                        available: current.map_or(0, |s| s.quantity),
                        requested: wanted,
                    }
                    .into());
                }
            }
        };

        tx.commit().await?;

        info!(
            boutique_id = %boutique_id,
            product_id = %product_id,
            delta,
            quantity = stock.quantity,
            "Stock adjusted"
        );
        Ok(stock)
    }

    /// Quantity on hand; 0 when no Stock row exists.
    pub async fn level(&self, boutique_id: &str, product_id: &str) -> DbResult<i64> {
        Ok(self
            .db
            .stocks()
            .find_unique(StockKey::pair(boutique_id, product_id))
            .await?
            .map_or(0, |s| s.quantity))
    }

    /// Stock rows of a boutique below `threshold`, lowest first.
    pub async fn low_stock(&self, boutique_id: &str, threshold: i64) -> DbResult<Vec<Stock>> {
        self.db
            .stocks()
            .find_many(
                FindMany::new()
                    .filter(
                        StockColumn::BoutiqueId
                            .equals(boutique_id)
                            .and(StockColumn::Quantity.lt(threshold)),
                    )
                    .order_by(StockColumn::Quantity, Direction::Asc),
            )
            .await
    }
}

async fn add_to_stock(
    tx: &mut Transaction,
    boutique_id: &str,
    product_id: &str,
    quantity: i64,
) -> DbResult<Stock> {
    tx.stocks()
        .upsert(
            StockKey::pair(boutique_id, product_id),
            NewStock {
                id: None,
                boutique_id: boutique_id.to_string(),
                product_id: product_id.to_string(),
                quantity: Some(quantity),
            },
            Changes::new().increment(StockColumn::Quantity, quantity),
        )
        .await
}
