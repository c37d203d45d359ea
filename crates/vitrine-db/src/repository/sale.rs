//! # Sale Repository
//!
//! Recording, reading and voiding sales.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sale Lifecycle                                    │
//! │                                                                         │
//! │  1. RECORD (one transaction)                                           │
//! │     ├── offlineId already known? → return that sale unchanged          │
//! │     ├── INSERT Sale { total = Σ lines, status: completed }             │
//! │     ├── per line:                                                      │
//! │     │     UPDATE Stock SET quantity = quantity - n                     │
//! │     │       WHERE boutique/product match AND quantity >= n             │
//! │     │     0 rows → InsufficientStock, whole sale rolled back           │
//! │     │     INSERT SaleItem                                              │
//! │     └── INSERT Payment(s)  (one cash/card/.. payment if none given)    │
//! │                                                                         │
//! │  2. (OPTIONAL) VOID                                                    │
//! │     └── restock every line, status → voided                            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use tracing::{debug, info, warn};

use vitrine_core::{
    CoreError, Money, NewPayment, NewSale, NewSaleItem, NewSaleOrder, NewStock, Payment, Sale,
    SaleItem, SALE_STATUS_VOIDED,
};

use crate::error::{DbError, DbResult};
use crate::pool::Database;
use crate::query::{Aggregate, Changes, ColumnExt, Direction, FindMany};
use crate::schema::{PaymentColumn, SaleColumn, SaleItemColumn, SaleKey, StockColumn, StockKey};
use crate::transaction::Transaction;

/// A sale with its lines and tenders.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleDetails {
    pub sale: Sale,
    pub items: Vec<SaleItem>,
    pub payments: Vec<Payment>,
}

impl SaleDetails {
    pub fn total_paid(&self) -> Money {
        self.payments.iter().map(|p| p.amount).sum()
    }

    /// Sale total minus payments; negative when overpaid.
    pub fn balance_due(&self) -> Money {
        self.sale.total - self.total_paid()
    }
}

/// Repository for sale workflows.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    db: Database,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(db: Database) -> Self {
        SaleRepository { db }
    }

    /// Records a complete sale and takes its quantities out of stock.
    ///
    /// ## What This Does
    /// 1. Validates lines and payments
    /// 2. Returns the existing sale if `offline_id` was already recorded,
    ///    including when a concurrent call wins the insert race
    /// 3. Inserts sale, lines and payments, decrementing stock per line
    ///
    /// Any failure rolls the whole sale back.
    ///
    /// ## Errors
    /// * `DbError::Core(InsufficientStock)` - a line exceeds the boutique's stock
    /// * `DbError::Core(PaymentMismatch)` - payments don't add up to the total
    /// * `DbError::ForeignKeyViolation` - unknown boutique, cashier or product
    pub async fn record_sale(&self, order: NewSaleOrder) -> DbResult<SaleDetails> {
        order.validate()?;

        let mut tx = self.db.transaction().await?;

        if let Some(offline_id) = &order.offline_id {
            let existing = tx
                .sales()
                .find_unique(SaleKey::OfflineId(offline_id.clone()))
                .await?;
            if let Some(sale) = existing {
                warn!(
                    offline_id = %offline_id,
                    sale_id = %sale.id,
                    "Offline sale already recorded, returning it"
                );
                let details = load_details(&mut tx, sale).await?;
                tx.commit().await?;
                return Ok(details);
            }
        }

        let total = order.total();
        debug!(
            boutique_id = %order.boutique_id,
            lines = order.items.len(),
            total = %total,
            "Recording sale"
        );

        let created = tx
            .sales()
            .create(NewSale {
                id: None,
                boutique_id: order.boutique_id.clone(),
                cashier_user_id: order.cashier_user_id.clone(),
                total,
                payment_method: order.payment_method.clone(),
                currency: order.currency.clone(),
                created_at: None,
                offline_id: order.offline_id.clone(),
                status: None,
            })
            .await;
        let sale = match (created, &order.offline_id) {
            (Ok(sale), _) => sale,
            // Another connection recorded the same offline sale first.
            (Err(DbError::UniqueViolation { field }), Some(offline_id))
                if field.contains("offlineId") =>
            {
                tx.rollback().await?;
                warn!(offline_id = %offline_id, "Offline sale recorded concurrently, returning it");
                return self.by_offline_id(offline_id).await;
            }
            (Err(e), _) => return Err(e),
        };

        let mut items = Vec::with_capacity(order.items.len());
        for line in &order.items {
            take_from_stock(&mut tx, &sale.boutique_id, &line.product_id, line.quantity).await?;

            let item = tx
                .sale_items()
                .create(NewSaleItem {
                    id: None,
                    sale_id: sale.id.clone(),
                    product_id: line.product_id.clone(),
                    quantity: line.quantity,
                    unit_price: line.unit_price,
                    discount: Some(line.discount),
                })
                .await?;
            items.push(item);
        }

        let mut tenders: Vec<NewPayment> = order
            .payments
            .iter()
            .map(|p| NewPayment {
                id: None,
                sale_id: sale.id.clone(),
                method: p.method.clone(),
                amount: p.amount,
                reference: p.reference.clone(),
            })
            .collect();
        if tenders.is_empty() && total.is_positive() {
            tenders.push(NewPayment {
                id: None,
                sale_id: sale.id.clone(),
                method: order.payment_method.clone(),
                amount: total,
                reference: None,
            });
        }

        let mut payments = Vec::with_capacity(tenders.len());
        for tender in tenders {
            payments.push(tx.payments().create(tender).await?);
        }

        tx.commit().await?;

        info!(sale_id = %sale.id, total = %sale.total, "Sale recorded");
        Ok(SaleDetails {
            sale,
            items,
            payments,
        })
    }

    /// Loads a sale with its items and payments.
    pub async fn details(&self, sale_id: &str) -> DbResult<SaleDetails> {
        let mut tx = self.db.read_transaction().await?;
        let sale = tx
            .sales()
            .find_unique_or_throw(SaleKey::Id(sale_id.to_string()))
            .await?;
        let details = load_details(&mut tx, sale).await?;
        tx.commit().await?;
        Ok(details)
    }

    /// Loads the sale recorded under `offline_id`.
    pub async fn by_offline_id(&self, offline_id: &str) -> DbResult<SaleDetails> {
        let mut tx = self.db.read_transaction().await?;
        let sale = tx
            .sales()
            .find_unique_or_throw(SaleKey::OfflineId(offline_id.to_string()))
            .await?;
        let details = load_details(&mut tx, sale).await?;
        tx.commit().await?;
        Ok(details)
    }

    /// Σ payments recorded for the sale.
    pub async fn total_paid(&self, sale_id: &str) -> DbResult<Money> {
        let result = self
            .db
            .payments()
            .aggregate(
                Aggregate::new()
                    .filter(PaymentColumn::SaleId.equals(sale_id))
                    .sum(PaymentColumn::Amount),
            )
            .await?;

        Ok(result
            .sum(PaymentColumn::Amount)
            .map(Money::new)
            .unwrap_or_else(Money::zero))
    }

    /// Sale total minus payments.
    pub async fn balance_due(&self, sale_id: &str) -> DbResult<Money> {
        let sale = self
            .db
            .sales()
            .find_unique_or_throw(SaleKey::Id(sale_id.to_string()))
            .await?;
        Ok(sale.total - self.total_paid(sale_id).await?)
    }

    /// Most recent sales of a boutique, newest first.
    pub async fn recent(&self, boutique_id: &str, limit: i64) -> DbResult<Vec<Sale>> {
        self.db
            .sales()
            .find_many(
                FindMany::new()
                    .filter(SaleColumn::BoutiqueId.equals(boutique_id))
                    .order_by(SaleColumn::CreatedAt, Direction::Desc)
                    .take(limit),
            )
            .await
    }

    /// Voids a completed sale and puts its quantities back in stock.
    pub async fn void_sale(&self, sale_id: &str) -> DbResult<Sale> {
        let mut tx = self.db.transaction().await?;

        let key = SaleKey::Id(sale_id.to_string());
        let sale = tx.sales().find_unique_or_throw(key.clone()).await?;
        if sale.is_voided() {
            return Err(CoreError::InvalidSaleStatus {
                sale_id: sale.id,
                status: sale.status,
            }
            .into());
        }

        let items = tx
            .sale_items()
            .find_many(FindMany::new().filter(SaleItemColumn::SaleId.equals(&sale.id)))
            .await?;
        for item in &items {
            tx.stocks()
                .upsert(
                    StockKey::pair(&sale.boutique_id, &item.product_id),
                    NewStock {
                        boutique_id: sale.boutique_id.clone(),
                        product_id: item.product_id.clone(),
                        quantity: Some(item.quantity),
                        ..Default::default()
                    },
                    Changes::new().increment(StockColumn::Quantity, item.quantity),
                )
                .await?;
        }

        let voided = tx
            .sales()
            .update(key, Changes::new().set(SaleColumn::Status, SALE_STATUS_VOIDED))
            .await?;
        tx.commit().await?;

        info!(sale_id = %voided.id, lines = items.len(), "Sale voided");
        Ok(voided)
    }
}

/// Decrements stock for one line, failing when it would go negative.
async fn take_from_stock(
    tx: &mut Transaction,
    boutique_id: &str,
    product_id: &str,
    quantity: i64,
) -> DbResult<()> {
    let taken = tx
        .stocks()
        .update_many(
            StockColumn::BoutiqueId
                .equals(boutique_id)
                .and(StockColumn::ProductId.equals(product_id))
                .and(StockColumn::Quantity.gte(quantity)),
            Changes::new().decrement(StockColumn::Quantity, quantity),
        )
        .await?;

    if taken == 0 {
        let available = tx
            .stocks()
            .find_unique(StockKey::pair(boutique_id, product_id))
            .await?
            .map_or(0, |s| s.quantity);
        return Err(DbError::Core(CoreError::InsufficientStock {
            boutique_id: boutique_id.to_string(),
            product_id: product_id.to_string(),
            available,
            requested: quantity,
        }));
    }
    Ok(())
}

async fn load_details(tx: &mut Transaction, sale: Sale) -> DbResult<SaleDetails> {
    let items = tx
        .sale_items()
        .find_many(FindMany::new().filter(SaleItemColumn::SaleId.equals(&sale.id)))
        .await?;
    let payments = tx
        .payments()
        .find_many(FindMany::new().filter(PaymentColumn::SaleId.equals(&sale.id)))
        .await?;

    Ok(SaleDetails {
        sale,
        items,
        payments,
    })
}
