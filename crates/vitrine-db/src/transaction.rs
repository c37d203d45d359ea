//! # Transactions
//!
//! A [`Transaction`] offers the same entity delegates as
//! [`Database`](crate::Database); every statement runs on one connection
//! inside `BEGIN ... COMMIT`.
//!
//! ```text
//! let mut tx = db.transaction().await?;      BEGIN
//! tx.sales().create(..).await?;              INSERT INTO "Sale" ...
//! tx.stocks().update_many(..).await?;        UPDATE "Stock" ...
//! tx.commit().await?;                        COMMIT
//!
//! Early return with `?` drops `tx`            ROLLBACK
//! ```
//!
//! ## Locking
//! Write transactions start with `BEGIN IMMEDIATE`: the write lock is taken
//! up front, so a second writer waits on the busy timeout instead of failing
//! with "database is locked" when it first writes after a read.

use sqlx::{Sqlite, SqlitePool};
use tracing::debug;

use vitrine_core::{
    AuditLog, Boutique, Payment, Product, Sale, SaleItem, Stock, StockEntry, StockEntryItem,
    Supplier, User,
};

use crate::delegate::Delegate;
use crate::error::{DbError, DbResult};
use crate::model::Model;
use crate::query::Value;
use crate::raw::{self, JsonRow};

/// An open SQLite transaction.
///
/// Dropping it without [`commit`](Transaction::commit) rolls back.
pub struct Transaction {
    inner: sqlx::Transaction<'static, Sqlite>,
}

impl Transaction {
    /// Starts a write transaction (`BEGIN IMMEDIATE`).
    pub(crate) async fn begin(pool: &SqlitePool) -> DbResult<Self> {
        let inner = begin_immediate(pool).await?;
        debug!("Transaction started");
        Ok(Transaction { inner })
    }

    /// Starts a read-only snapshot (`BEGIN`); does not block writers.
    pub(crate) async fn begin_read(pool: &SqlitePool) -> DbResult<Self> {
        let inner = pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
        debug!("Read transaction started");
        Ok(Transaction { inner })
    }

    pub async fn commit(self) -> DbResult<()> {
        self.inner
            .commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
        debug!("Transaction committed");
        Ok(())
    }

    pub async fn rollback(self) -> DbResult<()> {
        self.inner
            .rollback()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
        debug!("Transaction rolled back");
        Ok(())
    }

    /// Delegate for any model, bound to this transaction.
    pub fn delegate<M: Model>(&mut self) -> Delegate<'_, M> {
        Delegate::on(&mut *self.inner)
    }

    pub fn users(&mut self) -> Delegate<'_, User> {
        self.delegate()
    }

    pub fn boutiques(&mut self) -> Delegate<'_, Boutique> {
        self.delegate()
    }

    pub fn products(&mut self) -> Delegate<'_, Product> {
        self.delegate()
    }

    pub fn stocks(&mut self) -> Delegate<'_, Stock> {
        self.delegate()
    }

    pub fn suppliers(&mut self) -> Delegate<'_, Supplier> {
        self.delegate()
    }

    pub fn stock_entries(&mut self) -> Delegate<'_, StockEntry> {
        self.delegate()
    }

    pub fn stock_entry_items(&mut self) -> Delegate<'_, StockEntryItem> {
        self.delegate()
    }

    pub fn sales(&mut self) -> Delegate<'_, Sale> {
        self.delegate()
    }

    pub fn sale_items(&mut self) -> Delegate<'_, SaleItem> {
        self.delegate()
    }

    pub fn payments(&mut self) -> Delegate<'_, Payment> {
        self.delegate()
    }

    pub fn audit_logs(&mut self) -> Delegate<'_, AuditLog> {
        self.delegate()
    }

    /// Raw SELECT inside the transaction; sees its uncommitted writes.
    pub async fn query_raw(&mut self, sql: &str, params: Vec<Value>) -> DbResult<Vec<JsonRow>> {
        raw::query_raw(&mut *self.inner, sql, params).await
    }

    pub async fn execute_raw(&mut self, sql: &str, params: Vec<Value>) -> DbResult<u64> {
        raw::execute_raw(&mut *self.inner, sql, params).await
    }
}

/// `BEGIN IMMEDIATE` on a pooled connection.
pub(crate) async fn begin_immediate(
    pool: &SqlitePool,
) -> DbResult<sqlx::Transaction<'static, Sqlite>> {
    pool.begin_with("BEGIN IMMEDIATE")
        .await
        .map_err(|e| DbError::TransactionFailed(e.to_string()))
}
