//! # Entity Delegate
//!
//! The per-entity CRUD and aggregate surface: `db.products()`,
//! `tx.sales()`, ... all return a [`Delegate`].
//!
//! ## Connection Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  db.products()  ──▶ Delegate { Conn::Pool(SqlitePool) }                │
//! │                        each call checks out a pooled connection        │
//! │                                                                         │
//! │  tx.products()  ──▶ Delegate { Conn::Tx(&mut SqliteConnection) }      │
//! │                        every call runs on the open transaction         │
//! │                                                                         │
//! │  Same methods, same SQL; only the executor differs.                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Operations
//! | Read                    | Write                 | Aggregate   |
//! |-------------------------|-----------------------|-------------|
//! | `find_unique`           | `create`              | `count`     |
//! | `find_unique_or_throw`  | `create_many`         | `aggregate` |
//! | `find_first`            | `update`              | `group_by`  |
//! | `find_first_or_throw`   | `update_many`         |             |
//! | `find_many`             | `upsert`              |             |
//! |                         | `delete`              |             |
//! |                         | `delete_many`         |             |

use sqlx::{QueryBuilder, Row, Sqlite, SqliteConnection, SqlitePool};
use std::marker::PhantomData;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::model::{Insertable, Model, UniqueKey};
use crate::query::args::push_where;
use crate::query::value::{push_value, timestamp_text};
use crate::query::{
    Aggregate, AggregateResult, Changes, Column, Filter, FindMany, GroupBy, GroupRow, Value,
};
use crate::transaction::begin_immediate;

/// Rows per INSERT statement in `create_many`.
const INSERT_CHUNK: usize = 500;

pub(crate) enum Conn<'c> {
    Pool(SqlitePool),
    Tx(&'c mut SqliteConnection),
}

/// Runs `$body` with `$e` bound to whichever executor the delegate holds.
macro_rules! on_conn {
    ($conn:expr, |$e:ident| $body:expr) => {
        match $conn {
            Conn::Pool(pool) => {
                let $e = &*pool;
                $body
            }
            Conn::Tx(conn) => {
                let $e = &mut **conn;
                $body
            }
        }
    };
}

/// CRUD and aggregate operations on the table of `M`.
///
/// ## Example
/// ```rust,ignore
/// let product = db.products()
///     .find_unique_or_throw(ProductKey::Sku("THE-VERT-100".into()))
///     .await?;
///
/// let low = db.stocks()
///     .find_many(FindMany::new().filter(StockColumn::Quantity.lt(5)))
///     .await?;
/// ```
pub struct Delegate<'c, M> {
    conn: Conn<'c>,
    _model: PhantomData<fn() -> M>,
}

impl<'c, M: Model> Delegate<'c, M> {
    pub(crate) fn pooled(pool: SqlitePool) -> Self {
        Delegate {
            conn: Conn::Pool(pool),
            _model: PhantomData,
        }
    }

    pub(crate) fn on(conn: &'c mut SqliteConnection) -> Self {
        Delegate {
            conn: Conn::Tx(conn),
            _model: PhantomData,
        }
    }

    fn table() -> &'static str {
        <M::Column as Column>::TABLE
    }

    fn select() -> QueryBuilder<'static, Sqlite> {
        QueryBuilder::new(format!("SELECT * FROM \"{}\"", Self::table()))
    }

    // =========================================================================
    // Read
    // =========================================================================

    pub async fn find_unique(&mut self, key: M::Key) -> DbResult<Option<M>> {
        debug!(entity = M::ENTITY, key = %key.describe(), "find_unique");

        let filter = key.to_filter();
        let mut qb = Self::select();
        push_where(&mut qb, Some(&filter));
        qb.push(" LIMIT 1");

        let row = on_conn!(&mut self.conn, |e| qb
            .build_query_as::<M>()
            .fetch_optional(e)
            .await?);
        Ok(row)
    }

    pub async fn find_unique_or_throw(&mut self, key: M::Key) -> DbResult<M> {
        let described = key.describe();
        self.find_unique(key)
            .await?
            .ok_or_else(|| DbError::not_found(M::ENTITY, described))
    }

    /// First row matching `args` in its order; `take` is ignored.
    pub async fn find_first(&mut self, mut args: FindMany<M::Column>) -> DbResult<Option<M>> {
        args.take = Some(1);
        Ok(self.find_many(args).await?.into_iter().next())
    }

    pub async fn find_first_or_throw(&mut self, args: FindMany<M::Column>) -> DbResult<M> {
        self.find_first(args)
            .await?
            .ok_or_else(|| DbError::not_found(M::ENTITY, "first matching row"))
    }

    pub async fn find_many(&mut self, args: FindMany<M::Column>) -> DbResult<Vec<M>> {
        args.check()?;

        let mut qb = Self::select();
        args.push_where(&mut qb);
        args.push_order_and_limit(&mut qb);
        debug!(entity = M::ENTITY, sql = qb.sql(), "find_many");

        let rows = on_conn!(&mut self.conn, |e| qb
            .build_query_as::<M>()
            .fetch_all(e)
            .await?);
        Ok(rows)
    }

    // =========================================================================
    // Create
    // =========================================================================

    pub async fn create(&mut self, input: M::Create) -> DbResult<M> {
        let row = input.into_row()?;
        debug!(entity = M::ENTITY, "create");

        let mut qb = QueryBuilder::new(format!("INSERT INTO \"{}\" (", Self::table()));
        push_column_list(&mut qb, row.iter().map(|(c, _)| *c));
        qb.push(") VALUES (");
        for (i, (_, value)) in row.into_iter().enumerate() {
            if i > 0 {
                qb.push(", ");
            }
            push_value(&mut qb, value);
        }
        qb.push(") RETURNING *");

        let created = on_conn!(&mut self.conn, |e| qb
            .build_query_as::<M>()
            .fetch_one(e)
            .await?);
        Ok(created)
    }

    /// Inserts every input and returns the number of rows written.
    ///
    /// All inputs are validated before anything is written, and the batch is
    /// atomic. With `skip_duplicates`, rows hitting a unique constraint are
    /// skipped instead of failing the batch.
    pub async fn create_many(
        &mut self,
        inputs: Vec<M::Create>,
        skip_duplicates: bool,
    ) -> DbResult<u64> {
        let rows = inputs
            .into_iter()
            .map(Insertable::into_row)
            .collect::<DbResult<Vec<_>>>()?;
        if rows.is_empty() {
            return Ok(0);
        }
        debug!(entity = M::ENTITY, rows = rows.len(), skip_duplicates, "create_many");

        match &mut self.conn {
            Conn::Pool(pool) => {
                let mut tx = begin_immediate(pool).await?;
                let inserted = insert_rows::<M::Column>(&mut tx, rows, skip_duplicates).await?;
                tx.commit().await?;
                Ok(inserted)
            }
            Conn::Tx(conn) => insert_rows::<M::Column>(conn, rows, skip_duplicates).await,
        }
    }

    // =========================================================================
    // Update
    // =========================================================================

    /// Applies `changes` to the row identified by `key`.
    ///
    /// Decimal arithmetic reads the row and writes the exact result inside a
    /// write transaction (the caller's, or one opened here).
    pub async fn update(&mut self, key: M::Key, changes: Changes<M::Column>) -> DbResult<M> {
        let changes = M::prepare_changes(changes).with_timestamp(M::UPDATED_AT);
        changes.check()?;
        if changes.is_empty() {
            return self.find_unique_or_throw(key).await;
        }
        debug!(entity = M::ENTITY, key = %key.describe(), changes = changes.len(), "update");

        if changes.has_decimal_arithmetic() {
            if let Conn::Pool(pool) = &self.conn {
                let mut tx = begin_immediate(pool).await?;
                let row = Delegate::<M>::on(&mut tx).update_resolved(key, changes).await?;
                tx.commit().await?;
                return Ok(row);
            }
            return self.update_resolved(key, changes).await;
        }

        let filter = key.to_filter();
        let mut qb = QueryBuilder::new(format!("UPDATE \"{}\"", Self::table()));
        changes.push_set(&mut qb);
        push_where(&mut qb, Some(&filter));
        qb.push(" RETURNING *");

        let updated = on_conn!(&mut self.conn, |e| qb
            .build_query_as::<M>()
            .fetch_optional(e)
            .await?);
        updated.ok_or_else(|| DbError::not_found(M::ENTITY, key.describe()))
    }

    /// Applies `changes` to every row matching `filter`; returns the count.
    pub async fn update_many(
        &mut self,
        filter: Filter<M::Column>,
        changes: Changes<M::Column>,
    ) -> DbResult<u64> {
        let changes = M::prepare_changes(changes).with_timestamp(M::UPDATED_AT);
        changes.check()?;
        if changes.is_empty() {
            return Ok(self.count(filter).await? as u64);
        }

        if changes.has_decimal_arithmetic() {
            if let Conn::Pool(pool) = &self.conn {
                let mut tx = begin_immediate(pool).await?;
                let updated = Delegate::<M>::on(&mut tx)
                    .update_many_resolved(filter, changes)
                    .await?;
                tx.commit().await?;
                return Ok(updated);
            }
            return self.update_many_resolved(filter, changes).await;
        }

        let mut qb = QueryBuilder::new(format!("UPDATE \"{}\"", Self::table()));
        changes.push_set(&mut qb);
        push_where(&mut qb, Some(&filter));
        debug!(entity = M::ENTITY, sql = qb.sql(), "update_many");

        let result = on_conn!(&mut self.conn, |e| qb.build().execute(e).await?);
        Ok(result.rows_affected())
    }

    async fn update_resolved(&mut self, key: M::Key, changes: Changes<M::Column>) -> DbResult<M> {
        let mut rows = self.resolve_rows(&key.to_filter(), &changes).await?;
        let (id, resolved) = rows
            .pop()
            .ok_or_else(|| DbError::not_found(M::ENTITY, key.describe()))?;

        let mut qb = update_by_id(&resolved, id);
        qb.push(" RETURNING *");
        let updated = on_conn!(&mut self.conn, |e| qb
            .build_query_as::<M>()
            .fetch_one(e)
            .await?);
        Ok(updated)
    }

    async fn update_many_resolved(
        &mut self,
        filter: Filter<M::Column>,
        changes: Changes<M::Column>,
    ) -> DbResult<u64> {
        let rows = self.resolve_rows(&filter, &changes).await?;
        debug!(entity = M::ENTITY, rows = rows.len(), "update_many (exact decimals)");

        let mut updated = 0;
        for (id, resolved) in rows {
            let mut qb = update_by_id(&resolved, id);
            let result = on_conn!(&mut self.conn, |e| qb.build().execute(e).await?);
            updated += result.rows_affected();
        }
        Ok(updated)
    }

    /// Reads the decimal columns `changes` does arithmetic on for every row
    /// matching `filter`, and resolves the changes per row id.
    async fn resolve_rows(
        &mut self,
        filter: &Filter<M::Column>,
        changes: &Changes<M::Column>,
    ) -> DbResult<Vec<(String, Changes<M::Column>)>> {
        let columns = changes.decimal_arithmetic_columns();

        let mut qb = QueryBuilder::new("SELECT \"id\"");
        for column in &columns {
            qb.push(", ");
            qb.push(column.quoted());
        }
        qb.push(format!(" FROM \"{}\"", Self::table()));
        push_where(&mut qb, Some(filter));

        let rows = on_conn!(&mut self.conn, |e| qb.build().fetch_all(e).await?);
        rows.iter()
            .map(|row| {
                let id: String = row.try_get("id")?;
                let current = columns
                    .iter()
                    .map(|c| Ok((*c, Value::decode(row, c.name(), c.kind())?)))
                    .collect::<DbResult<Vec<_>>>()?;
                Ok((id, changes.resolve(&current)?))
            })
            .collect()
    }

    /// Updates the row identified by `key`, or creates it from `create`.
    ///
    /// Runs in its own transaction when the delegate is not already on one.
    pub async fn upsert(
        &mut self,
        key: M::Key,
        create: M::Create,
        changes: Changes<M::Column>,
    ) -> DbResult<M> {
        if let Conn::Pool(pool) = &self.conn {
            let mut tx = begin_immediate(pool).await?;
            let row = Delegate::<M>::on(&mut tx)
                .upsert_on_conn(key, create, changes)
                .await?;
            tx.commit().await?;
            return Ok(row);
        }
        self.upsert_on_conn(key, create, changes).await
    }

    async fn upsert_on_conn(
        &mut self,
        key: M::Key,
        create: M::Create,
        changes: Changes<M::Column>,
    ) -> DbResult<M> {
        let exists = self.count(key.to_filter()).await? > 0;
        debug!(entity = M::ENTITY, key = %key.describe(), exists, "upsert");
        if exists {
            self.update(key, changes).await
        } else {
            self.create(create).await
        }
    }

    // =========================================================================
    // Delete
    // =========================================================================

    /// Deletes the row identified by `key` and returns it.
    pub async fn delete(&mut self, key: M::Key) -> DbResult<M> {
        debug!(entity = M::ENTITY, key = %key.describe(), "delete");

        let filter = key.to_filter();
        let mut qb = QueryBuilder::new(format!("DELETE FROM \"{}\"", Self::table()));
        push_where(&mut qb, Some(&filter));
        qb.push(" RETURNING *");

        let deleted = on_conn!(&mut self.conn, |e| qb
            .build_query_as::<M>()
            .fetch_optional(e)
            .await?);
        deleted.ok_or_else(|| DbError::not_found(M::ENTITY, key.describe()))
    }

    pub async fn delete_many(&mut self, filter: Filter<M::Column>) -> DbResult<u64> {
        let mut qb = QueryBuilder::new(format!("DELETE FROM \"{}\"", Self::table()));
        push_where(&mut qb, Some(&filter));
        debug!(entity = M::ENTITY, sql = qb.sql(), "delete_many");

        let result = on_conn!(&mut self.conn, |e| qb.build().execute(e).await?);
        Ok(result.rows_affected())
    }

    // =========================================================================
    // Aggregate
    // =========================================================================

    pub async fn count(&mut self, filter: Filter<M::Column>) -> DbResult<i64> {
        let mut qb = QueryBuilder::new(format!("SELECT COUNT(*) FROM \"{}\"", Self::table()));
        push_where(&mut qb, Some(&filter));
        debug!(entity = M::ENTITY, sql = qb.sql(), "count");

        let n = on_conn!(&mut self.conn, |e| qb
            .build_query_scalar::<i64>()
            .fetch_one(e)
            .await?);
        Ok(n)
    }

    pub async fn aggregate(&mut self, args: Aggregate<M::Column>) -> DbResult<AggregateResult> {
        let mut qb = args.build()?;
        debug!(entity = M::ENTITY, sql = qb.sql(), "aggregate");

        let row = on_conn!(&mut self.conn, |e| qb.build().fetch_one(e).await?);
        args.collect(&row)
    }

    pub async fn group_by(&mut self, args: GroupBy<M::Column>) -> DbResult<Vec<GroupRow>> {
        let mut qb = args.build()?;
        debug!(entity = M::ENTITY, sql = qb.sql(), "group_by");

        let rows = on_conn!(&mut self.conn, |e| qb.build().fetch_all(e).await?);
        args.collect(&rows)
    }
}

fn push_column_list<C: Column>(qb: &mut QueryBuilder<'_, Sqlite>, columns: impl Iterator<Item = C>) {
    for (i, column) in columns.enumerate() {
        if i > 0 {
            qb.push(", ");
        }
        qb.push(column.quoted());
    }
}

fn update_by_id<C: Column>(changes: &Changes<C>, id: String) -> QueryBuilder<'static, Sqlite> {
    let mut qb = QueryBuilder::new(format!("UPDATE \"{}\"", C::TABLE));
    changes.push_set(&mut qb);
    qb.push(" WHERE \"id\" = ");
    qb.push_bind(id);
    qb
}

async fn insert_rows<C: Column>(
    conn: &mut SqliteConnection,
    rows: Vec<Vec<(C, Value)>>,
    skip_duplicates: bool,
) -> DbResult<u64> {
    let columns: Vec<C> = match rows.first() {
        Some(first) => first.iter().map(|(c, _)| *c).collect(),
        None => return Ok(0),
    };

    let mut inserted = 0;
    let mut rows = rows.into_iter().peekable();
    while rows.peek().is_some() {
        let chunk: Vec<_> = rows.by_ref().take(INSERT_CHUNK).collect();

        let mut qb = QueryBuilder::new(format!("INSERT INTO \"{}\" (", C::TABLE));
        push_column_list(&mut qb, columns.iter().copied());
        qb.push(") ");
        qb.push_values(chunk, |mut b, row| {
            for (_, value) in row {
                push_bound(&mut b, value);
            }
        });
        if skip_duplicates {
            qb.push(" ON CONFLICT DO NOTHING");
        }

        inserted += qb.build().execute(&mut *conn).await?.rows_affected();
    }
    Ok(inserted)
}

fn push_bound(b: &mut sqlx::query_builder::Separated<'_, '_, Sqlite, &'static str>, value: Value) {
    match value {
        Value::Null => {
            b.push_bind(None::<String>);
        }
        Value::Bool(v) => {
            b.push_bind(v);
        }
        Value::Int(v) => {
            b.push_bind(v);
        }
        Value::Real(v) => {
            b.push_bind(v);
        }
        Value::Text(v) => {
            b.push_bind(v);
        }
        Value::Decimal(v) => {
            b.push_bind(v.to_string());
        }
        Value::Timestamp(v) => {
            b.push_bind(timestamp_text(&v));
        }
        Value::Json(v) => {
            b.push_bind(v.to_string());
        }
    }
}
