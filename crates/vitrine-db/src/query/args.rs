//! Find arguments (filter, order, pagination) and update change sets.

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::{QueryBuilder, Sqlite};

use super::filter::Filter;
use super::value::{push_value, Value};
use super::{Column, ColumnKind};
use crate::error::{DbError, DbResult};

// =============================================================================
// Find Arguments
// =============================================================================

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    fn sql(&self) -> &'static str {
        match self {
            Direction::Asc => " ASC",
            Direction::Desc => " DESC",
        }
    }
}

/// Arguments of `find_many` / `find_first` / `aggregate`.
///
/// ## Example
/// ```rust,ignore
/// let page = FindMany::new()
///     .filter(SaleColumn::BoutiqueId.equals(&boutique.id))
///     .order_by(SaleColumn::CreatedAt, Direction::Desc)
///     .skip(20)
///     .take(20);
/// ```
#[derive(Debug, Clone)]
pub struct FindMany<C> {
    pub(crate) filter: Option<Filter<C>>,
    pub(crate) order: Vec<(C, Direction)>,
    pub(crate) take: Option<i64>,
    pub(crate) skip: Option<i64>,
}

impl<C> Default for FindMany<C> {
    fn default() -> Self {
        FindMany {
            filter: None,
            order: Vec::new(),
            take: None,
            skip: None,
        }
    }
}

impl<C: Column> FindMany<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the filter; a second call ANDs with the first.
    pub fn filter(mut self, filter: Filter<C>) -> Self {
        self.filter = Some(match self.filter.take() {
            Some(existing) => existing.and(filter),
            None => filter,
        });
        self
    }

    /// Adds a sort key. Keys apply in call order.
    pub fn order_by(mut self, column: C, direction: Direction) -> Self {
        self.order.push((column, direction));
        self
    }

    pub fn take(mut self, n: i64) -> Self {
        self.take = Some(n);
        self
    }

    pub fn skip(mut self, n: i64) -> Self {
        self.skip = Some(n);
        self
    }

    pub(crate) fn check(&self) -> DbResult<()> {
        if matches!(self.take, Some(n) if n < 0) {
            return Err(DbError::InvalidArgument("take must not be negative".to_string()));
        }
        if matches!(self.skip, Some(n) if n < 0) {
            return Err(DbError::InvalidArgument("skip must not be negative".to_string()));
        }
        Ok(())
    }

    pub(crate) fn push_where(&self, qb: &mut QueryBuilder<'_, Sqlite>) {
        push_where(qb, self.filter.as_ref());
    }

    pub(crate) fn push_order_and_limit(&self, qb: &mut QueryBuilder<'_, Sqlite>) {
        push_order(qb, &self.order);
        push_limit(qb, self.take, self.skip);
    }
}

pub(crate) fn push_where<C: Column>(qb: &mut QueryBuilder<'_, Sqlite>, filter: Option<&Filter<C>>) {
    if let Some(filter) = filter {
        qb.push(" WHERE ");
        filter.render(qb);
    }
}

pub(crate) fn push_order<C: Column>(qb: &mut QueryBuilder<'_, Sqlite>, order: &[(C, Direction)]) {
    for (i, (column, direction)) in order.iter().enumerate() {
        qb.push(if i == 0 { " ORDER BY " } else { ", " });
        if column.kind() == ColumnKind::Decimal {
            qb.push(format!("CAST({} AS REAL)", column.qualified()));
        } else {
            qb.push(column.qualified());
        }
        qb.push(direction.sql());
    }
}

pub(crate) fn push_limit(qb: &mut QueryBuilder<'_, Sqlite>, take: Option<i64>, skip: Option<i64>) {
    match (take, skip) {
        (None, None) => {}
        (take, skip) => {
            // SQLite needs a LIMIT before OFFSET; -1 means no limit.
            qb.push(" LIMIT ");
            qb.push_bind(take.unwrap_or(-1));
            if let Some(skip) = skip {
                qb.push(" OFFSET ");
                qb.push_bind(skip);
            }
        }
    }
}

// =============================================================================
// Changes
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
enum Change {
    Set(Value),
    Increment(Value),
    Decrement(Value),
    Multiply(Value),
    Divide(Value),
}

/// Column assignments of an `update` / `update_many` / `upsert`.
///
/// `increment`, `decrement`, `multiply` and `divide` accept integer and
/// decimal columns:
///
/// - integer arithmetic runs inside the UPDATE statement, so concurrent
///   writers never lose each other's deltas
/// - decimal arithmetic is computed exactly in Rust from the current row,
///   inside a write transaction, and written back as a plain assignment
///   (SQLite would round the TEXT value through REAL)
#[derive(Debug, Clone)]
pub struct Changes<C> {
    ops: Vec<(C, Change)>,
}

impl<C> Default for Changes<C> {
    fn default() -> Self {
        Changes { ops: Vec::new() }
    }
}

impl<C: Column> Changes<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, column: C, value: impl Into<Value>) -> Self {
        self.ops.push((column, Change::Set(value.into())));
        self
    }

    pub fn set_null(mut self, column: C) -> Self {
        self.ops.push((column, Change::Set(Value::Null)));
        self
    }

    pub fn increment(mut self, column: C, by: impl Into<Value>) -> Self {
        self.ops.push((column, Change::Increment(by.into())));
        self
    }

    pub fn decrement(mut self, column: C, by: impl Into<Value>) -> Self {
        self.ops.push((column, Change::Decrement(by.into())));
        self
    }

    pub fn multiply(mut self, column: C, by: impl Into<Value>) -> Self {
        self.ops.push((column, Change::Multiply(by.into())));
        self
    }

    pub fn divide(mut self, column: C, by: impl Into<Value>) -> Self {
        self.ops.push((column, Change::Divide(by.into())));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    fn touches(&self, column: C) -> bool {
        self.ops.iter().any(|(c, _)| *c == column)
    }

    /// Adds `updated_at = now` unless the caller set it explicitly.
    pub(crate) fn with_timestamp(mut self, updated_at: Option<C>) -> Self {
        if let Some(column) = updated_at {
            if !self.touches(column) {
                self.ops.push((column, Change::Set(Value::Timestamp(Utc::now()))));
            }
        }
        self
    }

    /// Rewrites the text of every `set` on `column`.
    pub(crate) fn map_text(mut self, column: C, f: impl Fn(&str) -> String) -> Self {
        for (c, change) in &mut self.ops {
            if *c == column {
                if let Change::Set(Value::Text(text)) = change {
                    *text = f(text);
                }
            }
        }
        self
    }

    /// Rejects arithmetic on non-numeric columns, non-numeric operands and
    /// division by zero.
    pub(crate) fn check(&self) -> DbResult<()> {
        for (column, change) in &self.ops {
            let (operand, divides) = match change {
                Change::Set(_) => continue,
                Change::Increment(v) | Change::Decrement(v) | Change::Multiply(v) => (v, false),
                Change::Divide(v) => (v, true),
            };

            if !column.kind().supports_arithmetic() {
                return Err(DbError::InvalidArgument(format!(
                    "{}.{} does not support arithmetic updates",
                    C::TABLE,
                    column.name()
                )));
            }
            let is_zero = if column.kind() == ColumnKind::Integer {
                operand.as_i64().map(|n| n == 0)
            } else {
                exact_decimal(operand).map(|d| d.is_zero())
            };
            match is_zero {
                None => {
                    return Err(DbError::InvalidArgument(format!(
                        "arithmetic operand for {} must be {}",
                        column.name(),
                        if column.kind() == ColumnKind::Integer {
                            "an integer"
                        } else {
                            "an exact number"
                        }
                    )))
                }
                Some(true) if divides => {
                    return Err(DbError::InvalidArgument(format!(
                        "division of {} by zero",
                        column.name()
                    )))
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    /// Decimal columns targeted by arithmetic, in first-use order.
    pub(crate) fn decimal_arithmetic_columns(&self) -> Vec<C> {
        let mut columns = Vec::new();
        for (column, change) in &self.ops {
            if column.kind() == ColumnKind::Decimal
                && !matches!(change, Change::Set(_))
                && !columns.contains(column)
            {
                columns.push(*column);
            }
        }
        columns
    }

    pub(crate) fn has_decimal_arithmetic(&self) -> bool {
        !self.decimal_arithmetic_columns().is_empty()
    }

    /// Turns decimal arithmetic into assignments computed from `current`.
    ///
    /// Operations on one column apply in call order and collapse into a
    /// single `set`. Arithmetic on `NULL` stays `NULL`. Integer operations
    /// are kept as they are.
    pub(crate) fn resolve(&self, current: &[(C, Value)]) -> DbResult<Changes<C>> {
        let mut running: Vec<(C, Value)> = Vec::new();
        let mut ops = Vec::with_capacity(self.ops.len());

        for (column, change) in &self.ops {
            if column.kind() != ColumnKind::Decimal {
                ops.push((*column, change.clone()));
                continue;
            }
            let index = match running.iter().position(|(c, _)| c == column) {
                Some(i) => i,
                None => {
                    let start = current
                        .iter()
                        .find(|(c, _)| c == column)
                        .map_or(Value::Null, |(_, v)| v.clone());
                    running.push((*column, start));
                    running.len() - 1
                }
            };
            let slot = &mut running[index].1;
            *slot = match change {
                Change::Set(v) => v.clone(),
                Change::Increment(by) => apply_decimal(*column, slot, by, Decimal::checked_add)?,
                Change::Decrement(by) => apply_decimal(*column, slot, by, Decimal::checked_sub)?,
                Change::Multiply(by) => apply_decimal(*column, slot, by, Decimal::checked_mul)?,
                Change::Divide(by) => apply_decimal(*column, slot, by, Decimal::checked_div)?,
            };
        }

        ops.extend(running.into_iter().map(|(c, v)| (c, Change::Set(v))));
        Ok(Changes { ops })
    }

    /// Appends ` SET a = ?, b = b + ?`.
    pub(crate) fn push_set(&self, qb: &mut QueryBuilder<'_, Sqlite>) {
        qb.push(" SET ");
        for (i, (column, change)) in self.ops.iter().enumerate() {
            if i > 0 {
                qb.push(", ");
            }
            let col = column.quoted();
            qb.push(format!("{} = ", col));
            let (op, value) = match change {
                Change::Set(v) => {
                    push_value(qb, v.clone());
                    continue;
                }
                Change::Increment(v) => (" + ", v),
                Change::Decrement(v) => (" - ", v),
                Change::Multiply(v) => (" * ", v),
                Change::Divide(v) => (" / ", v),
            };
            qb.push(format!("{}{}", col, op));
            push_value(qb, value.clone());
        }
    }
}

/// Integers and decimals; floats are not exact and are refused.
fn exact_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Int(i) => Some(Decimal::from(*i)),
        Value::Decimal(d) => Some(*d),
        _ => None,
    }
}

fn apply_decimal<C: Column>(
    column: C,
    current: &Value,
    operand: &Value,
    op: fn(Decimal, Decimal) -> Option<Decimal>,
) -> DbResult<Value> {
    if current.is_null() {
        return Ok(Value::Null);
    }
    let base = current.as_decimal().ok_or_else(|| {
        DbError::InvalidArgument(format!("{}.{} is not a number", C::TABLE, column.name()))
    })?;
    let by = exact_decimal(operand).ok_or_else(|| {
        DbError::InvalidArgument(format!(
            "arithmetic operand for {} must be an exact number",
            column.name()
        ))
    })?;
    op(base, by).map(Value::Decimal).ok_or_else(|| {
        DbError::InvalidArgument(format!(
            "{}.{} is out of range after the update",
            C::TABLE,
            column.name()
        ))
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
