//! # Aggregation
//!
//! `aggregate` and `group_by` arguments and results.
//!
//! ## Exactness
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  SQLite's SUM()/AVG() work in REAL for TEXT decimals:                   │
//! │      SUM('0.10', '0.20') = 0.30000000000000004                          │
//! │                                                                         │
//! │  So each column is aggregated where it stays exact:                    │
//! │                                                                         │
//! │    COUNT(*), COUNT(c)               in SQL                              │
//! │    integer SUM/MIN/MAX              in SQL                              │
//! │    text/bool/timestamp MIN/MAX      in SQL                              │
//! │    decimal columns                  json_group_array(c) in SQL,        │
//! │                                     folded here in rust_decimal:       │
//! │                                         0.10 + 0.20 = 0.30             │
//! │                                                                         │
//! │  group_by: SQL GROUP BY ──▶ merge groups whose decimal keys are equal  │
//! │            ("1.0" and "1.00") ──▶ having ──▶ order ──▶ skip/take       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use rust_decimal::Decimal;
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use super::args::{push_order, push_where, Direction, FindMany};
use super::filter::{CmpOp, Filter};
use super::value::Value;
use super::{Column, ColumnKind};
use crate::error::{DbError, DbResult};

// =============================================================================
// Selection
// =============================================================================

/// Aggregate function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggFn {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

#[derive(Debug, Clone)]
struct Selection<C> {
    count_all: bool,
    count: Vec<C>,
    sum: Vec<C>,
    avg: Vec<C>,
    min: Vec<C>,
    max: Vec<C>,
}

impl<C> Default for Selection<C> {
    fn default() -> Self {
        Selection {
            count_all: false,
            count: Vec::new(),
            sum: Vec::new(),
            avg: Vec::new(),
            min: Vec::new(),
            max: Vec::new(),
        }
    }
}

impl<C: Column> Selection<C> {
    fn add(&mut self, func: AggFn, column: C) {
        let list = match func {
            AggFn::Count => &mut self.count,
            AggFn::Sum => &mut self.sum,
            AggFn::Avg => &mut self.avg,
            AggFn::Min => &mut self.min,
            AggFn::Max => &mut self.max,
        };
        if !list.contains(&column) {
            list.push(column);
        }
    }

    fn columns(&self) -> impl Iterator<Item = C> + '_ {
        self.count
            .iter()
            .chain(&self.sum)
            .chain(&self.avg)
            .chain(&self.min)
            .chain(&self.max)
            .copied()
    }

    fn check(&self) -> DbResult<()> {
        for column in self.sum.iter().chain(&self.avg) {
            if !column.kind().is_numeric() {
                return Err(DbError::InvalidArgument(format!(
                    "cannot sum or average {}.{}",
                    C::TABLE,
                    column.name()
                )));
            }
        }
        Ok(())
    }
}

fn dedup<C: Column>(columns: impl IntoIterator<Item = C>) -> Vec<C> {
    let mut out: Vec<C> = Vec::new();
    for column in columns {
        if !out.contains(&column) {
            out.push(column);
        }
    }
    out
}

/// Result alias of the group's row count.
const ROWS: &str = "_rows";

fn alias(prefix: &str, column: &str) -> String {
    format!("{}.{}", prefix, column)
}

/// Appends `COUNT(*)` and the per-column aggregates `ColumnAcc::read` expects.
fn push_aggregates<C: Column>(qb: &mut QueryBuilder<'_, Sqlite>, columns: &[C]) {
    qb.push(format!("COUNT(*) AS \"{}\"", ROWS));
    for column in columns {
        let col = column.qualified();
        let name = column.name();
        if column.kind() == ColumnKind::Decimal {
            qb.push(format!(", json_group_array({}) AS \"{}\"", col, alias("v", name)));
            continue;
        }
        qb.push(format!(", COUNT({}) AS \"{}\"", col, alias("n", name)));
        if column.kind() == ColumnKind::Integer {
            qb.push(format!(", SUM({}) AS \"{}\"", col, alias("s", name)));
        }
        qb.push(format!(", MIN({}) AS \"{}\"", col, alias("lo", name)));
        qb.push(format!(", MAX({}) AS \"{}\"", col, alias("hi", name)));
    }
}

/// Parses a `json_group_array` of decimal TEXT values.
fn decode_decimals(row: &SqliteRow, name: &str) -> DbResult<Vec<Value>> {
    let bad = |detail: String| {
        DbError::QueryFailed(format!("invalid decimal values in column {}: {}", name, detail))
    };

    let text: Option<String> = row.try_get(alias("v", name).as_str())?;
    let items: Vec<serde_json::Value> = match text {
        Some(text) => serde_json::from_str(&text).map_err(|e| bad(e.to_string()))?,
        None => Vec::new(),
    };

    items
        .into_iter()
        .map(|item| match item {
            serde_json::Value::Null => Ok(Value::Null),
            serde_json::Value::String(s) => s
                .parse::<Decimal>()
                .map(Value::Decimal)
                .map_err(|e| bad(e.to_string())),
            serde_json::Value::Number(n) => {
                let s = n.to_string();
                s.parse::<Decimal>()
                    .or_else(|_| Decimal::from_scientific(&s))
                    .map(Value::Decimal)
                    .map_err(|e| bad(e.to_string()))
            }
            other => Err(bad(other.to_string())),
        })
        .collect()
}

/// Hashable identity of a group key; equal decimals share one identity.
///
/// `Value` holds f64 and JSON, so it cannot be a hash key itself.
fn group_identity(key: &[Value]) -> String {
    key.iter()
        .map(|v| match v {
            Value::Decimal(d) => format!("Decimal({})", d.normalize()),
            other => format!("{:?}", other),
        })
        .collect::<Vec<_>>()
        .join("|")
}

// =============================================================================
// Accumulators
// =============================================================================

#[derive(Debug, Clone, Default)]
struct ColumnAcc {
    count: i64,
    sum: Decimal,
    min: Option<Value>,
    max: Option<Value>,
}

impl ColumnAcc {
    /// Reads the aggregates `push_aggregates` selected for `column`.
    fn read<C: Column>(row: &SqliteRow, column: C) -> DbResult<Self> {
        let name = column.name();
        let mut acc = ColumnAcc::default();

        if column.kind() == ColumnKind::Decimal {
            for value in decode_decimals(row, name)? {
                acc.fold(column, value)?;
            }
            return Ok(acc);
        }

        acc.count = row.try_get(alias("n", name).as_str())?;
        if column.kind() == ColumnKind::Integer {
            let sum: Option<i64> = row.try_get(alias("s", name).as_str())?;
            acc.sum = sum.map_or(Decimal::ZERO, Decimal::from);
        }
        let present = |v: Value| (!v.is_null()).then_some(v);
        acc.min = present(Value::decode(row, &alias("lo", name), column.kind())?);
        acc.max = present(Value::decode(row, &alias("hi", name), column.kind())?);
        Ok(acc)
    }

    fn fold<C: Column>(&mut self, column: C, value: Value) -> DbResult<()> {
        if value.is_null() {
            return Ok(());
        }
        self.count += 1;
        if let Some(d) = value.as_decimal() {
            self.sum = checked_sum(column, self.sum, d)?;
        }
        self.offer(value);
        Ok(())
    }

    fn merge<C: Column>(&mut self, column: C, other: ColumnAcc) -> DbResult<()> {
        self.count += other.count;
        self.sum = checked_sum(column, self.sum, other.sum)?;
        if let Some(min) = other.min {
            self.offer(min);
        }
        if let Some(max) = other.max {
            self.offer(max);
        }
        Ok(())
    }

    fn offer(&mut self, value: Value) {
        if self
            .min
            .as_ref()
            .map_or(true, |m| value.compare(m) == Some(Ordering::Less))
        {
            self.min = Some(value.clone());
        }
        if self
            .max
            .as_ref()
            .map_or(true, |m| value.compare(m) == Some(Ordering::Greater))
        {
            self.max = Some(value);
        }
    }

    fn sum(&self) -> Option<Decimal> {
        (self.count > 0).then_some(self.sum)
    }

    fn avg(&self) -> Option<Decimal> {
        if self.count == 0 {
            return None;
        }
        self.sum.checked_div(Decimal::from(self.count))
    }
}

fn checked_sum<C: Column>(column: C, a: Decimal, b: Decimal) -> DbResult<Decimal> {
    a.checked_add(b).ok_or_else(|| {
        DbError::InvalidArgument(format!(
            "sum of {}.{} is out of range",
            C::TABLE,
            column.name()
        ))
    })
}

#[derive(Debug, Clone)]
struct GroupAcc<C> {
    rows: i64,
    columns: Vec<(C, ColumnAcc)>,
}

impl<C: Column> GroupAcc<C> {
    fn read(row: &SqliteRow, columns: &[C]) -> DbResult<Self> {
        Ok(GroupAcc {
            rows: row.try_get(ROWS)?,
            columns: columns
                .iter()
                .map(|c| Ok((*c, ColumnAcc::read(row, *c)?)))
                .collect::<DbResult<Vec<_>>>()?,
        })
    }

    fn merge(&mut self, other: GroupAcc<C>) -> DbResult<()> {
        self.rows += other.rows;
        for ((column, mine), (_, theirs)) in self.columns.iter_mut().zip(other.columns) {
            mine.merge(*column, theirs)?;
        }
        Ok(())
    }

    fn acc(&self, column: C) -> Option<&ColumnAcc> {
        self.columns.iter().find(|(c, _)| *c == column).map(|(_, a)| a)
    }

    fn finish(&self, selection: &Selection<C>) -> AggregateResult {
        let mut result = AggregateResult {
            count_all: selection.count_all.then_some(self.rows),
            ..Default::default()
        };
        for column in &selection.count {
            let n = self.acc(*column).map_or(0, |a| a.count);
            result.counts.insert(column.name(), n);
        }
        for column in &selection.sum {
            result.sums.insert(column.name(), self.acc(*column).and_then(ColumnAcc::sum));
        }
        for column in &selection.avg {
            result.avgs.insert(column.name(), self.acc(*column).and_then(ColumnAcc::avg));
        }
        for column in &selection.min {
            let v = self.acc(*column).and_then(|a| a.min.clone());
            result.mins.insert(column.name(), v.unwrap_or(Value::Null));
        }
        for column in &selection.max {
            let v = self.acc(*column).and_then(|a| a.max.clone());
            result.maxs.insert(column.name(), v.unwrap_or(Value::Null));
        }
        result
    }
}

// =============================================================================
// Results
// =============================================================================

/// Output of `aggregate`, and the aggregate part of each [`GroupRow`].
///
/// Maps are keyed by column name. `sums`/`avgs` are `None` when every value
/// was NULL or no row matched; `mins`/`maxs` are `Value::Null` then.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregateResult {
    pub count_all: Option<i64>,
    pub counts: BTreeMap<&'static str, i64>,
    pub sums: BTreeMap<&'static str, Option<Decimal>>,
    pub avgs: BTreeMap<&'static str, Option<Decimal>>,
    pub mins: BTreeMap<&'static str, Value>,
    pub maxs: BTreeMap<&'static str, Value>,
}

impl AggregateResult {
    pub fn count<C: Column>(&self, column: C) -> Option<i64> {
        self.counts.get(column.name()).copied()
    }

    pub fn sum<C: Column>(&self, column: C) -> Option<Decimal> {
        self.sums.get(column.name()).copied().flatten()
    }

    pub fn avg<C: Column>(&self, column: C) -> Option<Decimal> {
        self.avgs.get(column.name()).copied().flatten()
    }

    pub fn min<C: Column>(&self, column: C) -> Option<&Value> {
        self.mins.get(column.name())
    }

    pub fn max<C: Column>(&self, column: C) -> Option<&Value> {
        self.maxs.get(column.name())
    }
}

/// One group of a `group_by`.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupRow {
    /// Values of the `by` columns, keyed by column name.
    pub key: BTreeMap<&'static str, Value>,
    pub aggregates: AggregateResult,
}

impl GroupRow {
    pub fn get<C: Column>(&self, column: C) -> Option<&Value> {
        self.key.get(column.name())
    }
}

// =============================================================================
// Aggregate
// =============================================================================

/// Arguments of `aggregate`.
///
/// ## Example
/// ```rust,ignore
/// let totals = db.sales().aggregate(
///     Aggregate::new()
///         .filter(SaleColumn::BoutiqueId.equals(&boutique_id))
///         .count_all()
///         .sum(SaleColumn::Total)
///         .max(SaleColumn::CreatedAt),
/// ).await?;
/// let revenue = totals.sum(SaleColumn::Total).unwrap_or_default();
/// ```
#[derive(Debug, Clone)]
pub struct Aggregate<C> {
    rows: FindMany<C>,
    selection: Selection<C>,
}

impl<C> Default for Aggregate<C> {
    fn default() -> Self {
        Aggregate {
            rows: FindMany::default(),
            selection: Selection::default(),
        }
    }
}

impl<C: Column> Aggregate<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: Filter<C>) -> Self {
        self.rows = self.rows.filter(filter);
        self
    }

    /// Orders rows before `take`/`skip` select the window to aggregate.
    pub fn order_by(mut self, column: C, direction: Direction) -> Self {
        self.rows = self.rows.order_by(column, direction);
        self
    }

    pub fn take(mut self, n: i64) -> Self {
        self.rows = self.rows.take(n);
        self
    }

    pub fn skip(mut self, n: i64) -> Self {
        self.rows = self.rows.skip(n);
        self
    }

    /// `_count: { _all: true }`.
    pub fn count_all(mut self) -> Self {
        self.selection.count_all = true;
        self
    }

    /// Non-null values of `column`.
    pub fn count(mut self, column: C) -> Self {
        self.selection.add(AggFn::Count, column);
        self
    }

    pub fn sum(mut self, column: C) -> Self {
        self.selection.add(AggFn::Sum, column);
        self
    }

    pub fn avg(mut self, column: C) -> Self {
        self.selection.add(AggFn::Avg, column);
        self
    }

    pub fn min(mut self, column: C) -> Self {
        self.selection.add(AggFn::Min, column);
        self
    }

    pub fn max(mut self, column: C) -> Self {
        self.selection.add(AggFn::Max, column);
        self
    }

    fn fetched(&self) -> Vec<C> {
        dedup(self.selection.columns())
    }

    /// One-row statement; with `take`/`skip` the window is selected first.
    pub(crate) fn build(&self) -> DbResult<QueryBuilder<'static, Sqlite>> {
        self.rows.check()?;
        self.selection.check()?;

        let mut qb = QueryBuilder::new("SELECT ");
        push_aggregates(&mut qb, &self.fetched());
        if self.rows.take.is_some() || self.rows.skip.is_some() {
            qb.push(format!(" FROM (SELECT * FROM \"{}\"", C::TABLE));
            self.rows.push_where(&mut qb);
            self.rows.push_order_and_limit(&mut qb);
            qb.push(format!(") AS \"{}\"", C::TABLE));
        } else {
            qb.push(format!(" FROM \"{}\"", C::TABLE));
            self.rows.push_where(&mut qb);
        }
        Ok(qb)
    }

    pub(crate) fn collect(&self, row: &SqliteRow) -> DbResult<AggregateResult> {
        Ok(GroupAcc::read(row, &self.fetched())?.finish(&self.selection))
    }
}

// =============================================================================
// Group By
// =============================================================================

/// Condition on a group's aggregate, applied after grouping.
#[derive(Debug, Clone, Copy)]
pub struct Having<C> {
    func: AggFn,
    column: Option<C>,
    op: CmpOp,
    value: Decimal,
}

impl<C: Column> Having<C> {
    /// Number of rows in the group.
    pub fn count_all(op: CmpOp, value: impl Into<Decimal>) -> Self {
        Having {
            func: AggFn::Count,
            column: None,
            op,
            value: value.into(),
        }
    }

    /// `func(column) op value`.
    pub fn new(func: AggFn, column: C, op: CmpOp, value: impl Into<Decimal>) -> Self {
        Having {
            func,
            column: Some(column),
            op,
            value: value.into(),
        }
    }

    fn check(&self) -> DbResult<()> {
        match (self.func, self.column) {
            (AggFn::Count, _) => Ok(()),
            (_, Some(column)) if column.kind().is_numeric() => Ok(()),
            (_, Some(column)) => Err(DbError::InvalidArgument(format!(
                "having on {}.{} requires a numeric column",
                C::TABLE,
                column.name()
            ))),
            (_, None) => Err(DbError::InvalidArgument(
                "having needs a column for this aggregate".to_string(),
            )),
        }
    }

    fn holds(&self, group: &GroupAcc<C>) -> bool {
        let actual = match (self.func, self.column) {
            (AggFn::Count, None) => Some(Decimal::from(group.rows)),
            (_, None) => None,
            (func, Some(column)) => group.acc(column).and_then(|acc| match func {
                AggFn::Count => Some(Decimal::from(acc.count)),
                AggFn::Sum => acc.sum(),
                AggFn::Avg => acc.avg(),
                AggFn::Min => acc.min.as_ref().and_then(Value::as_decimal),
                AggFn::Max => acc.max.as_ref().and_then(Value::as_decimal),
            }),
        };
        actual.map_or(false, |a| self.op.holds(a.cmp(&self.value)))
    }
}

/// Arguments of `group_by`.
///
/// ## Example
/// ```rust,ignore
/// let per_boutique = db.sales().group_by(
///     GroupBy::new([SaleColumn::BoutiqueId])
///         .count_all()
///         .sum(SaleColumn::Total)
///         .having(Having::new(AggFn::Sum, SaleColumn::Total, CmpOp::Gt, 100_000))
///         .order_by(SaleColumn::BoutiqueId, Direction::Asc),
/// ).await?;
/// ```
#[derive(Debug, Clone)]
pub struct GroupBy<C> {
    by: Vec<C>,
    filter: Option<Filter<C>>,
    selection: Selection<C>,
    having: Vec<Having<C>>,
    order: Vec<(C, Direction)>,
    take: Option<i64>,
    skip: Option<i64>,
}

impl<C: Column> GroupBy<C> {
    pub fn new(by: impl IntoIterator<Item = C>) -> Self {
        GroupBy {
            by: dedup(by),
            filter: None,
            selection: Selection::default(),
            having: Vec::new(),
            order: Vec::new(),
            take: None,
            skip: None,
        }
    }

    pub fn filter(mut self, filter: Filter<C>) -> Self {
        self.filter = Some(match self.filter.take() {
            Some(existing) => existing.and(filter),
            None => filter,
        });
        self
    }

    pub fn having(mut self, having: Having<C>) -> Self {
        self.having.push(having);
        self
    }

    /// Orders groups; `column` must be one of the `by` columns.
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

    pub fn count_all(mut self) -> Self {
        self.selection.count_all = true;
        self
    }

    pub fn count(mut self, column: C) -> Self {
        self.selection.add(AggFn::Count, column);
        self
    }

    pub fn sum(mut self, column: C) -> Self {
        self.selection.add(AggFn::Sum, column);
        self
    }

    pub fn avg(mut self, column: C) -> Self {
        self.selection.add(AggFn::Avg, column);
        self
    }

    pub fn min(mut self, column: C) -> Self {
        self.selection.add(AggFn::Min, column);
        self
    }

    pub fn max(mut self, column: C) -> Self {
        self.selection.add(AggFn::Max, column);
        self
    }

    /// Columns accumulated per group: selected aggregates plus having targets.
    fn accumulated(&self) -> Vec<C> {
        dedup(
            self.selection
                .columns()
                .chain(self.having.iter().filter_map(|h| h.column)),
        )
    }

    fn check(&self) -> DbResult<()> {
        if self.by.is_empty() {
            return Err(DbError::InvalidArgument(
                "group_by needs at least one column".to_string(),
            ));
        }
        if let Some((column, _)) = self.order.iter().find(|(c, _)| !self.by.contains(c)) {
            return Err(DbError::InvalidArgument(format!(
                "cannot order groups by {} which is not grouped",
                column.name()
            )));
        }
        if matches!(self.take, Some(n) if n < 0) || matches!(self.skip, Some(n) if n < 0) {
            return Err(DbError::InvalidArgument(
                "take and skip must not be negative".to_string(),
            ));
        }
        self.selection.check()?;
        self.having.iter().try_for_each(Having::check)
    }

    pub(crate) fn build(&self) -> DbResult<QueryBuilder<'static, Sqlite>> {
        self.check()?;

        let mut qb = QueryBuilder::new("SELECT ");
        for column in &self.by {
            qb.push(format!("{} AS {}, ", column.qualified(), column.quoted()));
        }
        push_aggregates(&mut qb, &self.accumulated());
        qb.push(format!(" FROM \"{}\"", C::TABLE));
        push_where(&mut qb, self.filter.as_ref());
        for (i, column) in self.by.iter().enumerate() {
            qb.push(if i == 0 { " GROUP BY " } else { ", " });
            qb.push(column.qualified());
        }
        let order: Vec<(C, Direction)> = self.by.iter().map(|c| (*c, Direction::Asc)).collect();
        push_order(&mut qb, &order);
        Ok(qb)
    }

    /// Merges SQL groups with equal keys, then applies having, order and
    /// skip/take. Decimal key values are returned normalised (`1.00` -> `1`).
    pub(crate) fn collect(&self, rows: &[SqliteRow]) -> DbResult<Vec<GroupRow>> {
        let accumulated = self.accumulated();
        let mut groups: Vec<(Vec<Value>, GroupAcc<C>)> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for row in rows {
            let key = self
                .by
                .iter()
                .map(|c| {
                    Value::decode(row, c.name(), c.kind()).map(|v| match v {
                        Value::Decimal(d) => Value::Decimal(d.normalize()),
                        other => other,
                    })
                })
                .collect::<DbResult<Vec<Value>>>()?;
            let acc = GroupAcc::read(row, &accumulated)?;

            let identity = group_identity(&key);
            match index.get(&identity) {
                Some(&slot) => groups[slot].1.merge(acc)?,
                None => {
                    index.insert(identity, groups.len());
                    groups.push((key, acc));
                }
            }
        }

        let mut out: Vec<GroupRow> = groups
            .into_iter()
            .filter(|(_, acc)| self.having.iter().all(|h| h.holds(acc)))
            .map(|(key, acc)| GroupRow {
                key: self.by.iter().map(|c| c.name()).zip(key).collect(),
                aggregates: acc.finish(&self.selection),
            })
            .collect();

        if !self.order.is_empty() {
            out.sort_by(|a, b| {
                for (column, direction) in &self.order {
                    let (x, y) = (a.get(*column), b.get(*column));
                    let ord = match (x, y) {
                        (Some(x), Some(y)) => x.compare(y).unwrap_or(Ordering::Equal),
                        _ => Ordering::Equal,
                    };
                    let ord = match direction {
                        Direction::Asc => ord,
                        Direction::Desc => ord.reverse(),
                    };
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                Ordering::Equal
            });
        }

        let skip = self.skip.unwrap_or(0) as usize;
        let take = self.take.map_or(usize::MAX, |n| n as usize);
        Ok(out.into_iter().skip(skip).take(take).collect())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::test_support::ItemColumn;
    use crate::query::ColumnExt;

    #[test]
    fn test_aggregate_sql_pushes_work_to_sqlite() {
        let args = Aggregate::new()
            .filter(ItemColumn::Active.equals(true))
            .count_all()
            .sum(ItemColumn::Price)
            .max(ItemColumn::Price)
            .sum(ItemColumn::Qty)
            .count(ItemColumn::Note);
        let qb = args.build().unwrap();
        assert_eq!(
            qb.sql(),
            "SELECT COUNT(*) AS \"_rows\", \
             COUNT(\"Item\".\"note\") AS \"n.note\", MIN(\"Item\".\"note\") AS \"lo.note\", \
             MAX(\"Item\".\"note\") AS \"hi.note\", \
             json_group_array(\"Item\".\"price\") AS \"v.price\", \
             COUNT(\"Item\".\"qty\") AS \"n.qty\", SUM(\"Item\".\"qty\") AS \"s.qty\", \
             MIN(\"Item\".\"qty\") AS \"lo.qty\", MAX(\"Item\".\"qty\") AS \"hi.qty\" \
             FROM \"Item\" WHERE \"Item\".\"active\" = ?"
        );
    }

    #[test]
    fn test_count_only_selects_row_count() {
        let qb = Aggregate::<ItemColumn>::new().count_all().build().unwrap();
        assert_eq!(qb.sql(), "SELECT COUNT(*) AS \"_rows\" FROM \"Item\"");
    }

    #[test]
    fn test_aggregate_window_is_a_subquery() {
        let qb = Aggregate::<ItemColumn>::new()
            .count_all()
            .order_by(ItemColumn::Qty, Direction::Desc)
            .take(3)
            .build()
            .unwrap();
        assert_eq!(
            qb.sql(),
            "SELECT COUNT(*) AS \"_rows\" FROM (SELECT * FROM \"Item\" \
             ORDER BY \"Item\".\"qty\" DESC LIMIT ?) AS \"Item\""
        );
    }

    #[test]
    fn test_sum_of_text_rejected() {
        let args = Aggregate::new().sum(ItemColumn::Name);
        assert!(matches!(args.build(), Err(DbError::InvalidArgument(_))));
    }

    #[test]
    fn test_group_by_validation() {
        let args = GroupBy::new(Vec::<ItemColumn>::new());
        assert!(args.build().is_err());

        let args = GroupBy::new([ItemColumn::Active]).order_by(ItemColumn::Name, Direction::Asc);
        assert!(matches!(args.build(), Err(DbError::InvalidArgument(_))));

        let args = GroupBy::new([ItemColumn::Active])
            .having(Having::new(AggFn::Sum, ItemColumn::Name, CmpOp::Gt, 1));
        assert!(args.build().is_err());
    }

    #[test]
    fn test_group_by_sql() {
        let args = GroupBy::new([ItemColumn::Active])
            .sum(ItemColumn::Qty)
            .having(Having::new(AggFn::Max, ItemColumn::Price, CmpOp::Gt, 10));
        let qb = args.build().unwrap();
        assert_eq!(
            qb.sql(),
            "SELECT \"Item\".\"active\" AS \"active\", COUNT(*) AS \"_rows\", \
             COUNT(\"Item\".\"qty\") AS \"n.qty\", SUM(\"Item\".\"qty\") AS \"s.qty\", \
             MIN(\"Item\".\"qty\") AS \"lo.qty\", MAX(\"Item\".\"qty\") AS \"hi.qty\", \
             json_group_array(\"Item\".\"price\") AS \"v.price\" FROM \"Item\" \
             GROUP BY \"Item\".\"active\" ORDER BY \"Item\".\"active\" ASC"
        );
    }

    #[test]
    fn test_equal_decimals_share_group_identity() {
        let a = [Value::Decimal(Decimal::new(10, 1)), Value::from("x")];
        let b = [Value::Decimal(Decimal::new(100, 2)), Value::from("x")];
        let c = [Value::Decimal(Decimal::new(11, 1)), Value::from("x")];
        assert_eq!(group_identity(&a), group_identity(&b));
        assert_ne!(group_identity(&a), group_identity(&c));
    }

    #[test]
    fn test_column_acc() {
        let mut acc = ColumnAcc::default();
        acc.fold(ItemColumn::Price, Value::Decimal(Decimal::new(10, 1))).unwrap();
        acc.fold(ItemColumn::Price, Value::Null).unwrap();
        acc.fold(ItemColumn::Price, Value::Decimal(Decimal::new(25, 1))).unwrap();

        assert_eq!(acc.count, 2);
        assert_eq!(acc.sum(), Some(Decimal::new(35, 1)));
        assert_eq!(acc.avg(), Some(Decimal::new(175, 2)));
        assert_eq!(acc.min, Some(Value::Decimal(Decimal::new(10, 1))));
        assert_eq!(acc.max, Some(Value::Decimal(Decimal::new(25, 1))));
        assert_eq!(ColumnAcc::default().sum(), None);

        let mut other = ColumnAcc::default();
        other.fold(ItemColumn::Price, Value::Decimal(Decimal::new(5, 1))).unwrap();
        acc.merge(ItemColumn::Price, other).unwrap();
        assert_eq!(acc.count, 3);
        assert_eq!(acc.sum(), Some(Decimal::new(40, 1)));
        assert_eq!(acc.min, Some(Value::Decimal(Decimal::new(5, 1))));
    }

    #[test]
    fn test_sum_overflow_is_an_error() {
        let mut acc = ColumnAcc::default();
        acc.fold(ItemColumn::Price, Value::Decimal(Decimal::MAX)).unwrap();
        assert!(matches!(
            acc.fold(ItemColumn::Price, Value::Decimal(Decimal::MAX)),
            Err(DbError::InvalidArgument(_))
        ));
    }
}
