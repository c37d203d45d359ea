//! # Filters
//!
//! `WHERE` clauses over the columns of one table, including relation filters
//! that reach into a related table through `EXISTS`.
//!
//! ## Operators
//! ```text
//! ┌──────────────────────┬──────────────────────────────────────────────────┐
//! │ ColumnExt method     │ SQL                                              │
//! ├──────────────────────┼──────────────────────────────────────────────────┤
//! │ equals(v)            │ col = ?          (col IS NULL when v is Null)    │
//! │ not_equals(v)        │ col <> ?         (col IS NOT NULL when v is Null)│
//! │ lt / lte / gt / gte  │ col < ? ...                                      │
//! │ in_list / not_in     │ col IN (?, ?)    (empty list matches nothing)    │
//! │ contains             │ col LIKE '%' || v || '%' ESCAPE '\'              │
//! │ starts_with          │ col LIKE v || '%'                                │
//! │ ends_with            │ col LIKE '%' || v                                │
//! │ is_null / is_not_null│ col IS [NOT] NULL                                │
//! └──────────────────────┴──────────────────────────────────────────────────┘
//! Decimal columns compare through CAST(... AS REAL): '9.5' < '10' numerically.
//! ```
//!
//! ## Relations
//! ```text
//! BOUTIQUE_STOCKS.some(StockColumn::Quantity.gt(0))
//!   → EXISTS (SELECT 1 FROM "Stock"
//!             WHERE "Stock"."boutiqueId" = "Boutique"."id" AND (...))
//! none  → NOT EXISTS (same)
//! every → NOT EXISTS (... AND NOT (...))
//! ```

use sqlx::{QueryBuilder, Sqlite};
use std::marker::PhantomData;

use super::value::{push_value, Value};
use super::{Column, ColumnKind};

// =============================================================================
// Condition Tree
// =============================================================================

/// Comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
}

impl CmpOp {
    fn sql(&self) -> &'static str {
        match self {
            CmpOp::Eq => " = ",
            CmpOp::Ne => " <> ",
            CmpOp::Lt => " < ",
            CmpOp::Lte => " <= ",
            CmpOp::Gt => " > ",
            CmpOp::Gte => " >= ",
        }
    }

    /// Evaluates the operator on an already computed ordering.
    pub fn holds(&self, ordering: std::cmp::Ordering) -> bool {
        use std::cmp::Ordering::*;
        match self {
            CmpOp::Eq => ordering == Equal,
            CmpOp::Ne => ordering != Equal,
            CmpOp::Lt => ordering == Less,
            CmpOp::Lte => ordering != Greater,
            CmpOp::Gt => ordering == Greater,
            CmpOp::Gte => ordering != Less,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct ColumnRef {
    table: &'static str,
    name: &'static str,
    kind: ColumnKind,
}

impl ColumnRef {
    fn of<C: Column>(column: C) -> Self {
        ColumnRef {
            table: C::TABLE,
            name: column.name(),
            kind: column.kind(),
        }
    }

    fn push(&self, qb: &mut QueryBuilder<'_, Sqlite>) {
        if self.kind == ColumnKind::Decimal {
            qb.push(format!("CAST(\"{}\".\"{}\" AS REAL)", self.table, self.name));
        } else {
            qb.push(format!("\"{}\".\"{}\"", self.table, self.name));
        }
    }

    fn push_value(&self, qb: &mut QueryBuilder<'_, Sqlite>, value: Value) {
        if self.kind == ColumnKind::Decimal {
            qb.push("CAST(");
            push_value(qb, value);
            qb.push(" AS REAL)");
        } else {
            push_value(qb, value);
        }
    }
}

#[derive(Debug, Clone)]
enum Condition {
    Compare {
        column: ColumnRef,
        op: CmpOp,
        value: Value,
    },
    InList {
        column: ColumnRef,
        negated: bool,
        values: Vec<Value>,
    },
    Like {
        column: ColumnRef,
        pattern: String,
    },
    Null {
        column: ColumnRef,
        negated: bool,
    },
    All(Vec<Condition>),
    Any(Vec<Condition>),
    Not(Box<Condition>),
    /// `[NOT] EXISTS (SELECT 1 FROM inner_table WHERE inner_key = outer_key AND inner)`.
    Exists {
        negated: bool,
        inner_table: &'static str,
        inner_key: &'static str,
        outer_table: &'static str,
        outer_key: &'static str,
        inner: Box<Condition>,
    },
}

impl Condition {
    fn render(&self, qb: &mut QueryBuilder<'_, Sqlite>) {
        match self {
            Condition::Compare { column, op, value } => match (op, value) {
                (CmpOp::Eq, Value::Null) => {
                    column.push(qb);
                    qb.push(" IS NULL");
                }
                (CmpOp::Ne, Value::Null) => {
                    column.push(qb);
                    qb.push(" IS NOT NULL");
                }
                _ => {
                    column.push(qb);
                    qb.push(op.sql());
                    column.push_value(qb, value.clone());
                }
            },

            Condition::InList {
                column,
                negated,
                values,
            } => {
                if values.is_empty() {
                    qb.push(if *negated { "1 = 1" } else { "1 = 0" });
                    return;
                }
                column.push(qb);
                qb.push(if *negated { " NOT IN (" } else { " IN (" });
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        qb.push(", ");
                    }
                    column.push_value(qb, value.clone());
                }
                qb.push(")");
            }

            Condition::Like { column, pattern } => {
                qb.push(format!("\"{}\".\"{}\" LIKE ", column.table, column.name));
                qb.push_bind(pattern.clone());
                qb.push(" ESCAPE '\\'");
            }

            Condition::Null { column, negated } => {
                qb.push(format!("\"{}\".\"{}\"", column.table, column.name));
                qb.push(if *negated { " IS NOT NULL" } else { " IS NULL" });
            }

            Condition::All(parts) => render_joined(qb, parts, " AND ", "1 = 1"),

            Condition::Any(parts) => render_joined(qb, parts, " OR ", "1 = 0"),

            Condition::Not(inner) => {
                qb.push("NOT (");
                inner.render(qb);
                qb.push(")");
            }

            Condition::Exists {
                negated,
                inner_table,
                inner_key,
                outer_table,
                outer_key,
                inner,
            } => {
                qb.push(if *negated { "NOT EXISTS (" } else { "EXISTS (" });
                qb.push(format!(
                    "SELECT 1 FROM \"{t}\" WHERE \"{t}\".\"{k}\" = \"{ot}\".\"{ok}\" AND (",
                    t = inner_table,
                    k = inner_key,
                    ot = outer_table,
                    ok = outer_key,
                ));
                inner.render(qb);
                qb.push("))");
            }
        }
    }
}

fn render_joined(
    qb: &mut QueryBuilder<'_, Sqlite>,
    parts: &[Condition],
    separator: &str,
    empty: &str,
) {
    if parts.is_empty() {
        qb.push(empty);
        return;
    }
    qb.push("(");
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            qb.push(separator);
        }
        part.render(qb);
    }
    qb.push(")");
}

/// Escapes `%`, `_` and `\` for a `LIKE ... ESCAPE '\'` pattern.
fn escape_like(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

// =============================================================================
// Filter
// =============================================================================

/// A boolean condition over the rows of the table owning `C`.
///
/// LIKE matching (`contains`, `starts_with`, `ends_with`) is case-insensitive
/// for ASCII letters, as SQLite's LIKE is.
#[derive(Debug, Clone)]
pub struct Filter<C> {
    condition: Condition,
    _column: PhantomData<fn() -> C>,
}

impl<C: Column> Filter<C> {
    fn from_condition(condition: Condition) -> Self {
        Filter {
            condition,
            _column: PhantomData,
        }
    }

    /// Matches every row.
    pub fn everything() -> Self {
        Self::from_condition(Condition::All(Vec::new()))
    }

    /// Matches rows satisfying every filter (`AND`). Empty matches everything.
    pub fn all_of(filters: impl IntoIterator<Item = Filter<C>>) -> Self {
        Self::from_condition(Condition::All(
            filters.into_iter().map(|f| f.condition).collect(),
        ))
    }

    /// Matches rows satisfying at least one filter (`OR`). Empty matches nothing.
    pub fn any_of(filters: impl IntoIterator<Item = Filter<C>>) -> Self {
        Self::from_condition(Condition::Any(
            filters.into_iter().map(|f| f.condition).collect(),
        ))
    }

    pub fn and(self, other: Filter<C>) -> Self {
        match self.condition {
            Condition::All(mut parts) => {
                parts.push(other.condition);
                Self::from_condition(Condition::All(parts))
            }
            condition => Self::from_condition(Condition::All(vec![condition, other.condition])),
        }
    }

    pub fn or(self, other: Filter<C>) -> Self {
        match self.condition {
            Condition::Any(mut parts) => {
                parts.push(other.condition);
                Self::from_condition(Condition::Any(parts))
            }
            condition => Self::from_condition(Condition::Any(vec![condition, other.condition])),
        }
    }

    /// `NOT (self)`.
    pub fn negate(self) -> Self {
        Self::from_condition(Condition::Not(Box::new(self.condition)))
    }

    /// Appends the condition to a statement under construction.
    pub(crate) fn render(&self, qb: &mut QueryBuilder<'_, Sqlite>) {
        self.condition.render(qb);
    }
}

/// Builds filters from a column.
///
/// ## Example
/// ```rust,ignore
/// use vitrine_db::query::ColumnExt;
/// use vitrine_db::schema::UserColumn;
///
/// let admins = UserColumn::Role.in_list([Role::SuperAdmin, Role::Pdg])
///     .and(UserColumn::Status.equals("active"));
/// ```
pub trait ColumnExt: Column {
    fn equals(self, value: impl Into<Value>) -> Filter<Self> {
        compare(self, CmpOp::Eq, value.into())
    }

    fn not_equals(self, value: impl Into<Value>) -> Filter<Self> {
        compare(self, CmpOp::Ne, value.into())
    }

    fn lt(self, value: impl Into<Value>) -> Filter<Self> {
        compare(self, CmpOp::Lt, value.into())
    }

    fn lte(self, value: impl Into<Value>) -> Filter<Self> {
        compare(self, CmpOp::Lte, value.into())
    }

    fn gt(self, value: impl Into<Value>) -> Filter<Self> {
        compare(self, CmpOp::Gt, value.into())
    }

    fn gte(self, value: impl Into<Value>) -> Filter<Self> {
        compare(self, CmpOp::Gte, value.into())
    }

    fn in_list<V: Into<Value>>(self, values: impl IntoIterator<Item = V>) -> Filter<Self> {
        Filter::from_condition(Condition::InList {
            column: ColumnRef::of(self),
            negated: false,
            values: values.into_iter().map(Into::into).collect(),
        })
    }

    fn not_in<V: Into<Value>>(self, values: impl IntoIterator<Item = V>) -> Filter<Self> {
        Filter::from_condition(Condition::InList {
            column: ColumnRef::of(self),
            negated: true,
            values: values.into_iter().map(Into::into).collect(),
        })
    }

    fn contains(self, needle: &str) -> Filter<Self> {
        like(self, format!("%{}%", escape_like(needle)))
    }

    fn starts_with(self, prefix: &str) -> Filter<Self> {
        like(self, format!("{}%", escape_like(prefix)))
    }

    fn ends_with(self, suffix: &str) -> Filter<Self> {
        like(self, format!("%{}", escape_like(suffix)))
    }

    fn is_null(self) -> Filter<Self> {
        Filter::from_condition(Condition::Null {
            column: ColumnRef::of(self),
            negated: false,
        })
    }

    fn is_not_null(self) -> Filter<Self> {
        Filter::from_condition(Condition::Null {
            column: ColumnRef::of(self),
            negated: true,
        })
    }
}

impl<C: Column> ColumnExt for C {}

fn compare<C: Column>(column: C, op: CmpOp, value: Value) -> Filter<C> {
    Filter::from_condition(Condition::Compare {
        column: ColumnRef::of(column),
        op,
        value,
    })
}

fn like<C: Column>(column: C, pattern: String) -> Filter<C> {
    Filter::from_condition(Condition::Like {
        column: ColumnRef::of(column),
        pattern,
    })
}

// =============================================================================
// Relation Filters
// =============================================================================

/// Primary key column name shared by every table.
const ID: &str = "id";

/// One-to-many relation from the table of `P` to the table of `C`.
#[derive(Debug)]
pub struct HasMany<P, C> {
    foreign_key: C,
    _parent: PhantomData<fn() -> P>,
}

impl<P, C: Copy> Clone for HasMany<P, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<P, C: Copy> Copy for HasMany<P, C> {}

impl<P: Column, C: Column> HasMany<P, C> {
    /// `foreign_key` is the child column holding the parent's id.
    pub const fn new(foreign_key: C) -> Self {
        HasMany {
            foreign_key,
            _parent: PhantomData,
        }
    }

    fn exists(&self, negated: bool, inner: Condition) -> Filter<P> {
        Filter::from_condition(Condition::Exists {
            negated,
            inner_table: C::TABLE,
            inner_key: self.foreign_key.name(),
            outer_table: P::TABLE,
            outer_key: ID,
            inner: Box::new(inner),
        })
    }

    /// At least one related row matches.
    pub fn some(&self, filter: Filter<C>) -> Filter<P> {
        self.exists(false, filter.condition)
    }

    /// No related row matches.
    pub fn none(&self, filter: Filter<C>) -> Filter<P> {
        self.exists(true, filter.condition)
    }

    /// Every related row matches (vacuously true without related rows).
    pub fn every(&self, filter: Filter<C>) -> Filter<P> {
        self.exists(true, Condition::Not(Box::new(filter.condition)))
    }
}

/// Many-to-one relation from the table of `C` to the table of `P`.
#[derive(Debug)]
pub struct BelongsTo<C, P> {
    foreign_key: C,
    _parent: PhantomData<fn() -> P>,
}

impl<C: Copy, P> Clone for BelongsTo<C, P> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C: Copy, P> Copy for BelongsTo<C, P> {}

impl<C: Column, P: Column> BelongsTo<C, P> {
    pub const fn new(foreign_key: C) -> Self {
        BelongsTo {
            foreign_key,
            _parent: PhantomData,
        }
    }

    fn exists(&self, negated: bool, inner: Condition) -> Filter<C> {
        Filter::from_condition(Condition::Exists {
            negated,
            inner_table: P::TABLE,
            inner_key: ID,
            outer_table: C::TABLE,
            outer_key: self.foreign_key.name(),
            inner: Box::new(inner),
        })
    }

    /// The related row exists and matches.
    pub fn is(&self, filter: Filter<P>) -> Filter<C> {
        self.exists(false, filter.condition)
    }

    /// The related row is missing or does not match.
    pub fn is_not(&self, filter: Filter<P>) -> Filter<C> {
        self.exists(true, filter.condition)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
