//! Dynamically typed SQL parameter / result value.

use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{QueryBuilder, Row, Sqlite};
use std::cmp::Ordering;
use std::fmt;

use vitrine_core::{Money, Role, TaxRate};

use super::ColumnKind;
use crate::error::{DbError, DbResult};

/// A value bound into, or read out of, a statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Real(f64),
    Text(String),
    /// Bound as its exact string.
    Decimal(Decimal),
    /// Bound as millisecond UTC text ending in `Z`.
    Timestamp(DateTime<Utc>),
    /// Bound as serialized JSON text.
    Json(serde_json::Value),
}

impl Value {
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Numeric view used by `_sum` / `_avg` and `having`.
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Value::Int(i) => Some(Decimal::from(*i)),
            Value::Decimal(d) => Some(*d),
            Value::Real(f) => Decimal::from_f64(*f),
            Value::Bool(b) => Some(Decimal::from(*b as i64)),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Bool(b) => Some(*b as i64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Orders two values of compatible variants; `None` for mixed kinds.
    ///
    /// `Null` sorts before everything, as in SQLite.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Null, Value::Null) => Some(Ordering::Equal),
            (Value::Null, _) => Some(Ordering::Less),
            (_, Value::Null) => Some(Ordering::Greater),
            (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
            (Value::Timestamp(a), Value::Timestamp(b)) => Some(a.cmp(b)),
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            (Value::Real(a), Value::Real(b)) => a.partial_cmp(b),
            (a, b) => match (a.as_decimal(), b.as_decimal()) {
                (Some(x), Some(y)) => Some(x.cmp(&y)),
                _ => None,
            },
        }
    }

    /// Reads column `name` of `row` as a value of `kind`.
    pub fn decode(row: &SqliteRow, name: &str, kind: ColumnKind) -> DbResult<Value> {
        let value = match kind {
            ColumnKind::Text => row
                .try_get::<Option<String>, _>(name)?
                .map_or(Value::Null, Value::Text),
            ColumnKind::Integer => row
                .try_get::<Option<i64>, _>(name)?
                .map_or(Value::Null, Value::Int),
            ColumnKind::Boolean => row
                .try_get::<Option<bool>, _>(name)?
                .map_or(Value::Null, Value::Bool),
            ColumnKind::Timestamp => row
                .try_get::<Option<DateTime<Utc>>, _>(name)?
                .map_or(Value::Null, Value::Timestamp),
            ColumnKind::Decimal => match row.try_get::<Option<Money>, _>(name)? {
                Some(money) => Value::Decimal(money.amount()),
                None => Value::Null,
            },
            ColumnKind::Json => match row.try_get::<Option<String>, _>(name)? {
                Some(text) => Value::Json(serde_json::from_str(&text).map_err(|e| {
                    DbError::QueryFailed(format!("invalid JSON in column {}: {}", name, e))
                })?),
                None => Value::Null,
            },
        };
        Ok(value)
    }

    /// Converts to JSON for raw query results and error messages.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::from(*i),
            Value::Real(f) => serde_json::Value::from(*f),
            Value::Text(s) => serde_json::Value::String(s.clone()),
            Value::Decimal(d) => serde_json::Value::String(d.to_string()),
            Value::Timestamp(t) => serde_json::Value::String(timestamp_text(t)),
            Value::Json(v) => v.clone(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Real(r) => write!(f, "{}", r),
            Value::Text(s) => f.write_str(s),
            Value::Decimal(d) => write!(f, "{}", d),
            Value::Timestamp(t) => f.write_str(&timestamp_text(t)),
            Value::Json(v) => write!(f, "{}", v),
        }
    }
}

// =============================================================================
// Binding
// =============================================================================

/// `2024-05-01T09:30:00.125Z`, the text the schema's
/// `strftime('%Y-%m-%dT%H:%M:%fZ', 'now')` defaults produce.
///
/// Stored timestamps compare as text, so every writer uses this one layout.
pub(crate) fn timestamp_text(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Appends `value` to `qb` as a bound parameter.
pub(crate) fn push_value(qb: &mut QueryBuilder<'_, Sqlite>, value: Value) {
    match value {
        Value::Null => {
            qb.push_bind(None::<String>);
        }
        Value::Bool(b) => {
            qb.push_bind(b);
        }
        Value::Int(i) => {
            qb.push_bind(i);
        }
        Value::Real(f) => {
            qb.push_bind(f);
        }
        Value::Text(s) => {
            qb.push_bind(s);
        }
        Value::Decimal(d) => {
            qb.push_bind(d.to_string());
        }
        Value::Timestamp(t) => {
            qb.push_bind(timestamp_text(&t));
        }
        Value::Json(v) => {
            qb.push_bind(v.to_string());
        }
    }
}

/// Binds `value` to the next `?` of a raw query.
pub(crate) fn bind_value<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    value: Value,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    match value {
        Value::Null => query.bind(None::<String>),
        Value::Bool(b) => query.bind(b),
        Value::Int(i) => query.bind(i),
        Value::Real(f) => query.bind(f),
        Value::Text(s) => query.bind(s),
        Value::Decimal(d) => query.bind(d.to_string()),
        Value::Timestamp(t) => query.bind(timestamp_text(&t)),
        Value::Json(v) => query.bind(v.to_string()),
    }
}

// =============================================================================
// Conversions
// =============================================================================

macro_rules! value_from {
    ($($ty:ty => |$v:ident| $body:expr),+ $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from($v: $ty) -> Self {
                    $body
                }
            }
        )+
    };
}

value_from! {
    bool => |v| Value::Bool(v),
    i32 => |v| Value::Int(v as i64),
    i64 => |v| Value::Int(v),
    u32 => |v| Value::Int(v as i64),
    f64 => |v| Value::Real(v),
    String => |v| Value::Text(v),
    &str => |v| Value::Text(v.to_string()),
    &String => |v| Value::Text(v.clone()),
    Decimal => |v| Value::Decimal(v),
    Money => |v| Value::Decimal(v.amount()),
    TaxRate => |v| Value::Decimal(v.percent()),
    DateTime<Utc> => |v| Value::Timestamp(v),
    serde_json::Value => |v| Value::Json(v),
    Role => |v| Value::Text(v.as_str().to_string()),
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_conversions() {
        assert_eq!(Value::from(3_i64), Value::Int(3));
        assert_eq!(Value::from("a"), Value::Text("a".to_string()));
        assert_eq!(Value::from(None::<String>), Value::Null);
        assert_eq!(Value::from(Role::Dg), Value::Text("dg".to_string()));
        assert_eq!(
            Value::from(Money::new(dec!(12.50))),
            Value::Decimal(dec!(12.50))
        );
    }

    #[test]
    fn test_compare_mixed_numeric() {
        let a = Value::Int(10);
        let b = Value::Decimal(dec!(9.99));
        assert_eq!(a.compare(&b), Some(Ordering::Greater));
        assert_eq!(Value::Null.compare(&a), Some(Ordering::Less));
        assert_eq!(Value::Text("x".to_string()).compare(&a), None);
    }

    #[test]
    fn test_display_and_json() {
        assert_eq!(Value::Decimal(dec!(1.10)).to_string(), "1.10");
        assert_eq!(Value::Decimal(dec!(1.10)).to_json(), serde_json::json!("1.10"));
        assert_eq!(Value::Null.to_json(), serde_json::Value::Null);
    }

    #[test]
    fn test_timestamp_text_matches_sql_default_layout() {
        let t = DateTime::parse_from_rfc3339("2024-05-01T09:30:00.123456789+00:00")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(timestamp_text(&t), "2024-05-01T09:30:00.123Z");

        let whole = DateTime::parse_from_rfc3339("2024-05-01T09:30:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(timestamp_text(&whole), "2024-05-01T09:30:00.000Z");
        assert_eq!(Value::Timestamp(whole).to_string(), "2024-05-01T09:30:00.000Z");
    }
}
