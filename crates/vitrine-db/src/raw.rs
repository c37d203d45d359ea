//! Raw SQL passthrough.
//!
//! Statements run as written with `?` placeholders bound from [`Value`]s.
//! Result rows come back as JSON objects keyed by column name, typed by
//! each value's SQLite storage class:
//!
//! ```text
//! INTEGER → number    REAL → number    TEXT → string
//! NULL    → null      BLOB → hex string
//! ```
//!
//! Decimal columns are TEXT, so they come back as exact strings.

use sqlx::sqlite::SqliteRow;
use sqlx::{Column as _, Executor, Row, Sqlite, TypeInfo, ValueRef};
use tracing::debug;

use crate::error::DbResult;
use crate::query::value::bind_value;
use crate::query::Value;

/// One result row of `query_raw`.
pub type JsonRow = serde_json::Map<String, serde_json::Value>;

pub(crate) async fn query_raw<'c, E>(
    executor: E,
    sql: &str,
    params: Vec<Value>,
) -> DbResult<Vec<JsonRow>>
where
    E: Executor<'c, Database = Sqlite>,
{
    debug!(sql, params = params.len(), "query_raw");

    let mut query = sqlx::query(sql);
    for param in params {
        query = bind_value(query, param);
    }
    let rows = query.fetch_all(executor).await?;
    rows.iter().map(row_to_json).collect()
}

pub(crate) async fn execute_raw<'c, E>(executor: E, sql: &str, params: Vec<Value>) -> DbResult<u64>
where
    E: Executor<'c, Database = Sqlite>,
{
    debug!(sql, params = params.len(), "execute_raw");

    let mut query = sqlx::query(sql);
    for param in params {
        query = bind_value(query, param);
    }
    Ok(query.execute(executor).await?.rows_affected())
}

fn row_to_json(row: &SqliteRow) -> DbResult<JsonRow> {
    let mut out = JsonRow::new();
    for (i, column) in row.columns().iter().enumerate() {
        let storage = {
            let raw = row.try_get_raw(i)?;
            if raw.is_null() {
                None
            } else {
                Some(raw.type_info().name().to_string())
            }
        };

        let value = match storage.as_deref() {
            None | Some("NULL") => serde_json::Value::Null,
            Some("INTEGER") | Some("BOOLEAN") => {
                serde_json::Value::from(row.try_get_unchecked::<i64, _>(i)?)
            }
            Some("REAL") | Some("NUMERIC") => {
                serde_json::Value::from(row.try_get_unchecked::<f64, _>(i)?)
            }
            Some("BLOB") => {
                let bytes = row.try_get_unchecked::<Vec<u8>, _>(i)?;
                serde_json::Value::String(bytes.iter().map(|b| format!("{:02x}", b)).collect())
            }
            Some(_) => serde_json::Value::String(row.try_get_unchecked::<String, _>(i)?),
        };
        out.insert(column.name().to_string(), value);
    }
    Ok(out)
}
