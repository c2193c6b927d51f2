/// Result normalization
///
/// The two engines disagree about the shape of what they return: SQLite
/// hands back natively typed values on a callback-style API, while the
/// pooled PostgreSQL driver can surface aggregates with a different width
/// (and, in the original system this replaces, as strings). This module
/// coerces every engine row into one canonical shape, an ordered JSON
/// object, before it reaches any caller, so the rest of the codebase never
/// branches on where a row came from.
///
/// Coercion fails closed: a count that cannot be parsed to an integer is
/// treated as zero and logged as a warning rather than propagating a type
/// error to the HTTP layer.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use sqlx::postgres::PgRow;
use sqlx::sqlite::SqliteRow;
use sqlx::{Column, Row as SqlxRow, TypeInfo};
use tracing::warn;

use crate::db::error::DbError;

/// Canonical row shape shared by both dialects
///
/// Column order is preserved. Values are JSON-typed: integers arrive as
/// numbers regardless of engine width, text as strings, SQL NULL as null.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Row(Map<String, Value>);

impl Row {
    /// Normalizes a PostgreSQL row
    pub fn from_pg(row: &PgRow) -> Result<Self, DbError> {
        let mut map = Map::with_capacity(row.columns().len());

        for (i, col) in row.columns().iter().enumerate() {
            let value = match col.type_info().name() {
                "INT2" => Value::from(decode::<i16, _>(row, i)?.map(i64::from)),
                "INT4" => Value::from(decode::<i32, _>(row, i)?.map(i64::from)),
                "INT8" => Value::from(decode::<i64, _>(row, i)?),
                "FLOAT4" => Value::from(decode::<f32, _>(row, i)?.map(f64::from)),
                "FLOAT8" => Value::from(decode::<f64, _>(row, i)?),
                "BOOL" => Value::from(decode::<bool, _>(row, i)?),
                "TEXT" | "VARCHAR" | "BPCHAR" | "CHAR" | "NAME" => {
                    Value::from(decode::<String, _>(row, i)?)
                }
                other => match row.try_get::<Option<String>, _>(i) {
                    Ok(text) => Value::from(text),
                    Err(_) => {
                        warn!(column = col.name(), sql_type = other, "undecodable column, treating as null");
                        Value::Null
                    }
                },
            };
            map.insert(col.name().to_string(), value);
        }

        Ok(Row(map))
    }

    /// Normalizes a SQLite row
    ///
    /// SQLite's type affinity means an expression column can carry any
    /// storage class; unknown types fall through integer, real, and text
    /// decoding in that order.
    pub fn from_sqlite(row: &SqliteRow) -> Result<Self, DbError> {
        let mut map = Map::with_capacity(row.columns().len());

        for (i, col) in row.columns().iter().enumerate() {
            let value = match col.type_info().name() {
                "INTEGER" => Value::from(decode::<i64, _>(row, i)?),
                "REAL" => Value::from(decode::<f64, _>(row, i)?),
                "TEXT" | "DATETIME" | "DATE" => Value::from(decode::<String, _>(row, i)?),
                "BOOLEAN" => Value::from(decode::<bool, _>(row, i)?),
                "NULL" => Value::Null,
                other => {
                    if let Ok(v) = row.try_get::<Option<i64>, _>(i) {
                        Value::from(v)
                    } else if let Ok(v) = row.try_get::<Option<f64>, _>(i) {
                        Value::from(v)
                    } else if let Ok(v) = row.try_get::<Option<String>, _>(i) {
                        Value::from(v)
                    } else {
                        warn!(column = col.name(), sql_type = other, "undecodable column, treating as null");
                        Value::Null
                    }
                }
            };
            map.insert(col.name().to_string(), value);
        }

        Ok(Row(map))
    }

    /// Returns a column value, if present
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Returns a column as an integer, accepting string-typed numbers
    pub fn get_i64(&self, name: &str) -> Option<i64> {
        match self.0.get(name)? {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Returns a column as a string slice
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(Value::as_str)
    }

    /// The generated `id` column, when the statement returned one
    pub fn id(&self) -> Option<i64> {
        self.get_i64("id")
    }

    /// Coerces an aggregate count column to an integer, failing closed
    ///
    /// Native integers pass through; string-typed counts are parsed. A value
    /// that cannot be coerced becomes zero with a logged warning; callers
    /// never see a type error for a count.
    pub fn count(&self, name: &str) -> i64 {
        match self.0.get(name) {
            Some(Value::Number(n)) => n.as_i64().unwrap_or_else(|| {
                warn!(column = name, value = %n, "non-integral count, coercing to 0");
                0
            }),
            Some(Value::String(s)) => s.trim().parse().unwrap_or_else(|_| {
                warn!(column = name, value = %s, "unparseable count, coercing to 0");
                0
            }),
            Some(Value::Null) | None => 0,
            Some(other) => {
                warn!(column = name, value = %other, "unexpected count shape, coercing to 0");
                0
            }
        }
    }

    /// Consumes the row into its JSON object form
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    /// Deserializes the row into a typed model
    pub fn deserialize<T: DeserializeOwned>(self) -> Result<T, DbError> {
        serde_json::from_value(Value::Object(self.0))
            .map_err(|e| DbError::Execution(format!("row shape mismatch: {e}")))
    }
}

fn decode<'r, T, R>(row: &'r R, index: usize) -> Result<Option<T>, DbError>
where
    R: SqlxRow,
    Option<T>: sqlx::Decode<'r, R::Database> + sqlx::Type<R::Database>,
    usize: sqlx::ColumnIndex<R>,
{
    row.try_get::<Option<T>, _>(index)
        .map_err(|e| DbError::Execution(format!("column decode failed: {e}")))
}
