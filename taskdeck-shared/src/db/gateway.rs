/// Execution gateway
///
/// The single seam between the rest of the codebase and the two SQL
/// engines. Every statement in TaskDeck goes through the two uniform entry
/// points here, [`Gateway::query`] for reads and [`Gateway::execute`] for
/// writes, so dialect-conditional behavior never leaks into models or
/// routes.
///
/// # Dialect asymmetry
///
/// The write path is asymmetric by nature of the engines:
///
/// - PostgreSQL can return generated values inline. When a statement carries
///   a `RETURNING` clause, [`WriteOutcome::returned`] holds the full rows
///   and the inserted id is read from the first one.
/// - SQLite only exposes `last_insert_rowid()` and an affected-row count;
///   `returned` stays empty and callers issue a follow-up query for the row.
///
/// Callers must never assume `returned` is populated. For the common
/// insert-and-get-id case, [`Gateway::insert`] confines the asymmetry here.
///
/// # Concurrency
///
/// The pooled backend allows many in-flight statements bounded by pool
/// size. The SQLite backend is built with a single connection, so all
/// operations serialize through it. This layer adds no timeouts, no retries, and
/// no multi-statement transaction wrapper: read-modify-write sequences
/// (e.g. the status toggle) are not atomic under concurrent requests for
/// the same row. That gap is inherited deliberately and documented where it
/// occurs.

use std::time::Duration;

use sqlx::postgres::{PgArguments, PgPoolOptions};
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{PgPool, Postgres, Sqlite, SqlitePool};
use tracing::{debug, info};

use crate::db::dialect::Dialect;
use crate::db::error::DbError;
use crate::db::row::Row;

/// A positional statement parameter
///
/// Parameters are bound in order, never interpolated into SQL text.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    /// SQL NULL (bound as a nullable text value; only used on text columns)
    Null,
    Int(i64),
    Float(f64),
    Text(String),
    Bool(bool),
}

impl From<i64> for SqlParam {
    fn from(v: i64) -> Self {
        SqlParam::Int(v)
    }
}

impl From<&str> for SqlParam {
    fn from(v: &str) -> Self {
        SqlParam::Text(v.to_string())
    }
}

impl From<String> for SqlParam {
    fn from(v: String) -> Self {
        SqlParam::Text(v)
    }
}

impl From<Option<String>> for SqlParam {
    fn from(v: Option<String>) -> Self {
        match v {
            Some(s) => SqlParam::Text(s),
            None => SqlParam::Null,
        }
    }
}

/// Outcome of a write statement
#[derive(Debug, Clone)]
pub struct WriteOutcome {
    /// Generated key of the inserted row, when the engine exposes one
    pub last_insert_id: Option<i64>,

    /// Number of rows the statement touched
    pub rows_affected: u64,

    /// Rows produced by a `RETURNING` clause (pooled dialect only)
    pub returned: Vec<Row>,
}

#[derive(Clone)]
enum Backend {
    Postgres(PgPool),
    Sqlite(SqlitePool),
}

/// Uniform entry point to the active engine
///
/// Cheap to clone: both pool handles are reference-counted.
#[derive(Clone)]
pub struct Gateway {
    dialect: Dialect,
    backend: Backend,
}

impl Gateway {
    /// Connects the pooled PostgreSQL backend
    pub async fn connect_postgres(url: &str, max_connections: u32) -> Result<Self, DbError> {
        info!(max_connections, "connecting postgres pool");

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(30))
            .connect(url)
            .await
            .map_err(|e| DbError::Connectivity(e.to_string()))?;

        Ok(Self {
            dialect: Dialect::Postgres,
            backend: Backend::Postgres(pool),
        })
    }

    /// Opens the single-file SQLite backend
    ///
    /// One connection only: writes serialize, which is the contract callers
    /// rely on for this dialect.
    pub async fn connect_sqlite(path: &str) -> Result<Self, DbError> {
        info!(path, "opening sqlite database");

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| DbError::Connectivity(e.to_string()))?;

        Ok(Self {
            dialect: Dialect::Sqlite,
            backend: Backend::Sqlite(pool),
        })
    }

    /// Opens an in-memory SQLite backend (tests)
    ///
    /// The pool keeps its single connection alive for its whole lifetime;
    /// letting it idle out would drop the database.
    pub async fn connect_sqlite_in_memory() -> Result<Self, DbError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| DbError::Connectivity(e.to_string()))?;

        Ok(Self {
            dialect: Dialect::Sqlite,
            backend: Backend::Sqlite(pool),
        })
    }

    /// The dialect fixed at startup
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Runs a read-only statement and returns normalized rows
    ///
    /// Rows come back in engine order; no ordering is guaranteed unless the
    /// statement itself carries `ORDER BY`.
    pub async fn query(&self, sql: &str, params: Vec<SqlParam>) -> Result<Vec<Row>, DbError> {
        let sql = self.dialect.rewrite_placeholders(sql);
        debug!(sql = %sql, "query");

        match &self.backend {
            Backend::Postgres(pool) => {
                let mut q = sqlx::query(&sql);
                for param in params {
                    q = bind_pg(q, param);
                }
                let rows = q.fetch_all(pool).await?;
                rows.iter().map(Row::from_pg).collect()
            }
            Backend::Sqlite(pool) => {
                let mut q = sqlx::query(&sql);
                for param in params {
                    q = bind_sqlite(q, param);
                }
                let rows = q.fetch_all(pool).await?;
                rows.iter().map(Row::from_sqlite).collect()
            }
        }
    }

    /// Runs a write statement
    ///
    /// See the module docs for the per-dialect shape of [`WriteOutcome`].
    pub async fn execute(&self, sql: &str, params: Vec<SqlParam>) -> Result<WriteOutcome, DbError> {
        let sql = self.dialect.rewrite_placeholders(sql);
        debug!(sql = %sql, "execute");

        match &self.backend {
            Backend::Postgres(pool) => {
                if has_returning(&sql) {
                    let mut q = sqlx::query(&sql);
                    for param in params {
                        q = bind_pg(q, param);
                    }
                    let rows = q.fetch_all(pool).await?;
                    let returned = rows
                        .iter()
                        .map(Row::from_pg)
                        .collect::<Result<Vec<_>, _>>()?;
                    Ok(WriteOutcome {
                        last_insert_id: returned.first().and_then(Row::id),
                        rows_affected: returned.len() as u64,
                        returned,
                    })
                } else {
                    let mut q = sqlx::query(&sql);
                    for param in params {
                        q = bind_pg(q, param);
                    }
                    let result = q.execute(pool).await?;
                    Ok(WriteOutcome {
                        last_insert_id: None,
                        rows_affected: result.rows_affected(),
                        returned: Vec::new(),
                    })
                }
            }
            Backend::Sqlite(pool) => {
                let mut q = sqlx::query(&sql);
                for param in params {
                    q = bind_sqlite(q, param);
                }
                let result = q.execute(pool).await?;
                Ok(WriteOutcome {
                    last_insert_id: Some(result.last_insert_rowid()),
                    rows_affected: result.rows_affected(),
                    returned: Vec::new(),
                })
            }
        }
    }

    /// Inserts a row and returns its generated key
    ///
    /// Pass the statement *without* a `RETURNING` clause; the clause is
    /// appended here for the pooled dialect, and `last_insert_rowid()` is
    /// used for the single-file one. This keeps the generated-key asymmetry
    /// out of every call site.
    pub async fn insert(&self, sql: &str, params: Vec<SqlParam>) -> Result<i64, DbError> {
        let outcome = match self.dialect {
            Dialect::Postgres => self.execute(&format!("{sql} RETURNING id"), params).await?,
            Dialect::Sqlite => self.execute(sql, params).await?,
        };

        outcome
            .last_insert_id
            .ok_or_else(|| DbError::Execution("insert produced no generated id".to_string()))
    }

    /// Verifies connectivity with a trivial probe
    pub async fn health_check(&self) -> Result<(), DbError> {
        self.query("SELECT 1", Vec::new()).await.map(|_| ())
    }
}

fn bind_pg(q: Query<'_, Postgres, PgArguments>, param: SqlParam) -> Query<'_, Postgres, PgArguments> {
    match param {
        SqlParam::Null => q.bind(None::<String>),
        SqlParam::Int(v) => q.bind(v),
        SqlParam::Float(v) => q.bind(v),
        SqlParam::Text(v) => q.bind(v),
        SqlParam::Bool(v) => q.bind(v),
    }
}

fn bind_sqlite<'q>(
    q: Query<'q, Sqlite, SqliteArguments<'q>>,
    param: SqlParam,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    match param {
        SqlParam::Null => q.bind(None::<String>),
        SqlParam::Int(v) => q.bind(v),
        SqlParam::Float(v) => q.bind(v),
        SqlParam::Text(v) => q.bind(v),
        SqlParam::Bool(v) => q.bind(v),
    }
}

/// Detects a `RETURNING` clause outside quoted sections
///
/// Parameters are always bound, so quoted sections in our statements only
/// ever hold fixed literals; a whole-word scan over the unquoted text is
/// sufficient.
fn has_returning(sql: &str) -> bool {
    let mut unquoted = String::with_capacity(sql.len());
    let mut in_single = false;
    let mut in_double = false;

    for ch in sql.chars() {
        match ch {
            '\'' if !in_double => in_single = !in_single,
            '"' if !in_single => in_double = !in_double,
            _ if !in_single && !in_double => unquoted.push(ch),
            _ => {}
        }
    }

    unquoted
        .split_whitespace()
        .any(|word| word.eq_ignore_ascii_case("returning"))
}
