/// Data-access layer for TaskDeck
///
/// This is the core of the system: one uniform surface over two
/// structurally different SQL engines (pooled PostgreSQL and single-file
/// SQLite). The dialect is selected once at startup and fixed for the
/// process lifetime; everything else reads the resolved flag through the
/// gateway.
///
/// # Modules
///
/// - `dialect`: one-shot dialect selection and placeholder translation
/// - `gateway`: the two uniform entry points (query / execute)
/// - `schema`: idempotent create-if-absent table initialization
/// - `filter`: parameterized predicate/sort builder for task listings
/// - `row`: result-shape normalization into one canonical row type
/// - `error`: the four-class error taxonomy

pub mod dialect;
pub mod error;
pub mod filter;
pub mod gateway;
pub mod row;
pub mod schema;

pub use dialect::Dialect;
pub use error::DbError;
pub use gateway::{Gateway, SqlParam, WriteOutcome};
pub use row::Row;
