/// Database models for TaskDeck
///
/// # Models
///
/// - `user`: user accounts (registration, admin listing, cascade delete)
/// - `task`: to-do items scoped to an owning user
///
/// All operations go through the [`Gateway`](crate::db::Gateway) and are
/// owner-scoped where the data model requires it; no model ever branches on
/// the active dialect.

pub mod task;
pub mod user;

use chrono::{SecondsFormat, Utc};

/// Current time as the RFC 3339 string stored in both dialects
///
/// Microsecond precision keeps consecutive mutations distinguishable and
/// the strings lexicographically ordered.
pub fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}
