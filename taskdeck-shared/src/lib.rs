//! # TaskDeck Shared Library
//!
//! Shared types and business logic for the TaskDeck API server. The heart
//! of this crate is the `db` module: a single data-access layer that runs
//! unmodified against pooled PostgreSQL and single-file SQLite, hiding
//! placeholder syntax, generated-key retrieval, and result-shape
//! differences behind one gateway.
//!
//! ## Module Organization
//!
//! - `db`: dialect selection, execution gateway, schema, filters, rows
//! - `models`: user and task models with their database operations
//! - `auth`: password hashing and JWT utilities

pub mod auth;
pub mod db;
pub mod models;

/// Current version of the TaskDeck shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
