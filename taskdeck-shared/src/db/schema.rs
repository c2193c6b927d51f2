/// Schema initialization
///
/// Runs a fixed sequence of `CREATE TABLE IF NOT EXISTS` statements for the
/// active dialect. Idempotent (safe on every process start) and run
/// before the server accepts its first request, so the gateway never sees
/// operations against tables that do not exist.
///
/// A failed statement is fatal for that table's future operations but must
/// not crash the process: it is logged and subsequent statements against
/// the table surface as `DbError::Execution` until corrected.
///
/// Timestamps are stored as RFC 3339 text in both dialects and assigned by
/// the application, which keeps row decoding and date arithmetic uniform
/// across engines.

use tracing::{error, info};

use crate::db::dialect::Dialect;
use crate::db::gateway::Gateway;

const SQLITE_SCHEMA: [&str; 3] = [
    "CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        email TEXT UNIQUE NOT NULL,
        password_hash TEXT NOT NULL,
        name TEXT,
        created_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS tasks (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        description TEXT,
        category TEXT DEFAULT 'Personal',
        status TEXT DEFAULT 'active' CHECK (status IN ('active', 'completed')),
        priority TEXT DEFAULT 'medium' CHECK (priority IN ('low', 'medium', 'high')),
        due_date TEXT,
        user_id INTEGER NOT NULL REFERENCES users(id),
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_tasks_user_id ON tasks(user_id)",
];

const POSTGRES_SCHEMA: [&str; 3] = [
    "CREATE TABLE IF NOT EXISTS users (
        id SERIAL PRIMARY KEY,
        email TEXT UNIQUE NOT NULL,
        password_hash TEXT NOT NULL,
        name TEXT,
        created_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS tasks (
        id SERIAL PRIMARY KEY,
        title TEXT NOT NULL,
        description TEXT,
        category TEXT DEFAULT 'Personal',
        status TEXT DEFAULT 'active' CHECK (status IN ('active', 'completed')),
        priority TEXT DEFAULT 'medium' CHECK (priority IN ('low', 'medium', 'high')),
        due_date TEXT,
        user_id INTEGER NOT NULL REFERENCES users(id),
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_tasks_user_id ON tasks(user_id)",
];

/// Creates the users and tasks tables if absent
///
/// Statement failures are reported, not propagated: the process keeps
/// running and the affected table's operations fail until the schema is
/// corrected.
pub async fn initialize(gateway: &Gateway) {
    let statements = match gateway.dialect() {
        Dialect::Sqlite => &SQLITE_SCHEMA,
        Dialect::Postgres => &POSTGRES_SCHEMA,
    };

    let mut failed = 0usize;
    for statement in statements {
        if let Err(err) = gateway.execute(statement, Vec::new()).await {
            failed += 1;
            error!(error = %err, "schema statement failed");
        }
    }

    if failed == 0 {
        info!(dialect = gateway.dialect().name(), "schema verified");
    } else {
        error!(dialect = gateway.dialect().name(), failed, "schema initialization incomplete");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schemas_cover_both_tables() {
        for statements in [&SQLITE_SCHEMA, &POSTGRES_SCHEMA] {
            assert!(statements[0].contains("users"));
            assert!(statements[1].contains("tasks"));
            for statement in statements.iter().take(2) {
                assert!(statement.contains("IF NOT EXISTS"));
            }
        }
    }

    #[test]
    fn test_closed_sets_are_check_constrained() {
        for statements in [&SQLITE_SCHEMA, &POSTGRES_SCHEMA] {
            assert!(statements[1].contains("CHECK (status IN ('active', 'completed'))"));
            assert!(statements[1].contains("CHECK (priority IN ('low', 'medium', 'high'))"));
        }
    }
}
