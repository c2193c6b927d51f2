/// User model and database operations
///
/// Users are created once by registration, have their password hash
/// overwritten by an administrative reset, and are deleted only as a
/// cascade root. The engine does not cascade automatically: deleting a user
/// deletes the dependent tasks first, in the same logical operation, before
/// the user row itself.
///
/// # Schema (conceptual, both dialects)
///
/// ```sql
/// CREATE TABLE users (
///     id            INTEGER PRIMARY KEY,  -- AUTOINCREMENT / SERIAL
///     email         TEXT UNIQUE NOT NULL,
///     password_hash TEXT NOT NULL,
///     name          TEXT,
///     created_at    TEXT NOT NULL
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use taskdeck_shared::db::Gateway;
/// use taskdeck_shared::models::user::{CreateUser, User};
///
/// # async fn example(gateway: Gateway) -> Result<(), Box<dyn std::error::Error>> {
/// let user = User::create(&gateway, CreateUser {
///     email: "user@example.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
///     name: Some("Ada".to_string()),
/// }).await?;
///
/// let found = User::find_by_email(&gateway, "user@example.com").await?;
/// assert_eq!(found.map(|u| u.id), Some(user.id));
/// # Ok(())
/// # }
/// ```

use serde::{Deserialize, Serialize};

use crate::db::error::DbError;
use crate::db::gateway::{Gateway, SqlParam};
use crate::models::timestamp_now;

/// User account row
///
/// The password hash is opaque to this layer; hashing and verification
/// live in [`crate::auth::password`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Engine-assigned, monotonically increasing identifier
    pub id: i64,

    /// Unique email address
    pub email: String,

    /// Opaque password hash
    pub password_hash: String,

    /// Optional display name
    pub name: Option<String>,

    /// Assigned at insert, immutable
    pub created_at: String,
}

/// Input for creating a new user
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub email: String,

    /// Already-hashed password, never plaintext
    pub password_hash: String,

    pub name: Option<String>,
}

/// Admin listing row: user plus their task count
#[derive(Debug, Clone, Serialize)]
pub struct UserWithTaskCount {
    pub id: i64,
    pub email: String,
    pub name: Option<String>,
    pub created_at: String,
    pub task_count: i64,
}

impl User {
    /// Creates a new user
    ///
    /// # Errors
    ///
    /// Returns [`DbError::ConstraintViolation`] when the email is already
    /// registered.
    pub async fn create(gateway: &Gateway, data: CreateUser) -> Result<Self, DbError> {
        let id = gateway
            .insert(
                "INSERT INTO users (email, password_hash, name, created_at) VALUES (?, ?, ?, ?)",
                vec![
                    SqlParam::Text(data.email),
                    SqlParam::Text(data.password_hash),
                    SqlParam::from(data.name),
                    SqlParam::Text(timestamp_now()),
                ],
            )
            .await?;

        Self::find_by_id(gateway, id)
            .await?
            .ok_or_else(|| DbError::Execution("inserted user row missing".to_string()))
    }

    /// Finds a user by id
    pub async fn find_by_id(gateway: &Gateway, id: i64) -> Result<Option<Self>, DbError> {
        let rows = gateway
            .query("SELECT * FROM users WHERE id = ?", vec![SqlParam::Int(id)])
            .await?;

        rows.into_iter().next().map(|row| row.deserialize()).transpose()
    }

    /// Finds a user by email (exact match)
    pub async fn find_by_email(gateway: &Gateway, email: &str) -> Result<Option<Self>, DbError> {
        let rows = gateway
            .query(
                "SELECT * FROM users WHERE email = ?",
                vec![SqlParam::from(email)],
            )
            .await?;

        rows.into_iter().next().map(|row| row.deserialize()).transpose()
    }

    /// Lists all users with their task counts, newest first
    ///
    /// Counts go through the fail-closed normalizer, so an aggregate the
    /// engine types unexpectedly becomes zero instead of an error.
    pub async fn list_with_task_counts(gateway: &Gateway) -> Result<Vec<UserWithTaskCount>, DbError> {
        let rows = gateway
            .query(
                "SELECT u.id, u.email, u.name, u.created_at, COUNT(t.id) AS task_count \
                 FROM users u \
                 LEFT JOIN tasks t ON u.id = t.user_id \
                 GROUP BY u.id, u.email, u.name, u.created_at \
                 ORDER BY u.created_at DESC",
                Vec::new(),
            )
            .await?;

        rows.into_iter()
            .map(|row| {
                Ok(UserWithTaskCount {
                    id: row
                        .get_i64("id")
                        .ok_or_else(|| DbError::Execution("user row missing id".to_string()))?,
                    email: row.get_str("email").unwrap_or_default().to_string(),
                    name: row.get_str("name").map(str::to_string),
                    created_at: row.get_str("created_at").unwrap_or_default().to_string(),
                    task_count: row.count("task_count"),
                })
            })
            .collect()
    }

    /// Overwrites a user's password hash (administrative reset)
    ///
    /// Returns true when the user existed.
    pub async fn reset_password(
        gateway: &Gateway,
        id: i64,
        password_hash: &str,
    ) -> Result<bool, DbError> {
        let outcome = gateway
            .execute(
                "UPDATE users SET password_hash = ? WHERE id = ?",
                vec![SqlParam::from(password_hash), SqlParam::Int(id)],
            )
            .await?;

        Ok(outcome.rows_affected > 0)
    }

    /// Deletes a user and all their tasks
    ///
    /// The cascade is caller-driven: dependent tasks are deleted first,
    /// then the user row, as one logical operation. There is no
    /// transaction wrapper around the pair; a crash between the two
    /// statements leaves a task-less user, which a retry of this operation
    /// cleans up.
    pub async fn delete_cascade(gateway: &Gateway, id: i64) -> Result<(), DbError> {
        gateway
            .execute(
                "DELETE FROM tasks WHERE user_id = ?",
                vec![SqlParam::Int(id)],
            )
            .await?;

        gateway
            .execute("DELETE FROM users WHERE id = ?", vec![SqlParam::Int(id)])
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_user_struct() {
        let data = CreateUser {
            email: "test@example.com".to_string(),
            password_hash: "hash".to_string(),
            name: Some("Test".to_string()),
        };

        assert_eq!(data.email, "test@example.com");
        assert_eq!(data.name.as_deref(), Some("Test"));
    }

    #[test]
    fn test_user_serializes_with_hash_field() {
        // The HTTP layer is responsible for projecting the hash away;
        // the model carries it so login can verify.
        let user = User {
            id: 1,
            email: "a@b.c".to_string(),
            password_hash: "h".to_string(),
            name: None,
            created_at: "2026-01-01T00:00:00Z".to_string(),
        };

        let value = serde_json::to_value(&user).unwrap();
        assert_eq!(value["password_hash"], "h");
    }

    // Database-backed tests live in tests/gateway_tests.rs
}
