/// Task model and database operations
///
/// Every task belongs to exactly one owning user, and every operation here
/// is scoped by that owner: a task is visible and mutable only through
/// statements that pair its id with the owner's id. Status and priority are
/// closed sets enforced both by the engines' check constraints and by
/// validation in the HTTP layer before this layer is reached.
///
/// # Schema (conceptual, both dialects)
///
/// ```sql
/// CREATE TABLE tasks (
///     id          INTEGER PRIMARY KEY,            -- AUTOINCREMENT / SERIAL
///     title       TEXT NOT NULL,
///     description TEXT,
///     category    TEXT DEFAULT 'Personal',
///     status      TEXT DEFAULT 'active',          -- CHECK active|completed
///     priority    TEXT DEFAULT 'medium',          -- CHECK low|medium|high
///     due_date    TEXT,
///     user_id     INTEGER NOT NULL REFERENCES users(id),
///     created_at  TEXT NOT NULL,
///     updated_at  TEXT NOT NULL                   -- reassigned on every mutation
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use taskdeck_shared::db::{filter::TaskFilter, Gateway};
/// use taskdeck_shared::models::task::{CreateTask, Task};
///
/// # async fn example(gateway: Gateway) -> Result<(), Box<dyn std::error::Error>> {
/// let task = Task::create(&gateway, "42", CreateTask {
///     title: "Buy milk".to_string(),
///     ..Default::default()
/// }).await?;
/// assert_eq!(task.status, "active");
/// assert_eq!(task.priority, "medium");
///
/// let filter = TaskFilter { status: Some("active".to_string()), ..Default::default() };
/// let tasks = Task::list(&gateway, "42", &filter).await?;
/// # Ok(())
/// # }
/// ```

use serde::{Deserialize, Serialize};

use crate::db::error::DbError;
use crate::db::filter::{parse_owner, TaskFilter};
use crate::db::gateway::{Gateway, SqlParam};
use crate::models::timestamp_now;

/// Task completion status (closed set)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Active,
    Completed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Active => "active",
            TaskStatus::Completed => "completed",
        }
    }

    /// Parses a status value, rejecting anything outside the closed set
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "active" => Some(TaskStatus::Active),
            "completed" => Some(TaskStatus::Completed),
            _ => None,
        }
    }

    /// The other status; toggling twice returns to the original
    pub fn toggled(&self) -> Self {
        match self {
            TaskStatus::Active => TaskStatus::Completed,
            TaskStatus::Completed => TaskStatus::Active,
        }
    }
}

/// Task priority (closed set)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "low" => Some(TaskPriority::Low),
            "medium" => Some(TaskPriority::Medium),
            "high" => Some(TaskPriority::High),
            _ => None,
        }
    }
}

/// Default category applied when the caller omits one
pub const DEFAULT_CATEGORY: &str = "Personal";

/// Task row
///
/// Status and priority stay as strings here since the row is serialized to
/// the API verbatim; the closed sets are enforced at the validation
/// boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub status: String,
    pub priority: String,
    /// Optional date string; no time-zone normalization is guaranteed
    pub due_date: Option<String>,
    pub user_id: i64,
    pub created_at: String,
    pub updated_at: String,
}

/// Input for creating a task
///
/// Omitted fields take their documented defaults: category "Personal",
/// priority "medium". Status always starts "active".
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateTask {
    /// Required; must be non-empty after trimming (validated upstream)
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub priority: Option<String>,
    pub due_date: Option<String>,
}

/// Partial update: only present fields change
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTask {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub due_date: Option<String>,
}

impl Task {
    /// Lists an owner's tasks through the predicate/sort builder
    ///
    /// Only rows whose owner matches the given identifier are returned.
    pub async fn list(
        gateway: &Gateway,
        owner: &str,
        filter: &TaskFilter,
    ) -> Result<Vec<Self>, DbError> {
        let (sql, params) = filter.build(owner)?;
        let rows = gateway.query(&sql, params).await?;
        rows.into_iter().map(|row| row.deserialize()).collect()
    }

    /// Lists all of an owner's tasks in export order (newest first)
    pub async fn list_all(gateway: &Gateway, owner: &str) -> Result<Vec<Self>, DbError> {
        let owner_id = parse_owner(owner)?;
        let rows = gateway
            .query(
                "SELECT * FROM tasks WHERE user_id = ? ORDER BY created_at DESC",
                vec![SqlParam::Int(owner_id)],
            )
            .await?;

        rows.into_iter().map(|row| row.deserialize()).collect()
    }

    /// Fetches a single task scoped by owner
    pub async fn find(gateway: &Gateway, owner: &str, id: i64) -> Result<Option<Self>, DbError> {
        let owner_id = parse_owner(owner)?;
        let rows = gateway
            .query(
                "SELECT * FROM tasks WHERE id = ? AND user_id = ?",
                vec![SqlParam::Int(id), SqlParam::Int(owner_id)],
            )
            .await?;

        rows.into_iter().next().map(|row| row.deserialize()).transpose()
    }

    /// Creates a task for the owner and returns the stored row
    ///
    /// The insert does not assume inline row return: the generated id
    /// comes from the gateway and the row is fetched by a follow-up query,
    /// which works identically on both dialects.
    pub async fn create(
        gateway: &Gateway,
        owner: &str,
        data: CreateTask,
    ) -> Result<Self, DbError> {
        let owner_id = parse_owner(owner)?;
        let now = timestamp_now();

        let id = gateway
            .insert(
                "INSERT INTO tasks (title, description, category, status, priority, due_date, \
                 user_id, created_at, updated_at) VALUES (?, ?, ?, 'active', ?, ?, ?, ?, ?)",
                vec![
                    SqlParam::Text(data.title.trim().to_string()),
                    SqlParam::from(data.description),
                    SqlParam::Text(
                        data.category
                            .filter(|c| !c.trim().is_empty())
                            .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
                    ),
                    SqlParam::Text(
                        data.priority
                            .filter(|p| !p.trim().is_empty())
                            .unwrap_or_else(|| TaskPriority::Medium.as_str().to_string()),
                    ),
                    SqlParam::from(data.due_date),
                    SqlParam::Int(owner_id),
                    SqlParam::Text(now.clone()),
                    SqlParam::Text(now),
                ],
            )
            .await?;

        Self::find(gateway, owner, id)
            .await?
            .ok_or_else(|| DbError::Execution("inserted task row missing".to_string()))
    }

    /// Applies a partial update scoped by owner
    ///
    /// Absent fields keep their stored values via COALESCE; `updated_at` is
    /// reassigned unconditionally. Returns None when no row matched the
    /// owner/id pair.
    pub async fn update(
        gateway: &Gateway,
        owner: &str,
        id: i64,
        data: UpdateTask,
    ) -> Result<Option<Self>, DbError> {
        let owner_id = parse_owner(owner)?;

        let outcome = gateway
            .execute(
                "UPDATE tasks SET \
                 title = COALESCE(?, title), \
                 description = COALESCE(?, description), \
                 category = COALESCE(?, category), \
                 status = COALESCE(?, status), \
                 priority = COALESCE(?, priority), \
                 due_date = COALESCE(?, due_date), \
                 updated_at = ? \
                 WHERE id = ? AND user_id = ?",
                vec![
                    SqlParam::from(data.title),
                    SqlParam::from(data.description),
                    SqlParam::from(data.category),
                    SqlParam::from(data.status),
                    SqlParam::from(data.priority),
                    SqlParam::from(data.due_date),
                    SqlParam::Text(timestamp_now()),
                    SqlParam::Int(id),
                    SqlParam::Int(owner_id),
                ],
            )
            .await?;

        if outcome.rows_affected == 0 {
            return Ok(None);
        }

        Self::find(gateway, owner, id).await
    }

    /// Flips a task between active and completed
    ///
    /// Read-modify-write without a transaction: two concurrent toggles of
    /// the same task can lose one update. Inherited behavior, kept as-is.
    pub async fn toggle_status(
        gateway: &Gateway,
        owner: &str,
        id: i64,
    ) -> Result<Option<Self>, DbError> {
        let owner_id = parse_owner(owner)?;

        let rows = gateway
            .query(
                "SELECT status FROM tasks WHERE id = ? AND user_id = ?",
                vec![SqlParam::Int(id), SqlParam::Int(owner_id)],
            )
            .await?;

        let Some(row) = rows.into_iter().next() else {
            return Ok(None);
        };

        let current = row
            .get_str("status")
            .and_then(TaskStatus::parse)
            .unwrap_or(TaskStatus::Active);

        gateway
            .execute(
                "UPDATE tasks SET status = ?, updated_at = ? WHERE id = ? AND user_id = ?",
                vec![
                    SqlParam::from(current.toggled().as_str()),
                    SqlParam::Text(timestamp_now()),
                    SqlParam::Int(id),
                    SqlParam::Int(owner_id),
                ],
            )
            .await?;

        Self::find(gateway, owner, id).await
    }

    /// Deletes a task scoped by owner, returning the affected-row count
    pub async fn delete(gateway: &Gateway, owner: &str, id: i64) -> Result<u64, DbError> {
        let owner_id = parse_owner(owner)?;

        let outcome = gateway
            .execute(
                "DELETE FROM tasks WHERE id = ? AND user_id = ?",
                vec![SqlParam::Int(id), SqlParam::Int(owner_id)],
            )
            .await?;

        Ok(outcome.rows_affected)
    }

    /// Counts an owner's tasks (used by the cascade tests and admin views)
    pub async fn count_for_owner(gateway: &Gateway, owner_id: i64) -> Result<i64, DbError> {
        let rows = gateway
            .query(
                "SELECT COUNT(*) AS count FROM tasks WHERE user_id = ?",
                vec![SqlParam::Int(owner_id)],
            )
            .await?;

        Ok(rows.first().map(|row| row.count("count")).unwrap_or(0))
    }
}
