/// Task endpoints
///
/// CRUD plus status toggle and export for the authenticated user's tasks.
/// Every statement underneath is scoped to the caller's owner id; a task id
/// belonging to someone else behaves exactly like a missing one.
///
/// # Endpoints
///
/// - `GET /api/tasks` - List with optional filters
/// - `POST /api/tasks` - Create
/// - `GET /api/tasks/export` - Download all tasks as CSV or JSON
/// - `GET /api/tasks/:id` - Fetch one
/// - `PUT /api/tasks/:id` - Partial update
/// - `PATCH /api/tasks/:id/complete` - Toggle active/completed
/// - `DELETE /api/tasks/:id` - Delete

use crate::{
    app::{AppState, CurrentUser},
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::Deserialize;
use taskdeck_shared::{
    db::filter::TaskFilter,
    models::task::{CreateTask, Task, TaskPriority, TaskStatus, UpdateTask},
};

/// List the caller's tasks
///
/// Filters arrive as query parameters: `status`, `category`, `priority`,
/// `search`, `sort`. Absent, empty, and `"all"` values disable the
/// corresponding filter; an unknown sort key silently falls back to
/// `created_at`.
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Query(filter): Query<TaskFilter>,
) -> ApiResult<Json<Vec<Task>>> {
    let tasks = Task::list(&state.db, &current.id, &filter).await?;
    Ok(Json(tasks))
}

/// Fetch a single task by id
///
/// # Errors
///
/// - `404 Not Found`: No such task for this owner
pub async fn get_task(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Task>> {
    let task = Task::find(&state.db, &current.id, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;
    Ok(Json(task))
}

fn validate_create(req: &CreateTask) -> Result<(), ApiError> {
    if req.title.trim().is_empty() {
        return Err(ApiError::BadRequest("Title is required".to_string()));
    }
    if let Some(priority) = req.priority.as_deref() {
        if !priority.trim().is_empty() && TaskPriority::parse(priority).is_none() {
            return Err(ApiError::BadRequest(format!(
                "Invalid priority: {priority}"
            )));
        }
    }
    Ok(())
}

fn validate_update(req: &UpdateTask) -> Result<(), ApiError> {
    if let Some(title) = req.title.as_deref() {
        if title.trim().is_empty() {
            return Err(ApiError::BadRequest("Title cannot be empty".to_string()));
        }
    }
    if let Some(status) = req.status.as_deref() {
        if TaskStatus::parse(status).is_none() {
            return Err(ApiError::BadRequest(format!("Invalid status: {status}")));
        }
    }
    if let Some(priority) = req.priority.as_deref() {
        if TaskPriority::parse(priority).is_none() {
            return Err(ApiError::BadRequest(format!(
                "Invalid priority: {priority}"
            )));
        }
    }
    Ok(())
}

/// Create a new task
///
/// Missing fields get defaults: status "active", priority "medium",
/// category "Personal".
///
/// # Errors
///
/// - `400 Bad Request`: Empty title or unknown priority
pub async fn create_task(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(req): Json<CreateTask>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    validate_create(&req)?;

    let task = Task::create(&state.db, &current.id, req).await?;

    tracing::debug!(task_id = task.id, "task created");

    Ok((StatusCode::CREATED, Json(task)))
}

/// Partially update a task
///
/// Only the fields present in the body change; `updated_at` always moves.
///
/// # Errors
///
/// - `400 Bad Request`: Empty title, unknown status or priority
/// - `404 Not Found`: No such task for this owner
pub async fn update_task(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateTask>,
) -> ApiResult<Json<Task>> {
    validate_update(&req)?;

    let task = Task::update(&state.db, &current.id, id, req)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    Ok(Json(task))
}

/// Toggle a task between active and completed
///
/// # Errors
///
/// - `404 Not Found`: No such task for this owner
pub async fn toggle_task(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Task>> {
    let task = Task::toggle_status(&state.db, &current.id, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    Ok(Json(task))
}

/// Delete a task
///
/// # Errors
///
/// - `404 Not Found`: No such task for this owner
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    let deleted = Task::delete(&state.db, &current.id, id).await?;
    if deleted == 0 {
        return Err(ApiError::NotFound("Task not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Export format selector
#[derive(Debug, Deserialize)]
pub struct ExportParams {
    /// "json" (default) or "csv"
    pub format: Option<String>,
}

/// Download every task of the caller as a file attachment
///
/// JSON is the default; `?format=csv` switches to CSV, with fields quoted
/// and embedded quotes doubled.
pub async fn export_tasks(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Query(params): Query<ExportParams>,
) -> ApiResult<Response> {
    let tasks = Task::list_all(&state.db, &current.id).await?;

    let format = params.format.as_deref().unwrap_or("json");
    let response = match format {
        "csv" => (
            [
                (header::CONTENT_TYPE, "text/csv".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"tasks.csv\"".to_string(),
                ),
            ],
            tasks_to_csv(&tasks),
        )
            .into_response(),
        _ => {
            let body = serde_json::to_string_pretty(&tasks)
                .map_err(|e| ApiError::InternalError(format!("Serialization failed: {e}")))?;
            (
                [
                    (header::CONTENT_TYPE, "application/json".to_string()),
                    (
                        header::CONTENT_DISPOSITION,
                        "attachment; filename=\"tasks.json\"".to_string(),
                    ),
                ],
                body,
            )
                .into_response()
        }
    };

    Ok(response)
}

/// Escapes a CSV field: wrap in quotes, double any embedded quote
fn csv_field(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

fn tasks_to_csv(tasks: &[Task]) -> String {
    let mut out = String::from(
        "id,title,description,category,status,priority,due_date,created_at,updated_at\n",
    );
    for task in tasks {
        let row = [
            task.id.to_string(),
            csv_field(&task.title),
            csv_field(task.description.as_deref().unwrap_or("")),
            csv_field(&task.category),
            csv_field(&task.status),
            csv_field(&task.priority),
            csv_field(task.due_date.as_deref().unwrap_or("")),
            csv_field(&task.created_at),
            csv_field(&task.updated_at),
        ];
        out.push_str(&row.join(","));
        out.push('\n');
    }
    out
}
