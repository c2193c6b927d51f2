/// User administration endpoints
///
/// These are gated by the `x-admin-key` header (see the admin middleware
/// in `app.rs`), not by a user token.
///
/// # Endpoints
///
/// - `GET /api/admin/users` - List all users with their task counts
/// - `DELETE /api/admin/users/:id` - Delete a user and all their tasks
/// - `PATCH /api/admin/users/:id/reset-password` - Reset to the well-known
///   recovery password

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use taskdeck_shared::{
    auth::password,
    models::user::{User, UserWithTaskCount},
};

/// The password an account is set to after an administrative reset
///
/// The user is expected to log in with it once and change it.
const RESET_PASSWORD: &str = "12345678";

/// List every user together with how many tasks each owns
pub async fn list_users(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<UserWithTaskCount>>> {
    let users = User::list_with_task_counts(&state.db).await?;
    Ok(Json(users))
}

/// Deletion outcome
#[derive(Debug, Serialize)]
pub struct DeleteUserResponse {
    pub deleted: bool,
}

/// Delete a user and every task they own
///
/// # Errors
///
/// - `404 Not Found`: No such user
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<DeleteUserResponse>> {
    // Look the user up first so a missing id is a 404, not a silent no-op.
    User::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    User::delete_cascade(&state.db, id).await?;

    tracing::info!(user_id = id, "user deleted by admin");

    Ok(Json(DeleteUserResponse { deleted: true }))
}

/// Reset outcome
#[derive(Debug, Serialize)]
pub struct ResetPasswordResponse {
    pub reset: bool,
}

/// Reset a user's password to the recovery value
///
/// # Errors
///
/// - `404 Not Found`: No such user
pub async fn reset_password(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<ResetPasswordResponse>> {
    let password_hash = password::hash_password(RESET_PASSWORD)?;

    let existed = User::reset_password(&state.db, id, &password_hash).await?;
    if !existed {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    tracing::info!(user_id = id, "password reset by admin");

    Ok(Json(ResetPasswordResponse { reset: true }))
}
