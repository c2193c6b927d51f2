/// Analytics endpoints
///
/// Per-user summary statistics computed directly in SQL. The statements
/// are written once in the canonical placeholder style and run unchanged
/// on both engines; date comparisons work lexicographically because
/// timestamps are stored as RFC 3339 text.
///
/// # Endpoints
///
/// - `GET /api/analytics/summary` - Aggregate counts for the caller

use crate::{
    app::{AppState, CurrentUser},
    error::ApiResult,
};
use axum::{extract::State, Extension, Json};
use chrono::{Duration, SecondsFormat, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use taskdeck_shared::db::SqlParam;

/// Summary response
#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    /// All tasks the caller owns
    pub total: i64,

    /// Tasks with status "completed"
    pub completed: i64,

    /// Tasks with status "active"
    pub active: i64,

    /// completed / total, rounded to one decimal; 0 when there are no tasks
    pub completion_rate: f64,

    /// Active tasks whose due date has passed
    pub overdue: i64,

    /// Tasks created within the last seven days
    pub created_last_week: i64,

    /// Task count per category
    pub by_category: BTreeMap<String, i64>,

    /// Task count per priority
    pub by_priority: BTreeMap<String, i64>,

    /// Completions per day over the last seven days, ascending
    ///
    /// Only days with at least one completion appear.
    pub trend: Vec<TrendPoint>,
}

/// One day of the completion trend
#[derive(Debug, Serialize)]
pub struct TrendPoint {
    /// Calendar date, `YYYY-MM-DD`
    pub date: String,

    /// Tasks whose status moved to "completed" that day
    pub count: i64,
}

/// Aggregate task statistics for the authenticated user
pub async fn summary(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> ApiResult<Json<SummaryResponse>> {
    let owner = taskdeck_shared::db::filter::parse_owner(&current.id)?;

    let status_rows = state
        .db
        .query(
            "SELECT status, COUNT(*) AS count FROM tasks WHERE user_id = ? GROUP BY status",
            vec![SqlParam::Int(owner)],
        )
        .await?;

    let mut completed = 0i64;
    let mut active = 0i64;
    for row in &status_rows {
        match row.get_str("status") {
            Some("completed") => completed = row.count("count"),
            Some("active") => active = row.count("count"),
            _ => {}
        }
    }
    let total = completed + active;

    let completion_rate = if total > 0 {
        ((completed as f64 / total as f64) * 1000.0).round() / 10.0
    } else {
        0.0
    };

    // Overdue: active tasks with a due date strictly before today.
    let today = Utc::now().format("%Y-%m-%d").to_string();
    let overdue = state
        .db
        .query(
            "SELECT COUNT(*) AS count FROM tasks \
             WHERE user_id = ? AND status = 'active' \
             AND due_date IS NOT NULL AND due_date != '' AND due_date < ?",
            vec![SqlParam::Int(owner), SqlParam::from(today)],
        )
        .await?
        .first()
        .map(|row| row.count("count"))
        .unwrap_or(0);

    // The cutoff is computed here rather than in SQL so the statement stays
    // engine-neutral; RFC 3339 text compares correctly as strings.
    let cutoff = (Utc::now() - Duration::days(7)).to_rfc3339_opts(SecondsFormat::Micros, true);
    let created_last_week = state
        .db
        .query(
            "SELECT COUNT(*) AS count FROM tasks WHERE user_id = ? AND created_at >= ?",
            vec![SqlParam::Int(owner), SqlParam::from(cutoff)],
        )
        .await?
        .first()
        .map(|row| row.count("count"))
        .unwrap_or(0);

    // Completion trend. The day is the first ten characters of the stored
    // RFC 3339 timestamp, which both engines can slice identically; the
    // date-only cutoff compares correctly against full timestamps.
    let trend_cutoff = (Utc::now() - Duration::days(7)).format("%Y-%m-%d").to_string();
    let trend = state
        .db
        .query(
            "SELECT substr(updated_at, 1, 10) AS date, COUNT(*) AS count FROM tasks \
             WHERE user_id = ? AND status = 'completed' AND updated_at >= ? \
             GROUP BY substr(updated_at, 1, 10) ORDER BY date ASC",
            vec![SqlParam::Int(owner), SqlParam::from(trend_cutoff)],
        )
        .await?
        .into_iter()
        .filter_map(|row| {
            row.get_str("date").map(|date| TrendPoint {
                date: date.to_string(),
                count: row.count("count"),
            })
        })
        .collect();

    let by_category = grouped_counts(&state, owner, "category").await?;
    let by_priority = grouped_counts(&state, owner, "priority").await?;

    Ok(Json(SummaryResponse {
        total,
        completed,
        active,
        completion_rate,
        overdue,
        created_last_week,
        by_category,
        by_priority,
        trend,
    }))
}

/// Runs a GROUP BY count over one of the closed task columns
///
/// The column name is supplied by this module only, never by the caller.
async fn grouped_counts(
    state: &AppState,
    owner: i64,
    column: &str,
) -> Result<BTreeMap<String, i64>, taskdeck_shared::db::DbError> {
    let sql = format!(
        "SELECT {column}, COUNT(*) AS count FROM tasks WHERE user_id = ? GROUP BY {column}"
    );
    let rows = state.db.query(&sql, vec![SqlParam::Int(owner)]).await?;

    let mut counts = BTreeMap::new();
    for row in rows {
        if let Some(key) = row.get_str(column) {
            counts.insert(key.to_string(), row.count("count"));
        }
    }
    Ok(counts)
}
