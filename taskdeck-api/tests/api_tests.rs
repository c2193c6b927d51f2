/// Integration tests for the TaskDeck API
///
/// These exercise the full HTTP surface end-to-end against an in-memory
/// database: authentication, task lifecycle, filtering, export, analytics
/// and the admin endpoints.

mod common;

use axum::http::StatusCode;
use common::{read_json, read_text, TestContext, TEST_ADMIN_KEY};
use serde_json::json;

#[tokio::test]
async fn test_health_check() {
    let ctx = TestContext::new().await.unwrap();

    let response = ctx.send_json("GET", "/api/health", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = read_json(response).await;
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["database"], "connected");
    assert_eq!(json["dialect"], "sqlite");
}

#[tokio::test]
async fn test_register_login_me_flow() {
    let ctx = TestContext::new().await.unwrap();

    let response = ctx
        .send_json(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({
                "email": "alice@example.com",
                "password": "correct horse battery",
                "name": "Alice"
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let registered = read_json(response).await;
    assert_eq!(registered["user"]["email"], "alice@example.com");
    assert_eq!(registered["user"]["name"], "Alice");
    assert!(registered["user"].get("password_hash").is_none());

    let response = ctx
        .send_json(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({
                "email": "alice@example.com",
                "password": "correct horse battery"
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let login = read_json(response).await;
    let token = login["token"].as_str().unwrap();

    let response = ctx.send_json("GET", "/api/auth/me", Some(token), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let me = read_json(response).await;
    assert_eq!(me["email"], "alice@example.com");
}

#[tokio::test]
async fn test_register_duplicate_email_conflicts() {
    let ctx = TestContext::new().await.unwrap();
    ctx.register("dup@example.com", "password-one").await;

    let response = ctx
        .send_json(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({ "email": "dup@example.com", "password": "password-two" })),
        )
        .await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let json = read_json(response).await;
    assert_eq!(json["message"], "Email already registered");
}

#[tokio::test]
async fn test_register_validation_failures() {
    let ctx = TestContext::new().await.unwrap();

    let response = ctx
        .send_json(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({ "email": "not-an-email", "password": "long enough" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = ctx
        .send_json(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({ "email": "ok@example.com", "password": "short" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_login_wrong_password_is_unauthorized() {
    let ctx = TestContext::new().await.unwrap();
    ctx.register("bob@example.com", "the-real-password").await;

    let response = ctx
        .send_json(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": "bob@example.com", "password": "guess" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_tasks_require_authentication() {
    let ctx = TestContext::new().await.unwrap();

    let response = ctx.send_json("GET", "/api/tasks", None, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = ctx
        .send_json("GET", "/api/tasks", Some("not-a-real-token"), None)
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_task_crud_lifecycle() {
    let ctx = TestContext::new().await.unwrap();
    let token = ctx.register("crud@example.com", "long-password").await;

    // Create with defaults.
    let response = ctx
        .send_json(
            "POST",
            "/api/tasks",
            Some(&token),
            Some(json!({ "title": "Buy milk" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = read_json(response).await;
    assert_eq!(created["title"], "Buy milk");
    assert_eq!(created["status"], "active");
    assert_eq!(created["priority"], "medium");
    assert_eq!(created["category"], "Personal");
    let id = created["id"].as_i64().unwrap();

    // Read back.
    let response = ctx
        .send_json("GET", &format!("/api/tasks/{id}"), Some(&token), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    // Partial update.
    let response = ctx
        .send_json(
            "PUT",
            &format!("/api/tasks/{id}"),
            Some(&token),
            Some(json!({ "priority": "high" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated = read_json(response).await;
    assert_eq!(updated["priority"], "high");
    assert_eq!(updated["title"], "Buy milk");

    // Toggle twice returns to active.
    let response = ctx
        .send_json("PATCH", &format!("/api/tasks/{id}/complete"), Some(&token), None)
        .await;
    assert_eq!(read_json(response).await["status"], "completed");
    let response = ctx
        .send_json("PATCH", &format!("/api/tasks/{id}/complete"), Some(&token), None)
        .await;
    assert_eq!(read_json(response).await["status"], "active");

    // Delete, then 404.
    let response = ctx
        .send_json("DELETE", &format!("/api/tasks/{id}"), Some(&token), None)
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let response = ctx
        .send_json("GET", &format!("/api/tasks/{id}"), Some(&token), None)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_task_empty_title_is_rejected() {
    let ctx = TestContext::new().await.unwrap();
    let token = ctx.register("strict@example.com", "long-password").await;

    let response = ctx
        .send_json(
            "POST",
            "/api/tasks",
            Some(&token),
            Some(json!({ "title": "   " })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_tasks_are_isolated_between_users() {
    let ctx = TestContext::new().await.unwrap();
    let token_a = ctx.register("a@example.com", "long-password").await;
    let token_b = ctx.register("b@example.com", "long-password").await;

    let response = ctx
        .send_json(
            "POST",
            "/api/tasks",
            Some(&token_a),
            Some(json!({ "title": "private" })),
        )
        .await;
    let id = read_json(response).await["id"].as_i64().unwrap();

    // The other user sees neither the listing entry nor the task itself.
    let response = ctx.send_json("GET", "/api/tasks", Some(&token_b), None).await;
    assert_eq!(read_json(response).await.as_array().unwrap().len(), 0);

    let response = ctx
        .send_json("GET", &format!("/api/tasks/{id}"), Some(&token_b), None)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = ctx
        .send_json("DELETE", &format!("/api/tasks/{id}"), Some(&token_b), None)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_task_list_filters() {
    let ctx = TestContext::new().await.unwrap();
    let token = ctx.register("filters@example.com", "long-password").await;

    for (title, category) in [("alpha", "Work"), ("beta", "Personal")] {
        ctx.send_json(
            "POST",
            "/api/tasks",
            Some(&token),
            Some(json!({ "title": title, "category": category })),
        )
        .await;
    }

    let response = ctx
        .send_json("GET", "/api/tasks?category=Work", Some(&token), None)
        .await;
    let tasks = read_json(response).await;
    assert_eq!(tasks.as_array().unwrap().len(), 1);
    assert_eq!(tasks[0]["title"], "alpha");

    // "all" disables the filter.
    let response = ctx
        .send_json("GET", "/api/tasks?category=all", Some(&token), None)
        .await;
    assert_eq!(read_json(response).await.as_array().unwrap().len(), 2);

    let response = ctx
        .send_json("GET", "/api/tasks?search=ALPH", Some(&token), None)
        .await;
    let tasks = read_json(response).await;
    assert_eq!(tasks.as_array().unwrap().len(), 1);
    assert_eq!(tasks[0]["title"], "alpha");
}

#[tokio::test]
async fn test_export_csv_and_json() {
    let ctx = TestContext::new().await.unwrap();
    let token = ctx.register("export@example.com", "long-password").await;

    ctx.send_json(
        "POST",
        "/api/tasks",
        Some(&token),
        Some(json!({ "title": "Say \"hello\"" })),
    )
    .await;

    // JSON is the default format.
    let response = ctx
        .send_json("GET", "/api/tasks/export", Some(&token), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"].to_str().unwrap(),
        "application/json"
    );
    assert!(response.headers()["content-disposition"]
        .to_str()
        .unwrap()
        .contains("tasks.json"));
    let exported: serde_json::Value =
        serde_json::from_str(&read_text(response).await).unwrap();
    assert_eq!(exported.as_array().unwrap().len(), 1);

    let response = ctx
        .send_json("GET", "/api/tasks/export?format=csv", Some(&token), None)
        .await;
    assert_eq!(
        response.headers()["content-type"].to_str().unwrap(),
        "text/csv"
    );
    assert!(response.headers()["content-disposition"]
        .to_str()
        .unwrap()
        .contains("tasks.csv"));
    let csv = read_text(response).await;
    assert!(csv.starts_with("id,title,"));
    assert!(csv.contains("\"Say \"\"hello\"\"\""));
}

#[tokio::test]
async fn test_analytics_summary() {
    let ctx = TestContext::new().await.unwrap();
    let token = ctx.register("stats@example.com", "long-password").await;

    for (title, priority) in [("one", "low"), ("two", "high"), ("three", "high")] {
        ctx.send_json(
            "POST",
            "/api/tasks",
            Some(&token),
            Some(json!({ "title": title, "priority": priority })),
        )
        .await;
    }

    // Complete the first task.
    let response = ctx.send_json("GET", "/api/tasks", Some(&token), None).await;
    let tasks = read_json(response).await;
    let id = tasks.as_array().unwrap()[0]["id"].as_i64().unwrap();
    ctx.send_json("PATCH", &format!("/api/tasks/{id}/complete"), Some(&token), None)
        .await;

    let response = ctx
        .send_json("GET", "/api/analytics/summary", Some(&token), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let summary = read_json(response).await;

    assert_eq!(summary["total"], 3);
    assert_eq!(summary["completed"], 1);
    assert_eq!(summary["active"], 2);
    assert_eq!(summary["created_last_week"], 3);
    assert_eq!(summary["by_priority"]["high"], 2);
    assert_eq!(summary["by_priority"]["low"], 1);
    assert_eq!(summary["by_category"]["Personal"], 3);

    // The completion happened just now, so the trend holds exactly one
    // point: today's date with one completion.
    let trend = summary["trend"].as_array().unwrap();
    assert_eq!(trend.len(), 1);
    let today = chrono::Utc::now().format("%Y-%m-%d").to_string();
    assert_eq!(trend[0]["date"], today.as_str());
    assert_eq!(trend[0]["count"], 1);
}

#[tokio::test]
async fn test_analytics_trend_is_empty_without_completions() {
    let ctx = TestContext::new().await.unwrap();
    let token = ctx.register("no-trend@example.com", "long-password").await;

    ctx.send_json(
        "POST",
        "/api/tasks",
        Some(&token),
        Some(json!({ "title": "still active" })),
    )
    .await;

    let response = ctx
        .send_json("GET", "/api/analytics/summary", Some(&token), None)
        .await;
    let summary = read_json(response).await;
    assert_eq!(summary["trend"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_admin_requires_key() {
    let ctx = TestContext::new().await.unwrap();

    let response = ctx.send_json("GET", "/api/admin/users", None, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let request = axum::http::Request::builder()
        .method("GET")
        .uri("/api/admin/users")
        .header("x-admin-key", "wrong-key")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = ctx.send(request).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_user_management() {
    let ctx = TestContext::new().await.unwrap();
    let token = ctx.register("managed@example.com", "long-password").await;

    ctx.send_json(
        "POST",
        "/api/tasks",
        Some(&token),
        Some(json!({ "title": "will vanish" })),
    )
    .await;

    // Listing shows the user with their task count.
    let request = axum::http::Request::builder()
        .method("GET")
        .uri("/api/admin/users")
        .header("x-admin-key", TEST_ADMIN_KEY)
        .body(axum::body::Body::empty())
        .unwrap();
    let response = ctx.send(request).await;
    assert_eq!(response.status(), StatusCode::OK);
    let users = read_json(response).await;
    let users = users.as_array().unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["email"], "managed@example.com");
    assert_eq!(users[0]["task_count"], 1);
    let user_id = users[0]["id"].as_i64().unwrap();

    // Password reset: old password stops working, "12345678" works.
    let request = axum::http::Request::builder()
        .method("PATCH")
        .uri(format!("/api/admin/users/{user_id}/reset-password"))
        .header("x-admin-key", TEST_ADMIN_KEY)
        .body(axum::body::Body::empty())
        .unwrap();
    let response = ctx.send(request).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = ctx
        .send_json(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": "managed@example.com", "password": "long-password" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = ctx
        .send_json(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": "managed@example.com", "password": "12345678" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    // Cascade delete removes the user and their tasks.
    let request = axum::http::Request::builder()
        .method("DELETE")
        .uri(format!("/api/admin/users/{user_id}"))
        .header("x-admin-key", TEST_ADMIN_KEY)
        .body(axum::body::Body::empty())
        .unwrap();
    let response = ctx.send(request).await;
    assert_eq!(response.status(), StatusCode::OK);

    let request = axum::http::Request::builder()
        .method("GET")
        .uri("/api/admin/users")
        .header("x-admin-key", TEST_ADMIN_KEY)
        .body(axum::body::Body::empty())
        .unwrap();
    let response = ctx.send(request).await;
    let users = read_json(response).await;
    assert_eq!(users.as_array().unwrap().len(), 0);
}
