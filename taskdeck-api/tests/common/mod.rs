/// Common test utilities for integration tests
///
/// Provides a full application instance backed by an in-memory SQLite
/// database, plus helpers for registering users and issuing requests.

use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use taskdeck_api::app::{build_router, AppState};
use taskdeck_api::config::{ApiConfig, Config, DatabaseConfig, JwtConfig};
use taskdeck_shared::db::{schema, Gateway};
use tower::ServiceExt;

pub const TEST_ADMIN_KEY: &str = "test-admin-key";

/// Test context containing the app and its gateway
pub struct TestContext {
    pub db: Gateway,
    pub app: axum::Router,
}

impl TestContext {
    /// Creates a new test context with a fresh in-memory database
    pub async fn new() -> anyhow::Result<Self> {
        let config = Config {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors_origins: vec!["*".to_string()],
            },
            database: DatabaseConfig {
                url: None,
                sqlite_path: ":memory:".to_string(),
                max_connections: 1,
            },
            jwt: JwtConfig {
                secret: "test-secret-key-at-least-32-bytes-long".to_string(),
                expires_hours: 168,
            },
            admin_key: Some(TEST_ADMIN_KEY.to_string()),
        };

        let db = Gateway::connect_sqlite_in_memory().await?;
        schema::initialize(&db).await;

        let state = AppState::new(db.clone(), config);
        let app = build_router(state);

        Ok(TestContext { db, app })
    }

    /// Sends a request through the router
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.app
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible")
    }

    /// Sends a JSON request, optionally authenticated
    pub async fn send_json(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<serde_json::Value>,
    ) -> Response<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json");

        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }

        let body = match body {
            Some(json) => Body::from(json.to_string()),
            None => Body::empty(),
        };

        self.send(builder.body(body).expect("valid request")).await
    }

    /// Registers a user and returns their bearer token
    pub async fn register(&self, email: &str, password: &str) -> String {
        let response = self
            .send_json(
                "POST",
                "/api/auth/register",
                None,
                Some(serde_json::json!({ "email": email, "password": password })),
            )
            .await;

        assert_eq!(response.status(), StatusCode::CREATED);
        let json = read_json(response).await;
        json["token"]
            .as_str()
            .expect("registration returns a token")
            .to_string()
    }
}

/// Reads a response body as JSON
pub async fn read_json(response: Response<Body>) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body is readable");
    serde_json::from_slice(&body).expect("body is JSON")
}

/// Reads a response body as a string
pub async fn read_text(response: Response<Body>) -> String {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body is readable");
    String::from_utf8(body.to_vec()).expect("body is UTF-8")
}
