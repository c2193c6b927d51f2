//! # TaskDeck API Server
//!
//! HTTP server for the TaskDeck task manager. It runs against either a
//! pooled PostgreSQL database or a local SQLite file; the engine is chosen
//! once at startup from the presence of `DATABASE_URL` and injected
//! everywhere as a connected gateway.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p taskdeck-api
//! ```

use anyhow::Context;
use taskdeck_api::{
    app::{build_router, AppState},
    config::Config,
};
use taskdeck_shared::db::{schema, Dialect, Gateway};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taskdeck_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "TaskDeck API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env().context("failed to load configuration")?;

    let gateway = match config.dialect() {
        Dialect::Postgres => {
            let url = config
                .database
                .url
                .as_deref()
                .context("DATABASE_URL vanished after dialect resolution")?;
            Gateway::connect_postgres(url, config.database.max_connections)
                .await
                .context("failed to connect to PostgreSQL")?
        }
        Dialect::Sqlite => Gateway::connect_sqlite(&config.database.sqlite_path)
            .await
            .context("failed to open SQLite database")?,
    };

    tracing::info!(dialect = gateway.dialect().name(), "database connected");

    // Best-effort: failures are logged and the server still starts.
    schema::initialize(&gateway).await;

    let bind_address = config.bind_address();
    let state = AppState::new(gateway, config);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("failed to bind {bind_address}"))?;

    tracing::info!("Server listening on http://{bind_address}");

    axum::serve(listener, app).await?;

    Ok(())
}
