//! REST API server for meetsync.
//!
//! The read/command interface the presentation layer talks to:
//! - Session state, connect and confirmed disconnect
//! - Remote catalog browsing
//! - Meeting, participant and recording sync
//! - Attendance statistics
//! - A server-sent event stream of engine notifications

pub mod error;
pub mod routes;

use crate::config::Config;
use crate::engine::Engine;
use anyhow::{Context, Result};
use axum::{response::Json, routing::get, Router};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tracing::info;

pub struct ApiServer {
    port: u16,
    engine: Arc<Engine>,
}

impl ApiServer {
    pub fn new(engine: Arc<Engine>, config: &Config) -> Self {
        Self {
            port: config.server.port,
            engine,
        }
    }

    pub fn router(engine: Arc<Engine>) -> Router {
        Router::new()
            .route("/", get(status))
            .nest("/session", routes::session::router(engine.clone()))
            .nest("/catalog", routes::catalog::router(engine.clone()))
            .nest("/meetings", routes::meetings::router(engine.clone()))
            .nest("/events", routes::events::router(engine))
            .layer(ServiceBuilder::new())
    }

    pub async fn start(self) -> Result<()> {
        let addr = format!("127.0.0.1:{}", self.port);
        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Failed to bind API server to {}", addr))?;

        info!("API server listening on http://{}", addr);
        info!("Endpoints:");
        info!("  GET    /                               - Service info");
        info!("  GET    /session                        - Last known auth state");
        info!("  POST   /session/check                  - Check auth status now");
        info!("  POST   /session/connect                - Get authorization URL");
        info!("  POST   /session/disconnect             - Disconnect (requires confirm)");
        info!("  GET    /catalog/:category              - List past/live/upcoming meetings");
        info!("  DELETE /catalog                        - Close the catalog");
        info!("  GET    /meetings                       - List synced meetings");
        info!("  GET    /meetings/:id                   - Get a synced meeting");
        info!("  POST   /meetings/:id/sync              - Sync a meeting");
        info!("  POST   /meetings/:id/participants/sync - Sync participants");
        info!("  POST   /meetings/:id/recordings/sync   - Sync recordings");
        info!("  GET    /meetings/:id/stats             - Attendance statistics");
        info!("  GET    /events                         - Engine notifications (SSE)");

        self.serve(listener).await
    }

    /// Serve on an already bound listener, polling auth status while running.
    pub async fn serve(self, listener: TcpListener) -> Result<()> {
        let poller = self.engine.spawn_auth_poller();
        let app = Self::router(self.engine);

        let result = axum::serve(listener, app).await;
        poller.stop().await;
        result.context("API server failed")
    }
}

async fn status() -> Json<Value> {
    Json(json!({
        "service": "meetsync",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running"
    }))
}
