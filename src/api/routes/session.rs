//! Session (auth) API routes.

use axum::{
    extract::State,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

use crate::api::error::{ApiError, ApiResult};
use crate::auth::{AuthState, Confirmed};
use crate::engine::Engine;

#[derive(Debug, Default, Deserialize)]
pub struct DisconnectRequest {
    #[serde(default)]
    pub confirm: bool,
}

pub fn router(engine: Arc<Engine>) -> Router {
    Router::new()
        .route("/", get(current))
        .route("/check", post(check))
        .route("/connect", post(connect))
        .route("/disconnect", post(disconnect))
        .with_state(engine)
}

/// GET /session - Last known auth state, without contacting the backend.
async fn current(State(engine): State<Arc<Engine>>) -> Json<AuthState> {
    Json(engine.auth_state().await)
}

/// POST /session/check - Check auth status now.
async fn check(State(engine): State<Arc<Engine>>) -> Json<Value> {
    let authenticated = engine.check_status().await;
    Json(json!({ "authenticated": authenticated }))
}

/// POST /session/connect - Get the provider authorization URL.
async fn connect(State(engine): State<Arc<Engine>>) -> ApiResult<Json<Value>> {
    let auth_url = engine.initiate_connect().await?;
    Ok(Json(json!({ "auth_url": auth_url })))
}

/// POST /session/disconnect - Revoke credentials. Requires `{"confirm": true}`.
async fn disconnect(
    State(engine): State<Arc<Engine>>,
    body: Option<Json<DisconnectRequest>>,
) -> ApiResult<Json<Value>> {
    let request = body.map(|Json(req)| req).unwrap_or_default();
    let confirmed = Confirmed::from_answer(request.confirm).ok_or_else(|| {
        ApiError::bad_request("Disconnect must be confirmed with {\"confirm\": true}")
    })?;

    info!("Disconnect requested via API");
    engine.disconnect(confirmed).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Disconnected. All previously loaded meeting data must be reloaded.",
    })))
}
