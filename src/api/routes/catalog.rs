//! Remote catalog API routes.

use axum::{
    extract::{Path, State},
    response::Json,
    routing::get,
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::api::error::{ApiError, ApiResult};
use crate::catalog::{CatalogOutcome, CatalogState, MeetingCategory};
use crate::engine::Engine;

pub fn router(engine: Arc<Engine>) -> Router {
    Router::new()
        .route("/", get(current).delete(close))
        .route("/:category", get(list))
        .with_state(engine)
}

/// GET /catalog - What the catalog currently shows.
async fn current(State(engine): State<Arc<Engine>>) -> Json<CatalogState> {
    Json(engine.catalog().await)
}

/// GET /catalog/:category - Fetch past, live or upcoming meetings.
///
/// Always 200 for a known category; the outcome's `status` says what happened.
async fn list(
    State(engine): State<Arc<Engine>>,
    Path(category): Path<String>,
) -> ApiResult<Json<CatalogOutcome>> {
    let category = MeetingCategory::parse(&category).ok_or_else(|| {
        ApiError::bad_request(format!(
            "Unknown category '{}'. Use past, live or upcoming.",
            category
        ))
    })?;
    Ok(Json(engine.list_remote(category).await))
}

/// DELETE /catalog - Close the catalog view.
async fn close(State(engine): State<Arc<Engine>>) -> Json<Value> {
    engine.close_catalog().await;
    Json(json!({ "success": true }))
}
