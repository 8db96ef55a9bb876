//! Synced meeting API routes.
//!
//! `:id` is always the provider's meeting id.

use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

use crate::api::error::ApiResult;
use crate::backend::{Participant, Recording, RemoteId, SyncedMeeting, MAX_PAGE_SIZE};
use crate::engine::Engine;
use crate::stats::DerivedStats;

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct MeetingList {
    pub meetings: Vec<SyncedMeeting>,
    /// Remote ids with a sync still running.
    pub syncing: Vec<RemoteId>,
}

#[derive(Debug, Serialize)]
pub struct ParticipantSyncResponse {
    pub success: bool,
    pub participants: Vec<Participant>,
    pub message: String,
    /// Set when zero participants is an expected outcome rather than a failure.
    pub advisory: Option<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct RecordingSyncResponse {
    pub success: bool,
    pub recordings: Vec<Recording>,
    pub message: String,
    pub advisory: Option<&'static str>,
}

pub fn router(engine: Arc<Engine>) -> Router {
    Router::new()
        .route("/", get(list_meetings))
        .route("/:id", get(get_meeting))
        .route("/:id/sync", post(sync_meeting))
        .route("/:id/participants/sync", post(sync_participants))
        .route("/:id/recordings/sync", post(sync_recordings))
        .route("/:id/stats", get(stats))
        .with_state(engine)
}

/// GET /meetings - One page of synced meetings.
async fn list_meetings(
    State(engine): State<Arc<Engine>>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<MeetingList>> {
    let meetings = engine
        .list_meetings(
            params.limit.unwrap_or(MAX_PAGE_SIZE),
            params.offset.unwrap_or(0),
        )
        .await?;

    Ok(Json(MeetingList {
        meetings,
        syncing: engine.in_flight().in_flight_meetings(),
    }))
}

/// GET /meetings/:id - One synced meeting with its participants and recordings.
async fn get_meeting(
    State(engine): State<Arc<Engine>>,
    Path(id): Path<String>,
) -> ApiResult<Json<SyncedMeeting>> {
    Ok(Json(engine.get_meeting(&RemoteId::from(id)).await?))
}

/// POST /meetings/:id/sync - Sync and verify a remote meeting.
async fn sync_meeting(
    State(engine): State<Arc<Engine>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let remote_id = RemoteId::from(id);
    info!("Sync requested via API for meeting {}", remote_id);

    let meeting = engine.sync_meeting(&remote_id).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Meeting synced successfully",
        "meeting": meeting,
    })))
}

/// POST /meetings/:id/participants/sync
async fn sync_participants(
    State(engine): State<Arc<Engine>>,
    Path(id): Path<String>,
) -> ApiResult<Json<ParticipantSyncResponse>> {
    let result = engine.sync_participants(&RemoteId::from(id)).await?;
    Ok(Json(ParticipantSyncResponse {
        success: true,
        message: result.summary(),
        advisory: result.advisory(),
        participants: result.participants,
    }))
}

/// POST /meetings/:id/recordings/sync
async fn sync_recordings(
    State(engine): State<Arc<Engine>>,
    Path(id): Path<String>,
) -> ApiResult<Json<RecordingSyncResponse>> {
    let result = engine.sync_recordings(&RemoteId::from(id)).await?;
    Ok(Json(RecordingSyncResponse {
        success: true,
        message: result.summary(),
        advisory: result.advisory(),
        recordings: result.recordings,
    }))
}

/// GET /meetings/:id/stats - Recomputed from stored participants on every call.
async fn stats(
    State(engine): State<Arc<Engine>>,
    Path(id): Path<String>,
) -> ApiResult<Json<DerivedStats>> {
    Ok(Json(engine.stats(&RemoteId::from(id)).await?))
}
