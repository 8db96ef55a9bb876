//! In-process mock of the sync backend, served by axum on a random port.

#![allow(dead_code)]

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

#[derive(Default)]
pub struct MockState {
    pub authenticated: bool,
    pub disconnects: usize,
    pub sync_calls: HashMap<String, usize>,
    /// Stored meetings as the backend would return them.
    pub meetings: Vec<Value>,
    /// Participants the provider would hand out per meeting id.
    pub provider_participants: HashMap<String, Vec<Value>>,
}

#[derive(Clone, Default)]
pub struct MockBackend {
    pub state: Arc<Mutex<MockState>>,
}

impl MockBackend {
    pub fn sync_calls(&self, id: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .sync_calls
            .get(id)
            .copied()
            .unwrap_or(0)
    }

    pub fn stored_count(&self, id: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .meetings
            .iter()
            .filter(|m| id_of(m) == id)
            .count()
    }

    pub fn set_participants(&self, id: &str, participants: Vec<Value>) {
        self.state
            .lock()
            .unwrap()
            .provider_participants
            .insert(id.to_string(), participants);
    }
}

/// Stored meeting ids are numbers, as the real backend returns them.
fn id_of(meeting: &Value) -> String {
    match &meeting["meeting_id"] {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn detail(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "detail": message }))).into_response()
}

async fn auth_status(State(mock): State<MockBackend>) -> Json<Value> {
    let authenticated = mock.state.lock().unwrap().authenticated;
    Json(json!({ "authenticated": authenticated }))
}

async fn auth_url(Path(provider): Path<String>) -> Json<Value> {
    Json(json!({ "auth_url": format!("https://{provider}.example/oauth/authorize") }))
}

async fn disconnect(State(mock): State<MockBackend>) -> Json<Value> {
    let mut state = mock.state.lock().unwrap();
    state.disconnects += 1;
    state.authenticated = false;
    Json(json!({ "message": "Disconnected" }))
}

async fn list_meetings(
    State(mock): State<MockBackend>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let limit: usize = params.get("limit").and_then(|v| v.parse().ok()).unwrap_or(100);
    if limit > 100 {
        return detail(StatusCode::UNPROCESSABLE_ENTITY, "limit must be <= 100");
    }
    let offset: usize = params.get("offset").and_then(|v| v.parse().ok()).unwrap_or(0);
    let state = mock.state.lock().unwrap();
    let page: Vec<Value> = state.meetings.iter().skip(offset).take(limit).cloned().collect();
    Json(json!({ "meetings": page })).into_response()
}

async fn list_remote(Query(params): Query<HashMap<String, String>>) -> Response {
    match params.get("type").map(String::as_str) {
        Some("past") => Json(json!({
            "meetings": [{
                "meeting_id": "42",
                "topic": "Standup",
                "start_time": "2024-01-01T10:00:00Z",
                "duration": 900
            }]
        }))
        .into_response(),
        Some("live") => Json(json!({ "meetings": [] })).into_response(),
        Some("upcoming") => Json(json!({ "message": "Scope missing for upcoming meetings" }))
            .into_response(),
        _ => detail(StatusCode::BAD_REQUEST, "Unknown meeting type"),
    }
}

async fn get_meeting(State(mock): State<MockBackend>, Path(id): Path<String>) -> Response {
    let state = mock.state.lock().unwrap();
    match state.meetings.iter().find(|m| id_of(m) == id) {
        Some(meeting) => Json(meeting.clone()).into_response(),
        None => detail(StatusCode::NOT_FOUND, "Meeting not found"),
    }
}

async fn sync_meeting(State(mock): State<MockBackend>, Path(id): Path<String>) -> Response {
    match id.as_str() {
        "404" => {
            return detail(
                StatusCode::NOT_FOUND,
                "Meeting 404 not found. Make sure the meeting exists.",
            )
        }
        "500" => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "message": "Provider rate limit exceeded" })),
            )
                .into_response()
        }
        "502" => return (StatusCode::BAD_GATEWAY, "upstream down").into_response(),
        "401" => return detail(StatusCode::UNAUTHORIZED, "Not authenticated"),
        _ => {}
    }

    let mut state = mock.state.lock().unwrap();
    *state.sync_calls.entry(id.clone()).or_default() += 1;

    let numeric: Option<i64> = id.parse().ok();
    let stored_id = numeric.map(Value::from).unwrap_or_else(|| Value::from(id.clone()));
    let local_id = state.meetings.len() as i64 + 1;
    let calls = state.sync_calls[&id];
    let topic = format!("Meeting {id} (sync {calls})");

    if let Some(pos) = state.meetings.iter().position(|m| id_of(m) == id) {
        state.meetings[pos]["topic"] = Value::from(topic);
    } else {
        state.meetings.push(json!({
            "id": local_id,
            "meeting_id": stored_id,
            "topic": topic,
            "start_time": "2024-01-01T10:00:00",
            "duration": 900,
            "participant_count": 0,
        }));
    }

    Json(json!({ "success": true, "message": "Meeting data synced successfully" })).into_response()
}

async fn sync_participants(State(mock): State<MockBackend>, Path(id): Path<String>) -> Response {
    let mut state = mock.state.lock().unwrap();
    let participants = state
        .provider_participants
        .get(&id)
        .cloned()
        .unwrap_or_default();
    let Some(meeting) = state.meetings.iter_mut().find(|m| id_of(m) == id) else {
        return detail(StatusCode::NOT_FOUND, "Meeting not found");
    };
    meeting["participants"] = Value::from(participants.clone());
    meeting["participant_count"] = Value::from(participants.len());
    Json(json!({ "success": true, "participants": participants })).into_response()
}

async fn stats(Path(_id): Path<String>) -> Json<Value> {
    Json(json!({
        "total_participants": 0,
        "avg_duration": 0,
        "min_duration": 0,
        "max_duration": 0,
        "total_duration": 0
    }))
}

pub fn router(mock: MockBackend) -> Router {
    Router::new()
        .route("/auth/status", get(auth_status))
        .route("/auth/disconnect", post(disconnect))
        .route("/auth/:provider", get(auth_url))
        .route("/api/meetings", get(list_meetings))
        .route("/api/meetings/remote/list", get(list_remote))
        .route("/api/meetings/:id", get(get_meeting))
        .route("/api/meetings/:id/sync", post(sync_meeting))
        .route("/api/meetings/:id/participants/sync", post(sync_participants))
        .route("/api/meetings/:id/stats", get(stats))
        .with_state(mock)
}

/// Serve the mock and return its base URL.
pub async fn spawn_mock(mock: MockBackend) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router(mock)).await.unwrap();
    });
    format!("http://{addr}")
}

pub fn authenticated_mock() -> MockBackend {
    let mock = MockBackend::default();
    mock.state.lock().unwrap().authenticated = true;
    mock
}
