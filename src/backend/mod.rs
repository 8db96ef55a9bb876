//! Boundary to the sync backend.
//!
//! The backend owns provider credentials and local storage; the engine only
//! issues commands and reads results through [`Backend`].

pub mod client;
pub mod error;
pub mod types;

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashSet;
use tracing::warn;

use crate::catalog::MeetingCategory;

pub use client::HttpBackend;
pub use error::BackendError;
pub use types::{
    AuthSession, BackendStats, Page, Participant, Recording, RemoteId, RemoteMeetingSummary,
    SyncAck, SyncedMeeting,
};

pub type BackendResult<T> = Result<T, BackendError>;

/// Largest `limit` the meetings list endpoint accepts.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Upper bound on pages walked by [`fetch_all_meetings`].
pub const MAX_PAGES: usize = 1_000;

/// Operations the engine consumes from the backend.
///
/// Meeting routes are keyed by the remote identifier.
#[async_trait]
pub trait Backend: Send + Sync {
    /// `GET /auth/{provider}`: URL to hand to the browser.
    async fn auth_url(&self) -> BackendResult<String>;

    /// `GET /auth/status`
    async fn auth_status(&self) -> BackendResult<AuthSession>;

    /// `POST /auth/disconnect`: invalidates the backend-held credential.
    async fn disconnect(&self) -> BackendResult<()>;

    /// `GET /api/meetings?limit&offset`
    async fn list_meetings(&self, page: Page) -> BackendResult<Vec<SyncedMeeting>>;

    /// `GET /api/meetings/remote/list?type`. Returns the raw payload so the
    /// catalog can classify its shape; `Value::Null` for an empty body.
    async fn list_remote(&self, category: MeetingCategory) -> BackendResult<Value>;

    /// `GET /api/meetings/{id}`. `Ok(None)` when the backend answers 404.
    async fn get_meeting(&self, id: &RemoteId) -> BackendResult<Option<SyncedMeeting>>;

    /// `POST /api/meetings/{id}/sync`. Ingestion may complete after this returns.
    async fn sync_meeting(&self, id: &RemoteId) -> BackendResult<SyncAck>;

    /// `GET /api/meetings/{id}/stats`
    async fn get_stats(&self, id: &RemoteId) -> BackendResult<BackendStats>;

    /// `POST /api/meetings/{id}/participants/sync`
    async fn sync_participants(&self, id: &RemoteId) -> BackendResult<Vec<Participant>>;

    /// `GET /api/meetings/{id}/recordings`
    async fn list_recordings(&self, id: &RemoteId) -> BackendResult<Vec<Recording>>;

    /// `POST /api/meetings/{id}/recordings/sync`
    async fn sync_recordings(&self, id: &RemoteId) -> BackendResult<Vec<Recording>>;

    /// `POST /api/meetings/{id}/recordings/{recording_id}/download`: returns
    /// the path the backend stored the file at.
    async fn download_recording(&self, id: &RemoteId, recording_id: &str)
        -> BackendResult<String>;
}

/// Walk `GET /api/meetings` until a page comes back short or adds nothing new.
///
/// Meetings are deduplicated by local id, so a backend that ignores `offset`
/// ends the walk instead of repeating the same page forever.
pub async fn fetch_all_meetings(
    backend: &dyn Backend,
    page_size: u32,
) -> BackendResult<Vec<SyncedMeeting>> {
    let mut page = Page::first(page_size.clamp(1, MAX_PAGE_SIZE));
    let mut meetings = Vec::new();
    let mut seen = HashSet::new();

    for _ in 0..MAX_PAGES {
        let batch = backend.list_meetings(page).await?;
        let short = (batch.len() as u32) < page.limit;
        let before = meetings.len();
        meetings.extend(batch.into_iter().filter(|m| seen.insert(m.local_id)));

        if short {
            return Ok(meetings);
        }
        if meetings.len() == before {
            warn!(
                "Meeting list repeated itself at offset {}, stopping",
                page.offset
            );
            return Ok(meetings);
        }
        page = page.next();
    }

    Err(BackendError::Malformed(format!(
        "meeting list did not end after {MAX_PAGES} pages"
    )))
}
