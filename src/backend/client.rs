//! HTTP client for the sync backend's REST API.

use async_trait::async_trait;
use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error};

use super::error::BackendError;
use super::types::{
    AuthSession, AuthUrlResponse, BackendStats, DownloadResponse, MeetingListResponse, Page,
    Participant, ParticipantListResponse, Recording, RecordingListResponse, RemoteId, SyncAck,
    SyncedMeeting,
};
use super::{Backend, BackendResult};
use crate::catalog::MeetingCategory;
use crate::config::BackendConfig;

/// Client for the backend that ingests provider data into local storage.
pub struct HttpBackend {
    client: reqwest::Client,
    base: Url,
    provider: String,
}

impl HttpBackend {
    /// Create a new client with the given base URL.
    pub fn new(base_url: &str, provider: &str, timeout: Duration) -> BackendResult<Self> {
        let base = Url::parse(base_url.trim())
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| BackendError::Transport(format!("Invalid backend URL: {base_url}")))?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::transport(&e))?;

        Ok(Self {
            client,
            base,
            provider: provider.to_string(),
        })
    }

    pub fn from_config(config: &BackendConfig) -> BackendResult<Self> {
        Self::new(&config.base_url, &config.provider, config.request_timeout())
    }

    pub fn base_url(&self) -> &str {
        self.base.as_str().trim_end_matches('/')
    }

    /// Append path segments to the base URL. Each segment is percent-encoded,
    /// so ids containing `/`, `?` or `#` stay inside their own segment.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn meeting_url(&self, id: &RemoteId, suffix: &[&str]) -> Url {
        let mut segments = vec!["api", "meetings", id.as_str()];
        segments.extend_from_slice(suffix);
        self.url(&segments)
    }

    /// Send a request and return the status with the raw body text.
    async fn send(
        &self,
        method: Method,
        url: Url,
        query: &[(&str, String)],
    ) -> BackendResult<(StatusCode, String)> {
        debug!("{} {}", method, url);

        let response = self
            .client
            .request(method.clone(), url.clone())
            .query(query)
            .send()
            .await
            .map_err(|e| {
                error!("{} {} failed: {}", method, url, e);
                BackendError::transport(&e)
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| BackendError::transport(&e))?;

        Ok((status, body))
    }

    /// Send a request, fail on non-2xx, and decode the body as `T`.
    async fn request_json<T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        query: &[(&str, String)],
    ) -> BackendResult<T> {
        let path = url.path().to_string();
        let (status, body) = self.send(method, url, query).await?;

        if !status.is_success() {
            return Err(BackendError::from_status(status.as_u16(), &body));
        }

        serde_json::from_str(&body).map_err(|e| {
            debug!("Undecodable body from {}: {}", path, body);
            BackendError::Malformed(e.to_string())
        })
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn auth_url(&self) -> BackendResult<String> {
        let url = self.url(&["auth", self.provider.as_str()]);
        let response: AuthUrlResponse = self.request_json(Method::GET, url, &[]).await?;
        Ok(response.auth_url)
    }

    async fn auth_status(&self) -> BackendResult<AuthSession> {
        self.request_json(Method::GET, self.url(&["auth", "status"]), &[])
            .await
    }

    async fn disconnect(&self) -> BackendResult<()> {
        let (status, body) = self
            .send(Method::POST, self.url(&["auth", "disconnect"]), &[])
            .await?;
        if !status.is_success() {
            return Err(BackendError::from_status(status.as_u16(), &body));
        }
        Ok(())
    }

    async fn list_meetings(&self, page: Page) -> BackendResult<Vec<SyncedMeeting>> {
        let query = [
            ("limit", page.limit.to_string()),
            ("offset", page.offset.to_string()),
        ];
        let response: MeetingListResponse =
            self
            .request_json(Method::GET, self.url(&["api", "meetings"]), &query)
            .await?;
        Ok(response.meetings)
    }

    async fn list_remote(&self, category: MeetingCategory) -> BackendResult<Value> {
        let query = [("type", category.as_str().to_string())];
        let (status, body) = self
            .send(
                Method::GET,
                self.url(&["api", "meetings", "remote", "list"]),
                &query,
            )
            .await?;

        if !status.is_success() {
            return Err(BackendError::from_status(status.as_u16(), &body));
        }

        // Shape problems are the catalog's call, not a transport failure.
        Ok(serde_json::from_str(&body).unwrap_or(Value::Null))
    }

    async fn get_meeting(&self, id: &RemoteId) -> BackendResult<Option<SyncedMeeting>> {
        match self
            .request_json::<SyncedMeeting>(Method::GET, self.meeting_url(id, &[]), &[])
            .await
        {
            Ok(meeting) => Ok(Some(meeting)),
            Err(BackendError::Status { status: 404, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn sync_meeting(&self, id: &RemoteId) -> BackendResult<SyncAck> {
        let (status, body) = self
            .send(Method::POST, self.meeting_url(id, &["sync"]), &[])
            .await?;

        if !status.is_success() {
            return Err(BackendError::from_status(status.as_u16(), &body));
        }

        // An ack with an unexpected body is still an ack.
        Ok(serde_json::from_str(&body).unwrap_or_default())
    }

    async fn get_stats(&self, id: &RemoteId) -> BackendResult<BackendStats> {
        self.request_json(Method::GET, self.meeting_url(id, &["stats"]), &[])
            .await
    }

    async fn sync_participants(&self, id: &RemoteId) -> BackendResult<Vec<Participant>> {
        let response: ParticipantListResponse = self
            .request_json(
                Method::POST,
                self.meeting_url(id, &["participants", "sync"]),
                &[],
            )
            .await?;
        Ok(response.participants)
    }

    async fn list_recordings(&self, id: &RemoteId) -> BackendResult<Vec<Recording>> {
        let response: RecordingListResponse = self
            .request_json(Method::GET, self.meeting_url(id, &["recordings"]), &[])
            .await?;
        Ok(response.recordings)
    }

    async fn sync_recordings(&self, id: &RemoteId) -> BackendResult<Vec<Recording>> {
        let response: RecordingListResponse = self
            .request_json(
                Method::POST,
                self.meeting_url(id, &["recordings", "sync"]),
                &[],
            )
            .await?;
        Ok(response.recordings)
    }

    async fn download_recording(
        &self,
        id: &RemoteId,
        recording_id: &str,
    ) -> BackendResult<String> {
        let url = self.meeting_url(id, &["recordings", recording_id, "download"]);
        let response: DownloadResponse = self.request_json(Method::POST, url, &[]).await?;
        Ok(response.file_path)
    }
}
