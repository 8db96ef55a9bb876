//! Composition root: one [`Engine`] owns every component and the state they share.

use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::info;

use crate::auth::{AuthSessionMonitor, AuthState, Confirmed};
use crate::backend::{
    Backend, BackendResult, BackendStats, HttpBackend, Page, RemoteId, SyncedMeeting,
    MAX_PAGE_SIZE,
};
use crate::catalog::{CatalogOutcome, CatalogState, MeetingCategory, RemoteCatalogFetcher};
use crate::config::Config;
use crate::events::{EngineEvent, EventBus};
use crate::schedule::PeriodicTask;
use crate::stats::{compute_stats, DerivedStats};
use crate::sync::{
    InFlightRegistry, ParticipantSync, RecordingSync, SubResourceSyncer, SyncError,
    SyncOrchestrator, SyncResult,
};

pub struct Engine {
    backend: Arc<dyn Backend>,
    auth: Arc<AuthSessionMonitor>,
    catalog: RemoteCatalogFetcher,
    orchestrator: SyncOrchestrator,
    resources: SubResourceSyncer,
    in_flight: InFlightRegistry,
    events: EventBus,
    poll_interval: std::time::Duration,
}

impl Engine {
    pub fn new(backend: Arc<dyn Backend>, config: &Config) -> Self {
        let events = EventBus::default();
        let in_flight = InFlightRegistry::default();
        let page_size = config.backend.page_size.clamp(1, MAX_PAGE_SIZE);

        Self {
            auth: Arc::new(AuthSessionMonitor::new(backend.clone(), events.clone())),
            catalog: RemoteCatalogFetcher::new(backend.clone()),
            orchestrator: SyncOrchestrator::new(
                backend.clone(),
                config.sync.meeting_policy(),
                page_size,
                in_flight.clone(),
                events.clone(),
            ),
            resources: SubResourceSyncer::new(
                backend.clone(),
                config.sync.subresource_policy(),
                in_flight.clone(),
                events.clone(),
            ),
            backend,
            in_flight,
            events,
            poll_interval: config.auth.poll_interval(),
        }
    }

    /// Engine talking HTTP to the configured backend.
    pub fn from_config(config: &Config) -> BackendResult<Self> {
        let backend = HttpBackend::from_config(&config.backend)?;
        info!("Using sync backend at {}", backend.base_url());
        Ok(Self::new(Arc::new(backend), config))
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }

    pub fn in_flight(&self) -> &InFlightRegistry {
        &self.in_flight
    }

    // Session

    pub async fn auth_state(&self) -> AuthState {
        self.auth.current().await
    }

    pub async fn check_status(&self) -> bool {
        self.auth.check_status().await.authenticated
    }

    pub async fn initiate_connect(&self) -> BackendResult<String> {
        self.auth.initiate_connect().await
    }

    /// Revoke credentials and drop everything fetched under them.
    pub async fn disconnect(&self, confirmed: Confirmed) -> BackendResult<()> {
        self.auth.disconnect(confirmed).await?;
        self.catalog.close().await;
        self.events.publish(EngineEvent::SessionInvalidated);
        Ok(())
    }

    /// Start polling auth status at the configured interval.
    pub fn spawn_auth_poller(&self) -> PeriodicTask {
        self.auth.spawn_poller(self.poll_interval)
    }

    // Catalog

    pub async fn list_remote(&self, category: MeetingCategory) -> CatalogOutcome {
        self.catalog.list_remote(category).await
    }

    pub async fn catalog(&self) -> CatalogState {
        self.catalog.current().await
    }

    pub async fn close_catalog(&self) {
        self.catalog.close().await;
    }

    // Local meetings

    pub async fn list_meetings(
        &self,
        limit: u32,
        offset: u32,
    ) -> BackendResult<Vec<SyncedMeeting>> {
        let page = Page {
            limit: limit.clamp(1, MAX_PAGE_SIZE),
            offset,
        };
        self.backend.list_meetings(page).await
    }

    pub async fn get_meeting(&self, remote_id: &RemoteId) -> SyncResult<SyncedMeeting> {
        self.backend
            .get_meeting(remote_id)
            .await?
            .ok_or_else(|| SyncError::UnknownMeeting(remote_id.clone()))
    }

    // Sync

    pub async fn sync_meeting(&self, remote_id: &RemoteId) -> SyncResult<SyncedMeeting> {
        self.orchestrator.sync(remote_id).await
    }

    pub async fn sync_participants(&self, remote_id: &RemoteId) -> SyncResult<ParticipantSync> {
        self.resources.sync_participants(remote_id).await
    }

    pub async fn sync_recordings(&self, remote_id: &RemoteId) -> SyncResult<RecordingSync> {
        self.resources.sync_recordings(remote_id).await
    }

    pub async fn download_recording(
        &self,
        remote_id: &RemoteId,
        recording_id: &str,
    ) -> BackendResult<String> {
        let path = self
            .backend
            .download_recording(remote_id, recording_id)
            .await?;
        info!(
            "Recording {} of meeting {} stored at {}",
            recording_id, remote_id, path
        );
        Ok(path)
    }

    // Stats

    /// Stats over the participants stored right now.
    pub async fn stats(&self, remote_id: &RemoteId) -> SyncResult<DerivedStats> {
        let meeting = self.get_meeting(remote_id).await?;
        Ok(compute_stats(&meeting.participants))
    }

    /// The backend's own figures, for comparison.
    pub async fn backend_stats(&self, remote_id: &RemoteId) -> BackendResult<BackendStats> {
        self.backend.get_stats(remote_id).await
    }
}
