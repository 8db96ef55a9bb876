//! Meeting sync: command the backend to ingest a remote meeting, wait for the
//! write to settle, and confirm it by re-reading the local meeting list.

use std::sync::Arc;
use tracing::{error, info, warn};

use super::guard::{InFlightRegistry, SyncKind};
use super::settle::{settle_and_verify, SettlePolicy, Verification};
use super::{SyncError, SyncResult};
use crate::backend::{fetch_all_meetings, Backend, RemoteId, SyncedMeeting};
use crate::events::{EngineEvent, EventBus};

pub struct SyncOrchestrator {
    backend: Arc<dyn Backend>,
    policy: SettlePolicy,
    page_size: u32,
    in_flight: InFlightRegistry,
    events: EventBus,
}

impl SyncOrchestrator {
    pub fn new(
        backend: Arc<dyn Backend>,
        policy: SettlePolicy,
        page_size: u32,
        in_flight: InFlightRegistry,
        events: EventBus,
    ) -> Self {
        Self {
            backend,
            policy,
            page_size,
            in_flight,
            events,
        }
    }

    pub fn in_flight(&self) -> &InFlightRegistry {
        &self.in_flight
    }

    /// Sync one remote meeting into local storage and return the stored copy.
    ///
    /// A concurrent call for the same id is rejected with
    /// [`SyncError::AlreadySyncing`] without contacting the backend. A failed
    /// sync command aborts before any wait. If the meeting never shows up,
    /// [`SyncError::VerificationFailed`] is returned and
    /// [`EngineEvent::ReloadRequired`] published.
    pub async fn sync(&self, remote_id: &RemoteId) -> SyncResult<SyncedMeeting> {
        let _guard = self
            .in_flight
            .try_acquire(SyncKind::Meeting, remote_id)
            .ok_or_else(|| {
                warn!("Sync for meeting {} already in flight, rejecting", remote_id);
                SyncError::AlreadySyncing {
                    kind: SyncKind::Meeting,
                    id: remote_id.clone(),
                }
            })?;

        info!("Syncing meeting {}", remote_id);

        let ack = self.backend.sync_meeting(remote_id).await.map_err(|e| {
            error!("Sync command for meeting {} failed: {}", remote_id, e);
            SyncError::Backend(e)
        })?;

        if let Some(message) = ack.message.as_deref() {
            info!("Backend acknowledged sync of {}: {}", remote_id, message);
        }
        if let Some(note) = ack.note.as_deref() {
            info!("Backend note for {}: {}", remote_id, note);
        }

        let backend = self.backend.as_ref();
        let page_size = self.page_size;
        let verification = settle_and_verify(
            &self.policy,
            || fetch_all_meetings(backend, page_size),
            |meetings| meetings.into_iter().find(|m| &m.remote_id == remote_id),
        )
        .await?;

        match verification {
            Verification::Verified(meeting) => {
                info!(
                    "Meeting {} synced (local id {})",
                    remote_id, meeting.local_id
                );
                self.events.publish(EngineEvent::MeetingSynced {
                    remote_id: meeting.remote_id.clone(),
                    local_id: meeting.local_id,
                });
                Ok(meeting)
            }
            Verification::ReloadRequired => {
                warn!(
                    "Meeting {} not found in local list after sync, reload required",
                    remote_id
                );
                self.events
                    .publish(EngineEvent::reload_required(remote_id, SyncKind::Meeting));
                Err(SyncError::VerificationFailed {
                    kind: SyncKind::Meeting,
                    id: remote_id.clone(),
                })
            }
        }
    }
}
