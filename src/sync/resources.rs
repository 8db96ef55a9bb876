//! Participant and recording sync for meetings that are already stored locally.

use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};

use super::guard::{InFlightGuard, InFlightRegistry, SyncKind};
use super::settle::{settle_and_verify, SettlePolicy, Verification};
use super::{SyncError, SyncResult};
use crate::backend::{Backend, BackendError, Participant, Recording, RemoteId};
use crate::events::{EngineEvent, EventBus};

/// Shown when a participant sync comes back empty. Providers only expose
/// historical attendance on paid account tiers, so this is not a failure.
pub const PARTICIPANTS_TIER_ADVISORY: &str = "Participants synced, but none were returned. \
Participant data for past meetings requires a paid account tier on most providers. \
The meeting itself is still saved and available.";

pub const NO_RECORDINGS_ADVISORY: &str = "No recordings found for this meeting.";

/// Result of a participant sync.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParticipantSync {
    pub remote_id: RemoteId,
    pub participants: Vec<Participant>,
}

impl ParticipantSync {
    /// Informational text for an empty result; `None` when participants came back.
    pub fn advisory(&self) -> Option<&'static str> {
        self.participants
            .is_empty()
            .then_some(PARTICIPANTS_TIER_ADVISORY)
    }

    pub fn summary(&self) -> String {
        match self.advisory() {
            Some(advisory) => advisory.to_string(),
            None => format!(
                "Successfully synced {} participant(s).",
                self.participants.len()
            ),
        }
    }
}

/// Result of a recording sync.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordingSync {
    pub remote_id: RemoteId,
    pub recordings: Vec<Recording>,
}

impl RecordingSync {
    pub fn advisory(&self) -> Option<&'static str> {
        self.recordings.is_empty().then_some(NO_RECORDINGS_ADVISORY)
    }

    pub fn summary(&self) -> String {
        match self.advisory() {
            Some(advisory) => advisory.to_string(),
            None => format!(
                "Successfully synced {} recording(s).",
                self.recordings.len()
            ),
        }
    }
}

pub struct SubResourceSyncer {
    backend: Arc<dyn Backend>,
    policy: SettlePolicy,
    in_flight: InFlightRegistry,
    events: EventBus,
}

impl SubResourceSyncer {
    pub fn new(
        backend: Arc<dyn Backend>,
        policy: SettlePolicy,
        in_flight: InFlightRegistry,
        events: EventBus,
    ) -> Self {
        Self {
            backend,
            policy,
            in_flight,
            events,
        }
    }

    /// Re-sync the participant list of a stored meeting and return what is
    /// stored afterwards. Zero participants is a valid result.
    pub async fn sync_participants(&self, remote_id: &RemoteId) -> SyncResult<ParticipantSync> {
        let _guard = self.claim(SyncKind::Participants, remote_id)?;
        self.ensure_synced(remote_id).await?;

        info!("Syncing participants for meeting {}", remote_id);
        let returned = self
            .backend
            .sync_participants(remote_id)
            .await
            .map_err(|e| command_failed(SyncKind::Participants, remote_id, e))?;
        info!(
            "Backend returned {} participant(s) for meeting {}",
            returned.len(),
            remote_id
        );

        let backend = self.backend.as_ref();
        let verification = settle_and_verify(
            &self.policy,
            || backend.get_meeting(remote_id),
            |meeting| meeting.map(|m| m.participants),
        )
        .await?;

        let participants = self.verified(SyncKind::Participants, remote_id, verification)?;
        if participants.is_empty() {
            info!(
                "No participants available for meeting {} (likely account tier)",
                remote_id
            );
        }

        Ok(ParticipantSync {
            remote_id: remote_id.clone(),
            participants,
        })
    }

    /// Re-sync the recordings of a stored meeting and return what is stored afterwards.
    pub async fn sync_recordings(&self, remote_id: &RemoteId) -> SyncResult<RecordingSync> {
        let _guard = self.claim(SyncKind::Recordings, remote_id)?;
        self.ensure_synced(remote_id).await?;

        info!("Syncing recordings for meeting {}", remote_id);
        let returned = self
            .backend
            .sync_recordings(remote_id)
            .await
            .map_err(|e| command_failed(SyncKind::Recordings, remote_id, e))?;
        info!(
            "Backend returned {} recording(s) for meeting {}",
            returned.len(),
            remote_id
        );

        let backend = self.backend.as_ref();
        let verification = settle_and_verify(
            &self.policy,
            || async move {
                // The recordings list alone cannot tell "none" from "meeting gone".
                match backend.get_meeting(remote_id).await {
                    Ok(Some(_)) => backend.list_recordings(remote_id).await.map(Some),
                    Ok(None) => Ok(None),
                    Err(e) => Err(e),
                }
            },
            |recordings| recordings,
        )
        .await?;

        let recordings = self.verified(SyncKind::Recordings, remote_id, verification)?;

        Ok(RecordingSync {
            remote_id: remote_id.clone(),
            recordings,
        })
    }

    fn claim(&self, kind: SyncKind, remote_id: &RemoteId) -> SyncResult<InFlightGuard> {
        self.in_flight.try_acquire(kind, remote_id).ok_or_else(|| {
            warn!(
                "{} sync for meeting {} already in flight, rejecting",
                kind.as_str(),
                remote_id
            );
            SyncError::AlreadySyncing {
                kind,
                id: remote_id.clone(),
            }
        })
    }

    async fn ensure_synced(&self, remote_id: &RemoteId) -> SyncResult<()> {
        match self.backend.get_meeting(remote_id).await? {
            Some(_) => Ok(()),
            None => {
                error!(
                    "Sub-resource sync requested for meeting {} which is not stored locally",
                    remote_id
                );
                Err(SyncError::UnknownMeeting(remote_id.clone()))
            }
        }
    }

    fn verified<T>(
        &self,
        kind: SyncKind,
        remote_id: &RemoteId,
        verification: Verification<Vec<T>>,
    ) -> SyncResult<Vec<T>> {
        match verification {
            Verification::Verified(items) => {
                self.events.publish(EngineEvent::ResourcesSynced {
                    remote_id: remote_id.clone(),
                    kind: kind.as_str(),
                    count: items.len(),
                });
                Ok(items)
            }
            Verification::ReloadRequired => {
                warn!(
                    "Meeting {} vanished during {} sync, reload required",
                    remote_id,
                    kind.as_str()
                );
                self.events
                    .publish(EngineEvent::reload_required(remote_id, kind));
                Err(SyncError::VerificationFailed {
                    kind,
                    id: remote_id.clone(),
                })
            }
        }
    }
}

fn command_failed(kind: SyncKind, remote_id: &RemoteId, e: BackendError) -> SyncError {
    error!(
        "{} sync command for meeting {} failed: {}",
        kind.as_str(),
        remote_id,
        e
    );
    SyncError::Backend(e)
}
