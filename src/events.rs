//! Notifications for the presentation layer.
//!
//! These carry side effects only (highlight a synced meeting, drop cached
//! views). None of them is part of an operation's return value.

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;

use crate::backend::RemoteId;
use crate::sync::SyncKind;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EngineEvent {
    /// A meeting sync was verified; the UI may scroll to and highlight it.
    MeetingSynced { remote_id: RemoteId, local_id: i64 },
    /// Participants or recordings were re-synced for a meeting.
    ResourcesSynced {
        remote_id: RemoteId,
        kind: &'static str,
        count: usize,
    },
    /// Verification failed; every cached view must be reloaded from scratch.
    ReloadRequired { remote_id: RemoteId, kind: &'static str },
    /// Credentials were revoked; discard all previously fetched state.
    SessionInvalidated,
    /// The polled auth status changed.
    AuthChanged { authenticated: bool },
}

impl EngineEvent {
    /// Event name on the wire; matches the serialized `event` tag.
    pub fn name(&self) -> &'static str {
        match self {
            Self::MeetingSynced { .. } => "meeting_synced",
            Self::ResourcesSynced { .. } => "resources_synced",
            Self::ReloadRequired { .. } => "reload_required",
            Self::SessionInvalidated => "session_invalidated",
            Self::AuthChanged { .. } => "auth_changed",
        }
    }

    pub fn reload_required(remote_id: &RemoteId, kind: SyncKind) -> Self {
        Self::ReloadRequired {
            remote_id: remote_id.clone(),
            kind: kind.as_str(),
        }
    }
}

/// Fan-out channel for [`EngineEvent`]s. Clones share the channel.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<EngineEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(64)
    }
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.tx.subscribe()
    }

    /// Publish to current subscribers. Having none is fine.
    pub fn publish(&self, event: EngineEvent) {
        debug!("Engine event: {:?}", event);
        let _ = self.tx.send(event);
    }
}
