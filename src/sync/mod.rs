//! Sync orchestration: command the backend, let it settle, verify, and fall
//! back to a full reload when verification fails.

pub mod guard;
pub mod orchestrator;
pub mod resources;
pub mod settle;

use thiserror::Error;

use crate::backend::{BackendError, RemoteId};

pub use guard::{InFlightGuard, InFlightRegistry, SyncKind};
pub use orchestrator::SyncOrchestrator;
pub use resources::{ParticipantSync, RecordingSync, SubResourceSyncer};
pub use settle::{settle_and_verify, SettlePolicy, Verification};

#[derive(Debug, Clone, Error)]
pub enum SyncError {
    /// Another sync of the same entity is still running.
    #[error("A {} sync for meeting {id} is already in progress", .kind.as_str())]
    AlreadySyncing { kind: SyncKind, id: RemoteId },

    /// The command was accepted but the result never showed up locally.
    #[error("Meeting {id} was not found after syncing; reload required")]
    VerificationFailed { kind: SyncKind, id: RemoteId },

    /// Sub-resource sync on a meeting that has never been synced.
    #[error("Meeting {0} has not been synced yet")]
    UnknownMeeting(RemoteId),

    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl SyncError {
    /// Whether the consumer must discard and reload all local views.
    pub fn requires_reload(&self) -> bool {
        matches!(self, Self::VerificationFailed { .. })
    }
}

pub type SyncResult<T> = Result<T, SyncError>;
