//! Whether the backend holds valid provider credentials, and the
//! connect/disconnect transitions around that.

pub mod status;

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::backend::{AuthSession, Backend, BackendResult};
use crate::events::{EngineEvent, EventBus};
use crate::schedule::PeriodicTask;

pub use status::{AuthState, AuthStatusHandle, CheckTicket};

/// Proof that the user confirmed a destructive action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Confirmed(());

impl Confirmed {
    /// `Some` only for an explicit yes.
    pub fn from_answer(answer: bool) -> Option<Self> {
        answer.then_some(Self(()))
    }
}

pub struct AuthSessionMonitor {
    backend: Arc<dyn Backend>,
    status: AuthStatusHandle,
    events: EventBus,
}

impl AuthSessionMonitor {
    pub fn new(backend: Arc<dyn Backend>, events: EventBus) -> Self {
        Self {
            backend,
            status: AuthStatusHandle::default(),
            events,
        }
    }

    pub fn status(&self) -> &AuthStatusHandle {
        &self.status
    }

    pub async fn current(&self) -> AuthState {
        self.status.get().await
    }

    /// Ask the backend for the session state.
    ///
    /// Fails closed: any error reads as unauthenticated. Returns the state in
    /// effect afterwards, which is a newer check's result if this one lost
    /// the race.
    pub async fn check_status(&self) -> AuthSession {
        let ticket = self.status.begin_check().await;

        let (session, error) = match self.backend.auth_status().await {
            Ok(session) => (session, None),
            Err(e) => {
                warn!("Auth status check failed, treating as disconnected: {}", e);
                (
                    AuthSession {
                        authenticated: false,
                    },
                    Some(e.to_string()),
                )
            }
        };

        match self.status.apply(ticket, session, error).await {
            Some(previous) => {
                debug!("Auth status: authenticated={}", session.authenticated);
                self.announce_change(&previous, session);
                session
            }
            None => {
                debug!("Discarding stale auth status result");
                AuthSession {
                    authenticated: self.status.get().await.authenticated(),
                }
            }
        }
    }

    /// Authorization URL to hand to the browser.
    pub async fn initiate_connect(&self) -> BackendResult<String> {
        let url = self.backend.auth_url().await?;
        info!("Obtained provider authorization URL");
        Ok(url)
    }

    /// Revoke the backend-held credential. Everything fetched before this
    /// call must be treated as invalid by the caller.
    pub async fn disconnect(&self, _confirmed: Confirmed) -> BackendResult<()> {
        self.backend.disconnect().await?;
        info!("Disconnected from provider");

        let session = AuthSession {
            authenticated: false,
        };
        let previous = self.status.force(session).await;
        self.announce_change(&previous, session);
        Ok(())
    }

    /// Poll [`Self::check_status`] until the returned task is cancelled or dropped.
    pub fn spawn_poller(self: &Arc<Self>, period: Duration) -> PeriodicTask {
        let monitor = Arc::clone(self);
        PeriodicTask::start("auth-status", period, move || {
            let monitor = Arc::clone(&monitor);
            async move {
                monitor.check_status().await;
            }
        })
    }

    fn announce_change(&self, previous: &AuthState, session: AuthSession) {
        if previous.session != Some(session) {
            info!("Auth state changed: authenticated={}", session.authenticated);
            self.events.publish(EngineEvent::AuthChanged {
                authenticated: session.authenticated,
            });
        }
    }
}
