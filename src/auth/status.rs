//! Shared auth state with last-issued-wins ordering.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::backend::AuthSession;

/// Last applied auth check, readable by API handlers.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AuthState {
    /// `None` until the first check completes.
    pub session: Option<AuthSession>,
    pub checked_at: Option<DateTime<Utc>>,
    /// Why the last check failed, if it did.
    pub last_error: Option<String>,
}

impl AuthState {
    /// Unchecked counts as unauthenticated.
    pub fn authenticated(&self) -> bool {
        self.session.map(|s| s.authenticated).unwrap_or(false)
    }
}

/// Issued before a status request goes out. Results are applied in issue
/// order, so a slow request can't overwrite a newer one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct CheckTicket(u64);

#[derive(Debug, Default)]
struct Inner {
    state: AuthState,
    issued: u64,
    applied: u64,
}

#[derive(Debug, Clone, Default)]
pub struct AuthStatusHandle {
    inner: Arc<Mutex<Inner>>,
}

impl AuthStatusHandle {
    pub async fn get(&self) -> AuthState {
        self.inner.lock().await.state.clone()
    }

    pub async fn begin_check(&self) -> CheckTicket {
        let mut inner = self.inner.lock().await;
        inner.issued += 1;
        CheckTicket(inner.issued)
    }

    /// Apply a check result. Returns the previous state if it was applied,
    /// `None` if a newer check already landed.
    pub async fn apply(
        &self,
        ticket: CheckTicket,
        session: AuthSession,
        error: Option<String>,
    ) -> Option<AuthState> {
        let mut inner = self.inner.lock().await;
        if ticket.0 <= inner.applied {
            return None;
        }
        inner.applied = ticket.0;
        let previous = std::mem::replace(
            &mut inner.state,
            AuthState {
                session: Some(session),
                checked_at: Some(Utc::now()),
                last_error: error,
            },
        );
        Some(previous)
    }

    /// Set the state outright and discard every check still in flight.
    pub async fn force(&self, session: AuthSession) -> AuthState {
        let mut inner = self.inner.lock().await;
        inner.issued += 1;
        inner.applied = inner.issued;
        std::mem::replace(
            &mut inner.state,
            AuthState {
                session: Some(session),
                checked_at: Some(Utc::now()),
                last_error: None,
            },
        )
    }
}
