//! Browse meetings on the remote provider before syncing them.
//!
//! The provider answers in three shapes: a populated list, an explicit empty
//! list, or something else entirely. Each maps to its own [`CatalogOutcome`];
//! none of them is an error past this module.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::backend::types::{json_int, parse_timestamp};
use crate::backend::{Backend, RemoteId, RemoteMeetingSummary};

/// Which remote meetings to list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MeetingCategory {
    Past,
    Live,
    Upcoming,
}

impl MeetingCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Past => "past",
            Self::Live => "live",
            Self::Upcoming => "upcoming",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "past" => Some(Self::Past),
            "live" => Some(Self::Live),
            "upcoming" => Some(Self::Upcoming),
            _ => None,
        }
    }

    /// Message shown when the provider has nothing in this category.
    pub fn empty_advisory(&self) -> String {
        match self {
            Self::Past => "No past meetings found. Try creating a meeting first, or check \"live\" or \"upcoming\" meetings.".to_string(),
            other => format!("No {} meetings found.", other.as_str()),
        }
    }
}

impl fmt::Display for MeetingCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const INVALID_RESPONSE: &str = "Invalid response from server.";
const NO_MEETINGS_RETURNED: &str = "No meetings returned from the provider.";

/// UI-facing result of a catalog fetch.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum CatalogOutcome {
    /// Candidates to offer for sync.
    Results { meetings: Vec<RemoteMeetingSummary> },
    /// The provider returned an explicit empty list.
    Empty { message: String },
    /// The payload was absent or not the expected shape.
    Invalid { message: String },
    /// The request itself failed.
    Error { message: String },
}

impl CatalogOutcome {
    pub fn meetings(&self) -> &[RemoteMeetingSummary] {
        match self {
            Self::Results { meetings } => meetings,
            _ => &[],
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Results { .. } => None,
            Self::Empty { message } | Self::Invalid { message } | Self::Error { message } => {
                Some(message)
            }
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }
}

/// Classify a raw `list remote` payload.
pub fn classify(category: MeetingCategory, payload: &Value) -> CatalogOutcome {
    let Some(object) = payload.as_object() else {
        return CatalogOutcome::Invalid {
            message: INVALID_RESPONSE.to_string(),
        };
    };

    match object.get("meetings") {
        Some(Value::Array(entries)) if entries.is_empty() => CatalogOutcome::Empty {
            message: category.empty_advisory(),
        },
        Some(Value::Array(entries)) => {
            let meetings: Vec<_> = entries.iter().filter_map(normalize_entry).collect();
            if meetings.is_empty() {
                // Every entry was unusable; that is not the same as "none exist".
                return CatalogOutcome::Invalid {
                    message: INVALID_RESPONSE.to_string(),
                };
            }
            CatalogOutcome::Results { meetings }
        }
        _ => CatalogOutcome::Invalid {
            message: object
                .get("message")
                .and_then(Value::as_str)
                .filter(|m| !m.trim().is_empty())
                .unwrap_or(NO_MEETINGS_RETURNED)
                .to_string(),
        },
    }
}

/// Normalize one provider entry into a summary. Entries without an id are dropped.
pub fn normalize_entry(entry: &Value) -> Option<RemoteMeetingSummary> {
    let object = entry.as_object()?;

    let remote_id = object
        .get("meeting_id")
        .and_then(RemoteId::from_json)
        .or_else(|| object.get("id").and_then(RemoteId::from_json));

    let Some(remote_id) = remote_id else {
        warn!("Dropping remote meeting entry without an id: {}", entry);
        return None;
    };

    let topic = object
        .get("topic")
        .and_then(Value::as_str)
        .filter(|t| !t.trim().is_empty())
        .map(str::to_string);

    let start_time = object
        .get("start_time")
        .and_then(Value::as_str)
        .and_then(parse_timestamp);

    let duration_seconds = object
        .get("duration")
        .or_else(|| object.get("duration_seconds"))
        .and_then(json_int);

    Some(RemoteMeetingSummary {
        remote_id,
        topic,
        start_time,
        duration_seconds,
    })
}

/// What the catalog view currently shows.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CatalogState {
    pub category: Option<MeetingCategory>,
    pub outcome: Option<CatalogOutcome>,
    pub shown: bool,
}

impl CatalogState {
    pub fn meetings(&self) -> &[RemoteMeetingSummary] {
        self.outcome
            .as_ref()
            .map(CatalogOutcome::meetings)
            .unwrap_or(&[])
    }
}

#[derive(Default)]
struct Slot {
    state: CatalogState,
    /// Bumped by every fetch and every close. Only the fetch holding the
    /// current value may write `state`.
    issued: u64,
}

/// Fetches remote meeting lists and keeps the outcome of the latest request.
pub struct RemoteCatalogFetcher {
    backend: Arc<dyn Backend>,
    slot: Mutex<Slot>,
}

impl RemoteCatalogFetcher {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            slot: Mutex::new(Slot::default()),
        }
    }

    /// List remote meetings of one category. Never fails; failures become
    /// [`CatalogOutcome::Error`] and clear any previously listed candidates.
    ///
    /// The outcome is always returned, but it only becomes the catalog state
    /// if no newer fetch or close was issued while it was in flight.
    pub async fn list_remote(&self, category: MeetingCategory) -> CatalogOutcome {
        info!("Listing {} meetings from the provider", category);
        let ticket = self.issue().await;

        let outcome = match self.backend.list_remote(category).await {
            Ok(payload) => {
                debug!("Remote list payload: {}", payload);
                classify(category, &payload)
            }
            Err(e) => {
                warn!("Failed to list {} meetings: {}", category, e);
                CatalogOutcome::Error {
                    message: format!("Failed to load meetings from the provider: {e}"),
                }
            }
        };

        let mut slot = self.slot.lock().await;
        if slot.issued != ticket {
            debug!(
                "Discarding {} listing superseded while in flight (ticket {}, now {})",
                category, ticket, slot.issued
            );
            return outcome;
        }
        slot.state = CatalogState {
            category: Some(category),
            shown: !outcome.is_error(),
            outcome: Some(outcome.clone()),
        };

        outcome
    }

    pub async fn current(&self) -> CatalogState {
        self.slot.lock().await.state.clone()
    }

    /// Close the catalog view and drop its candidates. Fetches still in
    /// flight will not reopen it.
    pub async fn close(&self) {
        let mut slot = self.slot.lock().await;
        slot.issued += 1;
        slot.state = CatalogState::default();
    }

    async fn issue(&self) -> u64 {
        let mut slot = self.slot.lock().await;
        slot.issued += 1;
        slot.issued
    }
}
