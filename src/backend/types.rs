//! Wire types exchanged with the sync backend.
//!
//! Field names follow the backend's JSON (`meeting_id`, `duration`, ...);
//! the Rust names follow the engine's vocabulary.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Remote (provider-side) meeting identifier.
///
/// The provider hands these out as integers while the backend echoes them as
/// strings, so both JSON forms deserialize to the same normalized value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RemoteId(String);

impl RemoteId {
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(raw.as_ref().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Build from a loosely-typed JSON value. Returns `None` for anything that
    /// is not a non-empty string or an integer.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        let id = match value {
            serde_json::Value::String(s) => Self::new(s),
            serde_json::Value::Number(n) if n.is_i64() || n.is_u64() => Self::new(n.to_string()),
            _ => return None,
        };
        (!id.is_empty()).then_some(id)
    }
}

impl fmt::Display for RemoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RemoteId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for RemoteId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<u64> for RemoteId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

impl Serialize for RemoteId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for RemoteId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        RemoteId::from_json(&value).ok_or_else(|| {
            serde::de::Error::custom(format!("invalid remote meeting id: {value}"))
        })
    }
}

/// Parse a backend timestamp. Accepts RFC 3339 and naive ISO 8601 (taken as UTC).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(serde_json::Value::String(s)) => parse_timestamp(&s),
        _ => None,
    })
}

/// Integers that sometimes arrive as floats (`900.0`) or numeric strings.
fn lenient_int<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw.as_ref().and_then(json_int))
}

pub(crate) fn json_int(value: &serde_json::Value) -> Option<i64> {
    match value {
        serde_json::Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Whether the local session holds valid remote-service credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AuthSession {
    pub authenticated: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AuthUrlResponse {
    pub auth_url: String,
}

/// A meeting as listed by the provider, before any sync.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RemoteMeetingSummary {
    pub remote_id: RemoteId,
    pub topic: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub duration_seconds: Option<i64>,
}

/// A meeting that has been ingested into local storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncedMeeting {
    #[serde(rename = "id")]
    pub local_id: i64,
    #[serde(rename = "meeting_id")]
    pub remote_id: RemoteId,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub host_email: Option<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(
        default,
        rename = "duration",
        alias = "duration_seconds",
        deserialize_with = "lenient_int"
    )]
    pub duration_seconds: Option<i64>,
    #[serde(default)]
    pub participant_count: Option<i64>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub participants: Vec<Participant>,
    #[serde(default)]
    pub recordings: Vec<Recording>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub id: i64,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub user_email: Option<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub join_time: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub leave_time: Option<DateTime<Utc>>,
    #[serde(
        default,
        rename = "duration",
        alias = "duration_seconds",
        deserialize_with = "lenient_int"
    )]
    pub duration_seconds: Option<i64>,
    #[serde(default)]
    pub device: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
}

impl Participant {
    pub fn display_name(&self) -> &str {
        self.user_name
            .as_deref()
            .or(self.user_email.as_deref())
            .unwrap_or("Unknown")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recording {
    pub id: i64,
    #[serde(default)]
    pub recording_id: Option<String>,
    #[serde(default)]
    pub recording_type: Option<String>,
    #[serde(default)]
    pub file_type: Option<String>,
    #[serde(
        default,
        rename = "file_size",
        alias = "file_size_bytes",
        deserialize_with = "lenient_int"
    )]
    pub file_size_bytes: Option<i64>,
    #[serde(default = "default_recording_status")]
    pub status: String,
    #[serde(default)]
    pub play_url: Option<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub recording_start: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub recording_end: Option<DateTime<Utc>>,
}

fn default_recording_status() -> String {
    "pending".to_string()
}

/// Statistics the backend computes server-side (`GET /api/meetings/{id}/stats`).
///
/// The backend reports zeros where it has no data; the engine's own
/// [`crate::stats::DerivedStats`] is the authoritative view.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BackendStats {
    #[serde(default)]
    pub total_participants: i64,
    #[serde(default)]
    pub avg_duration: f64,
    #[serde(default)]
    pub min_duration: i64,
    #[serde(default)]
    pub max_duration: i64,
    #[serde(default)]
    pub total_duration: i64,
}

/// Acknowledgement returned by `POST /api/meetings/{id}/sync`.
///
/// Ingestion may still be in progress when this arrives.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SyncAck {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MeetingListResponse {
    #[serde(default)]
    pub meetings: Vec<SyncedMeeting>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ParticipantListResponse {
    #[serde(default)]
    pub participants: Vec<Participant>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RecordingListResponse {
    #[serde(default)]
    pub recordings: Vec<Recording>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DownloadResponse {
    pub file_path: String,
}

/// Offset pagination for `GET /api/meetings`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: u32,
    pub offset: u32,
}

impl Page {
    pub fn first(limit: u32) -> Self {
        Self { limit, offset: 0 }
    }

    pub fn next(self) -> Self {
        Self {
            limit: self.limit,
            offset: self.offset.saturating_add(self.limit),
        }
    }
}
