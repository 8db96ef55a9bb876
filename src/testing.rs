//! In-memory [`Backend`] used by unit tests.
//!
//! Models the provider (what a sync would ingest) separately from local
//! storage (what verification reads), with a configurable ingestion lag.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use crate::backend::{
    AuthSession, Backend, BackendError, BackendResult, BackendStats, Page, Participant,
    Recording, RemoteId, SyncAck, SyncedMeeting,
};
use crate::catalog::MeetingCategory;

#[derive(Debug, Clone, Default)]
struct ProviderMeeting {
    topic: Option<String>,
    duration_seconds: Option<i64>,
    participants: Vec<Participant>,
    recordings: Vec<Recording>,
}

/// How `list_meetings` treats the requested page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PagingMode {
    #[default]
    Honest,
    /// Always answers with the first page.
    IgnoreOffset,
    /// Returns everything from `offset` on.
    IgnoreLimit,
    /// Makes up a full page of new meetings on every call.
    Endless,
}

#[derive(Default)]
struct FakeState {
    authenticated: bool,
    auth_error: bool,
    disconnects: usize,
    provider: HashMap<RemoteId, ProviderMeeting>,
    store: Vec<SyncedMeeting>,
    /// Remote ids ingested but not yet visible, with list reads left before they land.
    hidden: HashMap<RemoteId, u32>,
    ingest_lag_reads: u32,
    drop_ingestion: bool,
    sync_error: Option<BackendError>,
    sync_calls: HashMap<RemoteId, usize>,
    participant_calls: usize,
    list_reads: usize,
    remote_payload: Option<Value>,
    category_payloads: HashMap<MeetingCategory, Value>,
    remote_delays: HashMap<MeetingCategory, Duration>,
    remote_error: Option<String>,
    paging: PagingMode,
    /// Delete the stored meeting right after a sub-resource sync command.
    vanish_after_command: bool,
    next_local_id: i64,
}

pub struct FakeBackend {
    state: Mutex<FakeState>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(FakeState {
                authenticated: true,
                next_local_id: 1,
                ..FakeState::default()
            }),
        }
    }

    fn with<R>(&self, f: impl FnOnce(&mut FakeState) -> R) -> R {
        let mut state = self.state.lock().unwrap();
        f(&mut state)
    }

    pub fn add_provider_meeting(&self, id: &str, topic: &str, duration_seconds: i64) {
        self.with(|s| {
            s.provider.insert(
                RemoteId::from(id),
                ProviderMeeting {
                    topic: Some(topic.to_string()),
                    duration_seconds: Some(duration_seconds),
                    ..ProviderMeeting::default()
                },
            );
        });
    }

    pub fn set_provider_participants(&self, id: &str, participants: Vec<Participant>) {
        self.with(|s| {
            s.provider.entry(RemoteId::from(id)).or_default().participants = participants;
        });
    }

    pub fn set_provider_recordings(&self, id: &str, recordings: Vec<Recording>) {
        self.with(|s| {
            s.provider.entry(RemoteId::from(id)).or_default().recordings = recordings;
        });
    }

    /// Store a meeting directly, as if synced in an earlier session.
    pub fn seed_synced(&self, id: &str, topic: &str) {
        self.with(|s| {
            let remote_id = RemoteId::from(id);
            s.provider.entry(remote_id.clone()).or_default().topic = Some(topic.to_string());
            let local_id = s.next_local_id;
            s.next_local_id += 1;
            s.store.push(meeting(local_id, remote_id, Some(topic.to_string()), None));
        });
    }

    pub fn set_ingest_lag_reads(&self, reads: u32) {
        self.with(|s| s.ingest_lag_reads = reads);
    }

    pub fn drop_ingestion(&self) {
        self.with(|s| s.drop_ingestion = true);
    }

    pub fn fail_sync(&self, error: BackendError) {
        self.with(|s| s.sync_error = Some(error));
    }

    pub fn set_authenticated(&self, authenticated: bool) {
        self.with(|s| s.authenticated = authenticated);
    }

    pub fn fail_auth_status(&self) {
        self.with(|s| s.auth_error = true);
    }

    pub fn set_remote_payload(&self, payload: Value) {
        self.with(|s| {
            s.remote_payload = Some(payload);
            s.remote_error = None;
        });
    }

    /// Payload for one category, taking precedence over [`Self::set_remote_payload`].
    pub fn set_category_payload(&self, category: MeetingCategory, payload: Value) {
        self.with(|s| {
            s.category_payloads.insert(category, payload);
        });
    }

    pub fn delay_remote_list(&self, category: MeetingCategory, delay: Duration) {
        self.with(|s| {
            s.remote_delays.insert(category, delay);
        });
    }

    pub fn set_paging(&self, paging: PagingMode) {
        self.with(|s| s.paging = paging);
    }

    pub fn vanish_after_command(&self) {
        self.with(|s| s.vanish_after_command = true);
    }

    pub fn fail_remote_list(&self, message: &str) {
        self.with(|s| s.remote_error = Some(message.to_string()));
    }

    pub fn sync_calls(&self, id: &str) -> usize {
        self.with(|s| s.sync_calls.get(&RemoteId::from(id)).copied().unwrap_or(0))
    }

    pub fn participant_calls(&self) -> usize {
        self.with(|s| s.participant_calls)
    }

    pub fn list_reads(&self) -> usize {
        self.with(|s| s.list_reads)
    }

    pub fn disconnects(&self) -> usize {
        self.with(|s| s.disconnects)
    }

    pub fn stored(&self, id: &str) -> Vec<SyncedMeeting> {
        let id = RemoteId::from(id);
        self.with(|s| s.store.iter().filter(|m| m.remote_id == id).cloned().collect())
    }

    /// Change what the provider reports so a re-sync has new data to ingest.
    pub fn rename_provider_meeting(&self, id: &str, topic: &str) {
        self.with(|s| {
            s.provider.entry(RemoteId::from(id)).or_default().topic = Some(topic.to_string());
        });
    }
}

fn meeting(
    local_id: i64,
    remote_id: RemoteId,
    topic: Option<String>,
    duration_seconds: Option<i64>,
) -> SyncedMeeting {
    SyncedMeeting {
        local_id,
        remote_id,
        topic,
        host_email: None,
        start_time: None,
        end_time: None,
        duration_seconds,
        participant_count: None,
        created_at: None,
        participants: Vec::new(),
        recordings: Vec::new(),
    }
}

fn remove_if_vanishing(s: &mut FakeState, id: &RemoteId) {
    if s.vanish_after_command {
        s.store.retain(|m| &m.remote_id != id);
    }
}

fn visible<'a>(s: &'a FakeState, id: &RemoteId) -> Option<&'a SyncedMeeting> {
    if s.hidden.contains_key(id) {
        return None;
    }
    s.store.iter().find(|m| &m.remote_id == id)
}

#[async_trait]
impl Backend for FakeBackend {
    async fn auth_url(&self) -> BackendResult<String> {
        Ok("https://zoom.example/oauth/authorize?client_id=test".to_string())
    }

    async fn auth_status(&self) -> BackendResult<AuthSession> {
        self.with(|s| {
            if s.auth_error {
                return Err(BackendError::Transport("connection refused".to_string()));
            }
            Ok(AuthSession {
                authenticated: s.authenticated,
            })
        })
    }

    async fn disconnect(&self) -> BackendResult<()> {
        self.with(|s| {
            s.disconnects += 1;
            s.authenticated = false;
        });
        Ok(())
    }

    async fn list_meetings(&self, page: Page) -> BackendResult<Vec<SyncedMeeting>> {
        self.with(|s| {
            s.list_reads += 1;
            if page.offset == 0 {
                for reads in s.hidden.values_mut() {
                    *reads = reads.saturating_sub(1);
                }
                s.hidden.retain(|_, reads| *reads > 0);
            }
            if s.paging == PagingMode::Endless {
                let start = i64::from(page.offset) + 1;
                return Ok((start..start + i64::from(page.limit))
                    .map(|local_id| meeting(local_id, RemoteId::from(local_id as u64), None, None))
                    .collect());
            }

            let (offset, limit) = match s.paging {
                PagingMode::IgnoreOffset => (0, page.limit as usize),
                PagingMode::IgnoreLimit => (page.offset as usize, usize::MAX),
                _ => (page.offset as usize, page.limit as usize),
            };
            let listed: Vec<_> = s
                .store
                .iter()
                .filter(|m| !s.hidden.contains_key(&m.remote_id))
                .skip(offset)
                .take(limit)
                .cloned()
                .collect();
            Ok(listed)
        })
    }

    async fn list_remote(&self, category: MeetingCategory) -> BackendResult<Value> {
        let delay = self.with(|s| s.remote_delays.get(&category).copied());
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.with(|s| match &s.remote_error {
            Some(message) => Err(BackendError::Status {
                status: 503,
                message: message.clone(),
            }),
            None => Ok(s
                .category_payloads
                .get(&category)
                .or(s.remote_payload.as_ref())
                .cloned()
                .unwrap_or(Value::Null)),
        })
    }

    async fn get_meeting(&self, id: &RemoteId) -> BackendResult<Option<SyncedMeeting>> {
        Ok(self.with(|s| visible(s, id).cloned()))
    }

    async fn sync_meeting(&self, id: &RemoteId) -> BackendResult<SyncAck> {
        self.with(|s| {
            if let Some(error) = &s.sync_error {
                return Err(error.clone());
            }
            *s.sync_calls.entry(id.clone()).or_default() += 1;

            let Some(source) = s.provider.get(id).cloned() else {
                return Err(BackendError::Status {
                    status: 404,
                    message: format!("Meeting {id} not found"),
                });
            };

            if s.drop_ingestion {
                return Ok(SyncAck::default());
            }

            if let Some(pos) = s.store.iter().position(|m| &m.remote_id == id) {
                let existing = &mut s.store[pos];
                existing.topic = source.topic;
                existing.duration_seconds = source.duration_seconds;
            } else {
                let local_id = s.next_local_id;
                s.next_local_id += 1;
                s.store.push(meeting(
                    local_id,
                    id.clone(),
                    source.topic,
                    source.duration_seconds,
                ));
                if s.ingest_lag_reads > 0 {
                    s.hidden.insert(id.clone(), s.ingest_lag_reads);
                }
            }

            Ok(SyncAck {
                message: Some("Meeting data synced successfully".to_string()),
                note: None,
            })
        })
    }

    async fn get_stats(&self, id: &RemoteId) -> BackendResult<BackendStats> {
        self.with(|s| {
            let participants = visible(s, id)
                .map(|m| m.participants.clone())
                .unwrap_or_default();
            Ok(BackendStats {
                total_participants: participants.len() as i64,
                ..BackendStats::default()
            })
        })
    }

    async fn sync_participants(&self, id: &RemoteId) -> BackendResult<Vec<Participant>> {
        self.with(|s| {
            s.participant_calls += 1;
            let participants = s
                .provider
                .get(id)
                .map(|p| p.participants.clone())
                .unwrap_or_default();
            if let Some(stored) = s.store.iter_mut().find(|m| &m.remote_id == id) {
                stored.participant_count = Some(participants.len() as i64);
                stored.participants = participants.clone();
            }
            remove_if_vanishing(s, id);
            Ok(participants)
        })
    }

    async fn list_recordings(&self, id: &RemoteId) -> BackendResult<Vec<Recording>> {
        Ok(self.with(|s| {
            visible(s, id)
                .map(|m| m.recordings.clone())
                .unwrap_or_default()
        }))
    }

    async fn sync_recordings(&self, id: &RemoteId) -> BackendResult<Vec<Recording>> {
        self.with(|s| {
            let recordings = s
                .provider
                .get(id)
                .map(|p| p.recordings.clone())
                .unwrap_or_default();
            if let Some(stored) = s.store.iter_mut().find(|m| &m.remote_id == id) {
                stored.recordings = recordings.clone();
            }
            remove_if_vanishing(s, id);
            Ok(recordings)
        })
    }

    async fn download_recording(
        &self,
        id: &RemoteId,
        recording_id: &str,
    ) -> BackendResult<String> {
        Ok(format!("recordings/{id}/{recording_id}.mp4"))
    }
}

pub fn participant(id: i64, duration_seconds: Option<i64>) -> Participant {
    Participant {
        id,
        user_name: Some(format!("User {id}")),
        user_email: None,
        join_time: None,
        leave_time: None,
        duration_seconds,
        device: None,
        location: None,
    }
}

pub fn recording(id: i64, file_type: &str) -> Recording {
    Recording {
        id,
        recording_id: Some(format!("rec-{id}")),
        recording_type: Some("shared_screen_with_speaker_view".to_string()),
        file_type: Some(file_type.to_string()),
        file_size_bytes: Some(1024 * id),
        status: "pending".to_string(),
        play_url: None,
        recording_start: None,
        recording_end: None,
    }
}
