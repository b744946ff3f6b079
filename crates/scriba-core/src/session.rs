//! Per-visit session state.
//!
//! Each visit gets an explicit `Session` keyed by a random id: the
//! authenticated flag, the last successful transcript, and a single in-flight
//! guard that refuses re-entrant submissions. Nothing persists across
//! sessions. Failures never touch the stored transcript; they are returned to
//! the caller instead.

use dashmap::DashMap;
use uuid::Uuid;

/// State for one user visit. Created at first page load, discarded on
/// teardown.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub authenticated: bool,
    pub transcript: String,
    pub download_name: Option<String>,
    pub in_flight: bool,
}

/// Process-wide store of live sessions.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: DashMap<Uuid, Session>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new session with default state (`authenticated = false`,
    /// empty transcript).
    pub fn create(&self) -> Uuid {
        let id = Uuid::new_v4();
        self.sessions.insert(id, Session::default());
        id
    }

    pub fn get(&self, id: &Uuid) -> Option<Session> {
        self.sessions.get(id).map(|s| s.value().clone())
    }

    pub fn contains(&self, id: &Uuid) -> bool {
        self.sessions.contains_key(id)
    }

    /// Mark the session authenticated. False when the session is unknown.
    pub fn set_authenticated(&self, id: &Uuid) -> bool {
        match self.sessions.get_mut(id) {
            Some(mut s) => {
                s.authenticated = true;
                true
            }
            None => false,
        }
    }

    pub fn is_authenticated(&self, id: &Uuid) -> bool {
        self.sessions.get(id).map(|s| s.authenticated).unwrap_or(false)
    }

    /// Claim the in-flight guard. `None` when the session is unknown or a
    /// transcription is already outstanding for it. The flag is cleared when
    /// the returned guard drops, so every exit path releases it — including
    /// a submit future cancelled mid-await by a client disconnect.
    pub fn begin_transcription(&self, id: &Uuid) -> Option<TranscriptionGuard<'_>> {
        match self.sessions.get_mut(id) {
            Some(mut s) if !s.in_flight => {
                s.in_flight = true;
                Some(TranscriptionGuard { store: self, id: *id })
            }
            _ => None,
        }
    }

    /// Store a finished transcript. Success-only: error results are returned
    /// to the caller and never written here.
    pub fn store_transcript(&self, id: &Uuid, transcript: String, download_name: String) {
        if let Some(mut s) = self.sessions.get_mut(id) {
            s.transcript = transcript;
            s.download_name = Some(download_name);
        }
    }

    /// Session teardown.
    pub fn remove(&self, id: &Uuid) {
        self.sessions.remove(id);
    }
}

/// Holds the in-flight flag for one submit. Dropping it releases the flag,
/// whether the submit finished, failed, or was cancelled.
#[derive(Debug)]
pub struct TranscriptionGuard<'a> {
    store: &'a SessionStore,
    id: Uuid,
}

impl Drop for TranscriptionGuard<'_> {
    fn drop(&mut self) {
        if let Some(mut s) = self.store.sessions.get_mut(&self.id) {
            s.in_flight = false;
        }
    }
}
