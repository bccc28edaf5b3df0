//! Explicit session store with per-key mutual exclusion.
//!
//! Each session lives behind its own async mutex, so concurrent turns on the
//! same session id serialize while distinct sessions proceed in parallel.
//! Idle sessions are evicted lazily once they outlive the configured TTL.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::models::ChatSessionState;

pub type SessionHandle = Arc<Mutex<ChatSessionState>>;

struct SessionEntry {
    state: SessionHandle,
    last_active: Instant,
}

pub struct SessionStore {
    sessions: DashMap<String, SessionEntry>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            ttl,
        }
    }

    /// Resolves a session: a known id is reused, anything else (absent or
    /// unrecognized) gets a fresh session. An unrecognized supplied id keeps
    /// its value as the new session's id.
    pub fn get_or_create(&self, session_id: Option<&str>) -> (String, SessionHandle) {
        self.evict_expired();

        if let Some(id) = session_id {
            if let Some(mut entry) = self.sessions.get_mut(id) {
                entry.last_active = Instant::now();
                return (id.to_string(), entry.state.clone());
            }
        }

        let sid = session_id
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let state: SessionHandle = Arc::new(Mutex::new(ChatSessionState::new(sid.clone())));
        self.sessions.insert(
            sid.clone(),
            SessionEntry {
                state: state.clone(),
                last_active: Instant::now(),
            },
        );
        (sid, state)
    }

    pub fn get(&self, session_id: &str) -> Option<SessionHandle> {
        self.sessions.get(session_id).map(|e| e.state.clone())
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn evict_expired(&self) {
        // Handles held by in-flight turns stay valid through their Arc even
        // if the entry is dropped here.
        self.sessions
            .retain(|_, entry| entry.last_active.elapsed() < self.ttl);
    }
}
