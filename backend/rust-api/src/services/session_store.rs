use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::metrics::{QUIZ_SESSIONS_ACTIVE, QUIZ_SESSIONS_TOTAL};
use crate::services::quiz_session::QuizSession;

pub type SessionHandle = Arc<Mutex<QuizSession>>;

struct Entry {
    session: SessionHandle,
    created_at: DateTime<Utc>,
    last_seen: DateTime<Utc>,
}

/// In-memory registry of quiz sessions.
///
/// Each session sits behind its own async mutex so requests against one
/// session are applied one at a time. The map lock is never held across an
/// await point.
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, Entry>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl_seconds: i64) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl: Duration::seconds(ttl_seconds),
        }
    }

    /// Register a fresh session in the setup phase.
    pub fn create(&self) -> (Uuid, SessionHandle) {
        self.purge_expired();

        let id = Uuid::new_v4();
        let handle = Arc::new(Mutex::new(QuizSession::new()));
        let now = Utc::now();

        self.write().insert(
            id,
            Entry {
                session: handle.clone(),
                created_at: now,
                last_seen: now,
            },
        );

        QUIZ_SESSIONS_TOTAL.with_label_values(&["created"]).inc();
        QUIZ_SESSIONS_ACTIVE.inc();
        tracing::info!("Quiz session created: {}", id);

        (id, handle)
    }

    /// Look up a session and mark it as recently used.
    pub fn get(&self, id: &Uuid) -> Option<SessionHandle> {
        let mut sessions = self.write();
        let entry = sessions.get_mut(id)?;
        entry.last_seen = Utc::now();
        Some(entry.session.clone())
    }

    pub fn created_at(&self, id: &Uuid) -> Option<DateTime<Utc>> {
        self.read().get(id).map(|entry| entry.created_at)
    }

    pub fn remove(&self, id: &Uuid) -> bool {
        let removed = self.write().remove(id).is_some();
        if removed {
            QUIZ_SESSIONS_TOTAL.with_label_values(&["discarded"]).inc();
            QUIZ_SESSIONS_ACTIVE.dec();
            tracing::info!("Quiz session discarded: {}", id);
        }
        removed
    }

    /// Drop sessions idle for longer than the configured TTL. Returns how many were dropped.
    pub fn purge_expired(&self) -> usize {
        let cutoff = Utc::now() - self.ttl;
        let mut sessions = self.write();
        let before = sessions.len();
        sessions.retain(|_, entry| entry.last_seen >= cutoff);
        let purged = before - sessions.len();

        if purged > 0 {
            QUIZ_SESSIONS_TOTAL
                .with_label_values(&["expired"])
                .inc_by(purged as u64);
            QUIZ_SESSIONS_ACTIVE.sub(purged as i64);
            tracing::info!("Purged {} idle quiz sessions", purged);
        }
        purged
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // A poisoned lock only means another request panicked mid-update of the map;
    // the map itself is still consistent.
    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<Uuid, Entry>> {
        self.sessions.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<Uuid, Entry>> {
        self.sessions.write().unwrap_or_else(|e| e.into_inner())
    }
}
