//! Per-browser session state.
//!
//! A session holds the review dataset produced by its last successful fetch.
//! Sessions live only in memory. They are dropped on request, and idle ones
//! are purged whenever a new session is created.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use tracing::info;
use uuid::Uuid;

use crate::model::Review;

#[derive(Debug)]
struct Session {
    dataset: Option<Arc<Vec<Review>>>,
    last_seen: DateTime<Utc>,
}

/// In-memory store of sessions, keyed by UUID.
#[derive(Clone)]
pub struct SessionStore {
    idle_limit: Duration,
    sessions: Arc<Mutex<HashMap<Uuid, Session>>>,
}

impl SessionStore {
    pub fn new(idle_limit: Duration) -> Self {
        Self {
            idle_limit,
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Start a new, empty session.
    pub fn create(&self, now: DateTime<Utc>) -> Uuid {
        let id = Uuid::new_v4();
        let mut sessions = self.lock();

        let before = sessions.len();
        sessions.retain(|_, s| now - s.last_seen < self.idle_limit);
        let purged = before - sessions.len();
        if purged > 0 {
            info!(purged, "Purged idle sessions");
        }

        sessions.insert(
            id,
            Session {
                dataset: None,
                last_seen: now,
            },
        );
        id
    }

    pub fn exists(&self, id: Uuid) -> bool {
        self.lock().contains_key(&id)
    }

    /// The session's dataset.
    ///
    /// Returns `None` if the session does not exist, and `Some(None)` if it
    /// exists but nothing has been fetched yet.
    pub fn dataset(&self, id: Uuid, now: DateTime<Utc>) -> Option<Option<Arc<Vec<Review>>>> {
        let mut sessions = self.lock();
        let session = sessions.get_mut(&id)?;
        session.last_seen = now;
        Some(session.dataset.clone())
    }

    /// Replace the session's dataset. Returns false if the session is unknown.
    pub fn replace(&self, id: Uuid, reviews: Vec<Review>, now: DateTime<Utc>) -> bool {
        match self.lock().get_mut(&id) {
            Some(session) => {
                session.dataset = Some(Arc::new(reviews));
                session.last_seen = now;
                true
            }
            None => false,
        }
    }

    /// Reset the session to its initial, not-loaded state.
    pub fn clear(&self, id: Uuid, now: DateTime<Utc>) -> bool {
        match self.lock().get_mut(&id) {
            Some(session) => {
                session.dataset = None;
                session.last_seen = now;
                true
            }
            None => false,
        }
    }

    pub fn remove(&self, id: Uuid) -> bool {
        self.lock().remove(&id).is_some()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, Session>> {
        self.sessions.lock().unwrap_or_else(|e| e.into_inner())
    }
}
