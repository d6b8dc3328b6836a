//! In-memory cache of fetched reviews, keyed by country code.
//!
//! Entries live for a fixed time-to-live and are evicted lazily. Nothing is
//! written outside the process.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};

use crate::model::Review;

#[derive(Debug, Clone)]
struct CacheEntry {
    reviews: Arc<Vec<Review>>,
    fetched_at: DateTime<Utc>,
}

/// Time-bounded cache of normalized reviews per country.
#[derive(Clone)]
pub struct ReviewCache {
    ttl: Duration,
    entries: Arc<Mutex<HashMap<String, CacheEntry>>>,
}

impl ReviewCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Cached reviews for `code`, if they were fetched less than one TTL ago.
    pub fn get(&self, code: &str, now: DateTime<Utc>) -> Option<Arc<Vec<Review>>> {
        let key = code.to_ascii_lowercase();
        let mut entries = self.lock();

        let fresh = entries.get(&key).map(|e| now < e.fetched_at + self.ttl)?;
        if fresh {
            entries.get(&key).map(|e| Arc::clone(&e.reviews))
        } else {
            entries.remove(&key);
            None
        }
    }

    /// Store the result of a successful fetch.
    pub fn insert(&self, code: &str, reviews: Vec<Review>, now: DateTime<Utc>) -> Arc<Vec<Review>> {
        let reviews = Arc::new(reviews);
        self.lock().insert(
            code.to_ascii_lowercase(),
            CacheEntry {
                reviews: Arc::clone(&reviews),
                fetched_at: now,
            },
        );
        reviews
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, entry| now < entry.fetched_at + self.ttl);
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, CacheEntry>> {
        // A poisoned map is still a valid map; keep serving it.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}
