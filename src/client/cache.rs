//! # Query Cache
//!
//! Client-side cache for fetched platform resources, keyed by the view that
//! consumes them. Completing a guest sync marks every event-related view
//! stale in one sweep so the next read refetches instead of serving data
//! from before the sync.
//!
//! Invalidation never removes entries, it only marks them stale. Sweeping a
//! key that is missing or already stale is a no-op, so repeated sweeps for
//! the same completion are harmless.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Cache key for a platform resource as a view consumes it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResourceKey {
    /// Paged event listing
    EventList,
    /// Single event detail
    Event(String),
    /// Attendee roster for an event
    EventAttendees(String),
    /// Attendance records for an event
    EventAttendance(String),
    /// Featured events carousel
    FeaturedEvents,
    /// Dashboard statistics
    EventStats,
}

impl ResourceKey {
    /// Every view whose data goes stale when the guest list of `event_id`
    /// changes on the server.
    pub fn event_views(event_id: &str) -> [ResourceKey; 6] {
        [
            ResourceKey::EventList,
            ResourceKey::Event(event_id.to_string()),
            ResourceKey::EventAttendees(event_id.to_string()),
            ResourceKey::EventAttendance(event_id.to_string()),
            ResourceKey::FeaturedEvents,
            ResourceKey::EventStats,
        ]
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKey::EventList => write!(f, "events"),
            ResourceKey::Event(id) => write!(f, "events:{}", id),
            ResourceKey::EventAttendees(id) => write!(f, "event-attendees:{}", id),
            ResourceKey::EventAttendance(id) => write!(f, "event-attendance:{}", id),
            ResourceKey::FeaturedEvents => write!(f, "featured-events"),
            ResourceKey::EventStats => write!(f, "event-stats"),
        }
    }
}

/// A cached value together with its freshness state.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub value: serde_json::Value,
    pub stale: bool,
    pub updated_at: DateTime<Utc>,
}

/// Shared cache of fetched resources.
///
/// Reads return only fresh values; stale entries behave like misses until
/// the next [`put`](Self::put) refreshes them.
#[derive(Debug, Default)]
pub struct QueryCache {
    entries: RwLock<HashMap<ResourceKey, CacheEntry>>,
    sweeps: AtomicU64,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a fresh value under `key`, replacing any previous entry.
    pub async fn put(&self, key: ResourceKey, value: serde_json::Value) {
        debug!("[Cache] Storing {}", key);
        let entry = CacheEntry {
            value,
            stale: false,
            updated_at: Utc::now(),
        };
        self.entries.write().await.insert(key, entry);
    }

    /// Fetch the value under `key` if present and fresh.
    pub async fn get(&self, key: &ResourceKey) -> Option<serde_json::Value> {
        let entries = self.entries.read().await;
        match entries.get(key) {
            Some(entry) if !entry.stale => Some(entry.value.clone()),
            Some(_) => {
                debug!("[Cache] Stale entry for {}, treating as miss", key);
                None
            }
            None => None,
        }
    }

    /// Raw entry under `key`, stale or not.
    pub async fn entry(&self, key: &ResourceKey) -> Option<CacheEntry> {
        self.entries.read().await.get(key).cloned()
    }

    /// Mark a single entry stale. Returns true only when a fresh entry was
    /// actually flipped; missing and already-stale entries are no-ops.
    pub async fn invalidate(&self, key: &ResourceKey) -> bool {
        let mut entries = self.entries.write().await;
        match entries.get_mut(key) {
            Some(entry) if !entry.stale => {
                entry.stale = true;
                true
            }
            _ => false,
        }
    }

    /// Mark every event-related view stale after a sync or clear touched
    /// the guest list of `event_id`. Returns how many fresh entries were
    /// flipped; repeating the sweep flips nothing further.
    pub async fn invalidate_event_views(&self, event_id: &str) -> usize {
        self.sweeps.fetch_add(1, Ordering::Relaxed);
        let mut flipped = 0;
        for key in ResourceKey::event_views(event_id) {
            if self.invalidate(&key).await {
                flipped += 1;
            }
        }
        info!(
            "[Cache] Invalidated {} event views for event {}",
            flipped, event_id
        );
        flipped
    }

    /// Number of invalidation sweeps performed since creation
    pub fn invalidation_sweeps(&self) -> u64 {
        self.sweeps.load(Ordering::Relaxed)
    }

    /// Number of fresh entries currently cached
    pub async fn fresh_len(&self) -> usize {
        self.entries
            .read()
            .await
            .values()
            .filter(|entry| !entry.stale)
            .count()
    }
}
