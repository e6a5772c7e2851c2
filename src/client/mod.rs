//! # Attendance Sync Client
//!
//! Async client for the event platform's guest sync machinery:
//!
//! - **config**: Client configuration (server URL, token, timeouts)
//! - **stream**: Incremental decoder for the progress event stream
//! - **initiator**: Starting syncs and driving their progress streams
//! - **attendance**: Attendee fetching and the clear-attendance operation
//! - **cache**: View-keyed cache with sync-triggered invalidation
//! - **notify**: Toast-style notification fan-out
//!
//! The entry point is [`SyncClient`]. One client serves any number of
//! events; each started sync runs on its own background task and reports
//! through its own [`SyncHandle`].

pub mod attendance;
pub mod cache;
pub mod config;
pub mod initiator;
pub mod notify;
pub mod stream;

pub use attendance::Attendee;
pub use cache::{CacheEntry, QueryCache, ResourceKey};
pub use config::Config;
pub use initiator::SyncHandle;
pub use notify::{Notification, NotificationHub, Severity};
pub use stream::FrameDecoder;

use std::collections::HashMap;
use std::sync::Arc;

use reqwest::Client;
use tokio::sync::RwLock;

/// Client for guest sync, attendance operations and the caches they feed.
///
/// Holds the HTTP connection pool, the shared [`QueryCache`] and the
/// [`NotificationHub`]. The HTTP client carries no global timeout because
/// progress streams stay open for as long as a sync runs; plain calls get
/// a per-request timeout from the configuration instead.
#[derive(Debug)]
pub struct SyncClient {
    config: Config,
    http: Client,
    cache: Arc<QueryCache>,
    notifications: NotificationHub,
    synced: Arc<RwLock<HashMap<String, bool>>>,
}

impl SyncClient {
    pub fn new(config: Config) -> Self {
        Self::with_cache(config, Arc::new(QueryCache::new()))
    }

    /// Build a client around an existing cache, letting an embedding
    /// application share one cache across several clients.
    pub fn with_cache(config: Config, cache: Arc<QueryCache>) -> Self {
        Self {
            config,
            http: Client::new(),
            cache,
            notifications: NotificationHub::new(),
            synced: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Set or clear the bearer token used for authenticated endpoints
    pub fn set_token(&mut self, token: Option<String>) {
        self.config.set_token(token);
    }

    pub fn cache(&self) -> &Arc<QueryCache> {
        &self.cache
    }

    pub fn notifications(&self) -> &NotificationHub {
        &self.notifications
    }
}
