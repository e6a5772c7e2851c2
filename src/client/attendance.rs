/**
 * Attendance Operations
 *
 * Attendee fetching and the destructive clear-attendance operation.
 *
 * Clearing is optimistic: the local synced flag and the cached roster are
 * updated before the server answers, so the UI reacts instantly. If the
 * server then refuses, the snapshot taken beforehand is restored and the
 * failure is surfaced as a notification.
 */
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::client::cache::ResourceKey;
use crate::client::notify::Notification;
use crate::client::SyncClient;
use crate::shared::error::SyncError;

/// One guest on an event's attendee roster.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Attendee {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
}

/// Local state captured before an optimistic clear, for rollback.
#[derive(Debug)]
struct ClearSnapshot {
    synced: Option<bool>,
    attendees: Option<serde_json::Value>,
}

impl SyncClient {
    /// Fetch the attendee roster for an event, read-through cached.
    ///
    /// A fresh cache entry is served directly; otherwise the roster is
    /// fetched, cached, and the event's synced flag is derived from it.
    pub async fn fetch_attendees(&self, event_id: &str) -> Result<Vec<Attendee>, SyncError> {
        let event_id = event_id.trim();
        if event_id.is_empty() {
            return Err(SyncError::invalid_event(event_id));
        }
        let key = ResourceKey::EventAttendees(event_id.to_string());

        if let Some(value) = self.cache.get(&key).await {
            match serde_json::from_value::<Vec<Attendee>>(value) {
                Ok(attendees) => {
                    debug!("[Attendance] Cache hit for event {}", event_id);
                    return Ok(attendees);
                }
                Err(e) => {
                    // A cache entry we cannot decode is as good as a miss
                    warn!(
                        "[Attendance] Discarding undecodable cache entry for event {}: {}",
                        event_id, e
                    );
                }
            }
        }

        let url = self
            .config
            .api_url(&format!("/events/{}/attendees", event_id));
        let mut request = self.http.get(&url).timeout(self.config.request_timeout());
        if let Some(token) = self.config.get_token() {
            request = request.header("Authorization", format!("Bearer {}", token));
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| status.to_string());
            return Err(SyncError::http(status.as_u16(), body));
        }

        let body = response.text().await?;
        let attendees: Vec<Attendee> = serde_json::from_str(&body)?;

        self.cache
            .put(key, serde_json::to_value(&attendees)?)
            .await;
        self.set_synced(event_id, !attendees.is_empty()).await;
        debug!(
            "[Attendance] Fetched {} attendees for event {}",
            attendees.len(),
            event_id
        );
        Ok(attendees)
    }

    /// Remove every attendance record for an event.
    ///
    /// Optimistically flips the synced flag and empties the cached roster
    /// first; a server failure rolls both back and raises a notification.
    /// On success every event view is invalidated so it refetches.
    pub async fn clear_attendance(&self, event_id: &str) -> Result<(), SyncError> {
        let event_id = event_id.trim();
        if event_id.is_empty() {
            return Err(SyncError::invalid_event(event_id));
        }

        let snapshot = self.snapshot_for_clear(event_id).await;
        self.apply_optimistic_clear(event_id).await;

        let url = self
            .config
            .api_url(&format!("/events/{}/attendance", event_id));
        let mut request = self
            .http
            .delete(&url)
            .timeout(self.config.request_timeout());
        if let Some(token) = self.config.get_token() {
            request = request.header("Authorization", format!("Bearer {}", token));
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                let err = SyncError::from(e);
                warn!(
                    "[Attendance] Clear request for event {} never reached the server: {}",
                    event_id, err
                );
                self.rollback_clear(event_id, snapshot).await;
                self.notifications
                    .notify(Notification::error("Clear attendance failed", err.to_string()));
                return Err(err);
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| status.to_string());
            let err = SyncError::http(status.as_u16(), body);
            warn!(
                "[Attendance] Server refused to clear event {}: {}",
                event_id, err
            );
            self.rollback_clear(event_id, snapshot).await;
            self.notifications
                .notify(Notification::error("Clear attendance failed", err.to_string()));
            return Err(err);
        }

        self.cache.invalidate_event_views(event_id).await;
        info!("[Attendance] Cleared attendance for event {}", event_id);
        Ok(())
    }

    /// Whether an event's guest list is known to be synced
    pub async fn is_synced(&self, event_id: &str) -> bool {
        self.synced
            .read()
            .await
            .get(event_id)
            .copied()
            .unwrap_or(false)
    }

    /// Record whether an event's guest list is synced
    pub async fn set_synced(&self, event_id: &str, synced: bool) {
        self.synced
            .write()
            .await
            .insert(event_id.to_string(), synced);
    }

    async fn snapshot_for_clear(&self, event_id: &str) -> ClearSnapshot {
        let key = ResourceKey::EventAttendees(event_id.to_string());
        ClearSnapshot {
            synced: self.synced.read().await.get(event_id).copied(),
            attendees: self.cache.get(&key).await,
        }
    }

    async fn apply_optimistic_clear(&self, event_id: &str) {
        self.set_synced(event_id, false).await;
        let key = ResourceKey::EventAttendees(event_id.to_string());
        self.cache
            .put(key, serde_json::Value::Array(Vec::new()))
            .await;
    }

    async fn rollback_clear(&self, event_id: &str, snapshot: ClearSnapshot) {
        let key = ResourceKey::EventAttendees(event_id.to_string());
        match snapshot.synced {
            Some(flag) => self.set_synced(event_id, flag).await,
            None => {
                self.synced.write().await.remove(event_id);
            }
        }
        match snapshot.attendees {
            Some(value) => self.cache.put(key, value).await,
            None => {
                // Nothing was cached before, so the optimistic empty roster
                // must not linger as fresh data
                self.cache.invalidate(&key).await;
            }
        }
        debug!("[Attendance] Rolled back optimistic clear for event {}", event_id);
    }
}
