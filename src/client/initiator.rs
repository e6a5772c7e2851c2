//! # Sync Initiator
//!
//! Starts guest syncs and follows their progress streams to completion.
//!
//! ## Architecture
//!
//! [`SyncClient::start_sync`] opens the streaming endpoint and hands the
//! response to a background task. The task decodes frames, applies every
//! message to the shared [`SyncSession`] and rebroadcasts it to
//! subscribers, then settles the aftermath:
//!
//! - **Completed**: invalidate the event views so they refetch
//! - **Remote error**: notify; the session is already errored
//! - **Transport error / dropped stream**: fail the session and notify
//!
//! The returned [`SyncHandle`] observes and controls the running sync.
//! Dropping it aborts the follower task; the server-side sync keeps
//! running, exactly like a browser tab navigating away mid-sync.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::client::notify::{Notification, NotificationHub};
use crate::client::stream::FrameDecoder;
use crate::client::{QueryCache, SyncClient};
use crate::shared::error::SyncError;
use crate::shared::progress::{ProgressKind, SyncProgressMessage};
use crate::shared::session::SyncSession;

/// Buffered progress updates per subscriber before lagging kicks in
const UPDATE_BUFFER: usize = 256;

/// How a progress stream ended.
#[derive(Debug)]
enum StreamOutcome {
    /// Server announced completion
    Completed,
    /// Server announced the sync itself failed
    RemoteError(String),
    /// Transport failed mid-stream
    Transport(SyncError),
    /// Connection ended without a terminal message
    Dropped,
}

/// Handle to a running sync.
///
/// Cheap to move around; dropping it stops following the stream without
/// touching the server-side sync.
#[derive(Debug)]
pub struct SyncHandle {
    event_id: String,
    session: Arc<RwLock<SyncSession>>,
    updates: broadcast::Sender<SyncProgressMessage>,
    task: Option<JoinHandle<()>>,
}

impl SyncHandle {
    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    /// Snapshot of the current session state
    pub async fn session(&self) -> SyncSession {
        self.session.read().await.clone()
    }

    /// Subscribe to progress messages as they arrive.
    ///
    /// Late subscribers only see messages sent after they attach; the full
    /// history stays available through [`session`](Self::session).
    pub fn subscribe(&self) -> broadcast::Receiver<SyncProgressMessage> {
        self.updates.subscribe()
    }

    /// Whether the follower task has finished
    pub fn is_finished(&self) -> bool {
        self.task
            .as_ref()
            .map(|task| task.is_finished())
            .unwrap_or(true)
    }

    /// Stop following the stream.
    ///
    /// The server keeps syncing; only the progress feed is closed, the same
    /// as a page navigating away mid-sync.
    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    /// Wait for the sync to finish and return the final session state
    pub async fn wait(mut self) -> SyncSession {
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                if e.is_panic() {
                    error!("[Sync] Follower task for event {} panicked", self.event_id);
                }
            }
        }
        self.session.read().await.clone()
    }
}

impl Drop for SyncHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl SyncClient {
    /// Start a guest sync for `event_id`.
    ///
    /// Opens the progress stream and spawns a follower task that applies
    /// every decoded message to the session. Returns immediately with a
    /// [`SyncHandle`]; the sync itself runs in the background.
    pub async fn start_sync(&self, event_id: &str) -> Result<SyncHandle, SyncError> {
        let event_id = event_id.trim();
        if event_id.is_empty() {
            return Err(SyncError::invalid_event(event_id));
        }

        let mut session = SyncSession::new(event_id);
        session.connecting();
        let session = Arc::new(RwLock::new(session));
        let (updates, _) = broadcast::channel(UPDATE_BUFFER);

        let url = self
            .config
            .api_url(&format!("/events/{}/guests", event_id));
        let mut request = self.http.get(&url).header("Accept", "text/event-stream");
        if let Some(token) = self.config.get_token() {
            request = request.header("Authorization", format!("Bearer {}", token));
        }

        let task_session = Arc::clone(&session);
        let task_updates = updates.clone();
        let cache = Arc::clone(&self.cache);
        let notifications = self.notifications.clone();
        let synced = Arc::clone(&self.synced);
        let id = event_id.to_string();

        let task = tokio::spawn(async move {
            Self::run_sync(id, request, task_session, task_updates, cache, notifications, synced)
                .await;
        });

        info!("[Sync] Started guest sync for event {}", event_id);
        Ok(SyncHandle {
            event_id: event_id.to_string(),
            session,
            updates,
            task: Some(task),
        })
    }

    /// Follower task: open the stream, drive it to its end, settle the
    /// aftermath.
    async fn run_sync(
        event_id: String,
        request: reqwest::RequestBuilder,
        session: Arc<RwLock<SyncSession>>,
        updates: broadcast::Sender<SyncProgressMessage>,
        cache: Arc<QueryCache>,
        notifications: NotificationHub,
        synced: Arc<RwLock<HashMap<String, bool>>>,
    ) {
        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                let err = SyncError::from(e);
                error!(
                    "[Sync] Failed to open progress stream for event {}: {}",
                    event_id, err
                );
                Self::fail_session(&session, err.to_string()).await;
                notifications.notify(Notification::error("Sync failed", err.to_string()));
                return;
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| status.to_string());
            let err = SyncError::http(status.as_u16(), body);
            error!(
                "[Sync] Progress stream rejected for event {}: {}",
                event_id, err
            );
            Self::fail_session(&session, err.to_string()).await;
            notifications.notify(Notification::error("Sync failed", err.to_string()));
            return;
        }

        session.write().await.streaming();
        debug!("[Sync] Progress stream open for event {}", event_id);

        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(SyncError::from))
            .boxed();
        let outcome = Self::drive_stream(&event_id, stream, &session, &updates).await;

        match outcome {
            StreamOutcome::Completed => {
                cache.invalidate_event_views(&event_id).await;
                synced.write().await.insert(event_id.clone(), true);
                info!("[Sync] Event {} synced", event_id);
            }
            StreamOutcome::RemoteError(message) => {
                warn!(
                    "[Sync] Server reported sync failure for event {}: {}",
                    event_id, message
                );
                notifications.notify(Notification::error("Sync failed", message));
            }
            StreamOutcome::Transport(err) => {
                error!(
                    "[Sync] Progress stream lost for event {}: {}",
                    event_id, err
                );
                Self::fail_session(&session, err.to_string()).await;
                notifications.notify(Notification::error(
                    "Sync connection lost",
                    err.to_string(),
                ));
            }
            StreamOutcome::Dropped => {
                let reason = "stream ended before the sync finished";
                warn!(
                    "[Sync] Progress stream for event {} ended without completion",
                    event_id
                );
                Self::fail_session(&session, reason).await;
                notifications.notify(Notification::error("Sync interrupted", reason));
            }
        }
    }

    /// Pull chunks until the stream yields a terminal message, fails, or
    /// ends. Transport independent so tests can feed scripted chunks.
    async fn drive_stream<S>(
        event_id: &str,
        mut stream: S,
        session: &Arc<RwLock<SyncSession>>,
        updates: &broadcast::Sender<SyncProgressMessage>,
    ) -> StreamOutcome
    where
        S: Stream<Item = Result<Bytes, SyncError>> + Unpin,
    {
        let mut decoder = FrameDecoder::new();
        while let Some(chunk) = stream.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => return StreamOutcome::Transport(e),
            };
            for msg in decoder.push(&chunk) {
                if let Some(outcome) = Self::apply_message(event_id, msg, session, updates).await {
                    return outcome;
                }
            }
        }
        // End of stream: flush a possibly unterminated final frame before
        // deciding how this ended
        for msg in decoder.finish() {
            if let Some(outcome) = Self::apply_message(event_id, msg, session, updates).await {
                return outcome;
            }
        }
        if decoder.discarded() > 0 {
            debug!(
                "[Sync] {} malformed frames discarded for event {}",
                decoder.discarded(),
                event_id
            );
        }
        StreamOutcome::Dropped
    }

    /// Apply one decoded message to the session and rebroadcast it.
    /// Returns the stream outcome when the message is terminal.
    async fn apply_message(
        event_id: &str,
        msg: SyncProgressMessage,
        session: &Arc<RwLock<SyncSession>>,
        updates: &broadcast::Sender<SyncProgressMessage>,
    ) -> Option<StreamOutcome> {
        debug!(
            "[Sync] Event {}: {} ({}%)",
            event_id, msg.message, msg.progress
        );
        session.write().await.apply(msg.clone());
        let _ = updates.send(msg.clone());
        match msg.kind {
            ProgressKind::Complete => Some(StreamOutcome::Completed),
            ProgressKind::Error => Some(StreamOutcome::RemoteError(msg.message)),
            _ => None,
        }
    }

    async fn fail_session(session: &Arc<RwLock<SyncSession>>, reason: impl Into<String>) {
        session.write().await.fail(reason);
    }
}
