//! # Sync Session State
//!
//! One `SyncSession` tracks one observed run of the server-side
//! attendance-fetch job for a single event. Sessions are pure UI state:
//! they are created when a sync is triggered, fed by the progress stream,
//! and discarded afterwards. Nothing here is persisted.
//!
//! The heart of the module is [`SyncSession::apply`], a reducer that folds
//! one decoded [`SyncProgressMessage`] into the session. It is independent
//! of the transport, which keeps the state machine testable without a
//! network stream.

use crate::shared::progress::{ProgressKind, SyncCounters, SyncProgressMessage};
use serde::Serialize;
use uuid::Uuid;

/// Lifecycle phase of a sync session
///
/// `Idle -> Connecting -> Streaming -> {Complete | Errored}`
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SyncPhase {
    /// Session created, nothing started yet
    Idle,
    /// Connection to the progress stream is being opened
    Connecting,
    /// Frames are arriving
    Streaming,
    /// Terminal: the job finished and said so
    Complete,
    /// Terminal: transport failure or an error frame
    Errored,
}

impl SyncPhase {
    /// Whether the session has reached a terminal phase
    pub fn is_terminal(&self) -> bool {
        matches!(self, SyncPhase::Complete | SyncPhase::Errored)
    }

    /// Short lowercase label for display and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncPhase::Idle => "idle",
            SyncPhase::Connecting => "connecting",
            SyncPhase::Streaming => "streaming",
            SyncPhase::Complete => "complete",
            SyncPhase::Errored => "errored",
        }
    }
}

impl std::fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Local, ephemeral state of one attendance sync
///
/// Owned by whoever triggered the sync; never shared between two
/// concurrently syncing events. The `log` is display-only and lives as
/// long as the session does; a new sync starts with a fresh empty log.
#[derive(Debug, Clone, Serialize)]
pub struct SyncSession {
    /// Identifier of the event being synced (the correlation key)
    pub event_id: String,
    /// Unique id of this observed run, for log correlation
    pub session_id: Uuid,
    /// Current lifecycle phase
    pub phase: SyncPhase,
    /// Displayed percentage; non-decreasing within the session
    pub percent: u8,
    /// Ordered, append-only log of received messages
    pub log: Vec<SyncProgressMessage>,
    /// Most recent message
    pub last_message: Option<SyncProgressMessage>,
    /// Terminal failure reason, if the session errored
    pub error: Option<String>,
    /// RFC3339 timestamp of when the session was created
    pub started_at: String,
}

impl SyncSession {
    /// Create an idle session for one event
    pub fn new(event_id: impl Into<String>) -> Self {
        Self {
            event_id: event_id.into(),
            session_id: Uuid::new_v4(),
            phase: SyncPhase::Idle,
            percent: 0,
            log: Vec::new(),
            last_message: None,
            error: None,
            started_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Mark the session as opening its stream connection
    pub fn connecting(&mut self) {
        self.phase = SyncPhase::Connecting;
    }

    /// Mark the session as receiving frames
    pub fn streaming(&mut self) {
        self.phase = SyncPhase::Streaming;
    }

    /// Whether the session has reached a terminal phase
    pub fn is_terminal(&self) -> bool {
        self.phase.is_terminal()
    }

    /// Running counters from the most recent message that carried them
    pub fn counters(&self) -> Option<SyncCounters> {
        self.log.iter().rev().find_map(|msg| msg.counters)
    }

    /// Fold one decoded message into the session.
    ///
    /// - `status`/`progress`: append to the log, update `last_message`,
    ///   raise the displayed percent (never lower it).
    /// - `complete`: as above, but the percent is pinned to 100 and the
    ///   phase becomes [`SyncPhase::Complete`].
    /// - `error`: the phase becomes [`SyncPhase::Errored`] and the message
    ///   text is recorded in `error`; the log is not appended.
    ///
    /// Messages arriving after a terminal phase are ignored with a warning.
    pub fn apply(&mut self, msg: SyncProgressMessage) {
        if self.is_terminal() {
            tracing::warn!(
                "[Session] Ignoring {:?} message for event {} after terminal phase {}",
                msg.kind,
                self.event_id,
                self.phase
            );
            return;
        }

        match msg.kind {
            ProgressKind::Status | ProgressKind::Progress => {
                if msg.progress < self.percent {
                    tracing::warn!(
                        "[Session] Regressing progress {} -> {} for event {}, keeping {}",
                        self.percent,
                        msg.progress,
                        self.event_id,
                        self.percent
                    );
                } else {
                    self.percent = msg.progress;
                }
                self.phase = SyncPhase::Streaming;
                self.log.push(msg.clone());
                self.last_message = Some(msg);
            }
            ProgressKind::Complete => {
                self.percent = 100;
                self.phase = SyncPhase::Complete;
                self.log.push(msg.clone());
                self.last_message = Some(msg);
            }
            ProgressKind::Error => {
                self.phase = SyncPhase::Errored;
                self.error = Some(msg.message.clone());
                self.last_message = Some(msg);
            }
        }
    }

    /// Record a failure that did not arrive as a stream message, such as a
    /// dropped connection. No-op once the session is terminal.
    pub fn fail(&mut self, reason: impl Into<String>) {
        if self.is_terminal() {
            return;
        }
        self.phase = SyncPhase::Errored;
        self.error = Some(reason.into());
    }
}
