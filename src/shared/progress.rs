/**
 * Sync Progress Wire Types
 *
 * This module defines the message shapes carried by the attendance-sync
 * progress stream. The server pushes one JSON payload per frame while a
 * sync job runs; the client decodes each payload into a
 * `SyncProgressMessage` and folds it into the local session state.
 *
 * The wire shape is deliberately small: a discriminating `type` tag, a
 * human-readable `message`, an integer `progress` percentage, and an
 * optional block of running `counters`.
 */
use serde::{Deserialize, Serialize};

/// Discriminating tag of a progress-stream message
///
/// The server may omit the tag for plain progress ticks, so the serde
/// default is [`ProgressKind::Progress`].
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProgressKind {
    /// Step announcement ("Fetching guest list...")
    Status,
    /// Plain progress tick
    #[default]
    Progress,
    /// Terminal success; the job is finished server-side
    Complete,
    /// Terminal failure reported by the job itself
    Error,
}

impl ProgressKind {
    /// Whether a message of this kind ends the session
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProgressKind::Complete | ProgressKind::Error)
    }
}

/// Running tallies of processed attendee records
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SyncCounters {
    /// Records the job has seen so far
    #[serde(default)]
    pub total: u64,
    /// Records imported successfully
    #[serde(default)]
    pub success: u64,
    /// Records that failed to import
    #[serde(default)]
    pub failure: u64,
}

/// One decoded unit of the attendance-sync progress stream
///
/// `message` and `progress` are required on the wire; a payload missing
/// either does not deserialize and is dropped by the stream decoder.
/// `progress` is an integer percentage; the decoder additionally rejects
/// values above 100 (see `client::stream`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SyncProgressMessage {
    /// Message kind; omitted on the wire for plain progress ticks
    #[serde(rename = "type", default)]
    pub kind: ProgressKind,
    /// Human-readable description of the current step
    pub message: String,
    /// Integer percentage, 0-100
    pub progress: u8,
    /// Optional running tallies of processed records
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counters: Option<SyncCounters>,
}

impl SyncProgressMessage {
    /// Create a step-announcement message
    pub fn status(message: impl Into<String>, progress: u8) -> Self {
        Self {
            kind: ProgressKind::Status,
            message: message.into(),
            progress,
            counters: None,
        }
    }

    /// Create a plain progress tick
    pub fn progress(message: impl Into<String>, progress: u8) -> Self {
        Self {
            kind: ProgressKind::Progress,
            message: message.into(),
            progress,
            counters: None,
        }
    }

    /// Create a terminal success message (always 100%)
    pub fn complete(message: impl Into<String>) -> Self {
        Self {
            kind: ProgressKind::Complete,
            message: message.into(),
            progress: 100,
            counters: None,
        }
    }

    /// Create a terminal failure message
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: ProgressKind::Error,
            message: message.into(),
            progress: 0,
            counters: None,
        }
    }

    /// Attach running counters
    pub fn with_counters(mut self, counters: SyncCounters) -> Self {
        self.counters = Some(counters);
        self
    }

    /// Whether this message ends the session
    pub fn is_terminal(&self) -> bool {
        self.kind.is_terminal()
    }
}
