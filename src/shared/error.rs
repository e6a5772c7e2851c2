//! Shared Error Types
//!
//! This module defines the error taxonomy of the attendance-sync client.
//! Every fallible boundary (stream connect, request/response calls,
//! configuration loading) funnels into [`SyncError`].
//!
//! Malformed stream frames are deliberately *not* represented here: the
//! stream decoder skips them with a warning and decoding continues, so they
//! never surface as errors to callers.
//!
//! # Thread Safety
//!
//! All error types are `Send + Sync` and can be safely shared across task
//! boundaries.
use crate::shared::config::ConfigError;
use thiserror::Error;

/// Errors surfaced by the attendance-sync client
#[derive(Debug, Error)]
pub enum SyncError {
    /// The caller supplied an empty or unusable event identifier
    #[error("invalid event id: {id:?}")]
    InvalidEventId {
        /// The rejected identifier
        id: String,
    },

    /// Connection-level failure: the stream or request could not be
    /// established or died mid-flight
    #[error("transport error: {message}")]
    Transport {
        /// Human-readable transport failure description
        message: String,
    },

    /// The server answered with a non-2xx status
    #[error("request failed: {status} - {message}")]
    Http {
        /// HTTP status code
        status: u16,
        /// Response body, or the status line when the body is unreadable
        message: String,
    },

    /// A response body could not be decoded into the expected shape
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration was invalid or unloadable
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl SyncError {
    /// Create an invalid-event-id error
    pub fn invalid_event(id: impl Into<String>) -> Self {
        Self::InvalidEventId { id: id.into() }
    }

    /// Create a transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport { message: message.into() }
    }

    /// Create a non-2xx response error
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::Http { status, message: message.into() }
    }

    /// Whether this is a connection-level failure
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport { message: err.to_string() }
    }
}
