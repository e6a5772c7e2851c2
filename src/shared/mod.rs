//! # Shared Types and Utilities
//!
//! Common functionality used by the sync client and the CLI:
//!
//! - **progress**: Wire-format progress messages emitted by the server
//! - **session**: Client-side sync session state machine
//! - **error**: Error types for sync and configuration failures
//! - **config**: Application configuration with file and env layering

pub mod config;
pub mod error;
pub mod progress;
pub mod session;

// Re-export commonly used types
pub use config::{AppConfig, AppConfigBuilder, ConfigError};
pub use error::SyncError;
pub use progress::{ProgressKind, SyncCounters, SyncProgressMessage};
pub use session::{SyncPhase, SyncSession};
