//! # attendsync
//!
//! Streaming attendance-sync client for community event platforms.
//!
//! Guest syncs run server-side and report progress over a streaming HTTP
//! response. This crate starts those syncs, follows their progress frame
//! by frame, keeps the client-side view caches honest, and wraps the
//! attendance operations around them.
//!
//! ## Architecture
//!
//! - [`shared`]: Wire types, the session state machine, errors and
//!   configuration
//! - [`client`]: The async sync client with its stream decoder, query
//!   cache and notification fan-out
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use attendsync::client::{Config, SyncClient};
//!
//! # async fn run() -> Result<(), attendsync::shared::SyncError> {
//! let client = SyncClient::new(Config::new());
//! let handle = client.start_sync("42").await?;
//! let session = handle.wait().await;
//! println!("sync finished in phase {}", session.phase);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod shared;
