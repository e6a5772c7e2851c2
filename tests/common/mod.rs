//! Shared helpers for integration tests
//!
//! Frame builders for the progress stream wire format and mock-server
//! setup for the platform API.

use attendsync::client::{Config, SyncClient};
use attendsync::shared::config::AppConfig;
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// One wire frame carrying the given JSON body
pub fn sse_frame(body: &Value) -> String {
    format!("data: {}\n\n", body)
}

/// A whole stream body from a sequence of JSON frames
pub fn sse_body(frames: &[Value]) -> String {
    frames.iter().map(sse_frame).collect()
}

pub fn status_frame(message: &str, progress: u8) -> Value {
    json!({"type": "status", "message": message, "progress": progress})
}

pub fn progress_frame(message: &str, progress: u8) -> Value {
    json!({"message": message, "progress": progress})
}

pub fn complete_frame(message: &str) -> Value {
    json!({"type": "complete", "message": message, "progress": 100})
}

pub fn error_frame(message: &str) -> Value {
    json!({"type": "error", "message": message, "progress": 0})
}

/// Serve `body` as the progress stream for `event_id`
pub async fn mount_sync_stream(server: &MockServer, event_id: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(format!("/events/{}/guests", event_id)))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .mount(server)
        .await;
}

/// Client wired to the mock server
pub fn client_for(server: &MockServer) -> SyncClient {
    let config = Config::with_builder(AppConfig::builder().server_url(server.uri()))
        .expect("mock server URL is valid");
    SyncClient::new(config)
}
