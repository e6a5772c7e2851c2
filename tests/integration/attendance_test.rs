//! Attendance operation integration tests
//!
//! Cover the optimistic clear-attendance flow, its rollback on server
//! refusal, and read-through attendee fetching.

use assert_matches::assert_matches;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use attendsync::client::{Config, ResourceKey, Severity, SyncClient};
use attendsync::shared::SyncError;

use crate::common::client_for;

fn attendees_key(event_id: &str) -> ResourceKey {
    ResourceKey::EventAttendees(event_id.to_string())
}

fn roster_json() -> serde_json::Value {
    json!([
        {"id": "a1", "name": "Ada Lovelace", "email": "ada@example.com"},
        {"id": "a2", "name": "Grace Hopper", "company": "US Navy"}
    ])
}

#[tokio::test]
async fn test_clear_attendance_success_invalidates_views() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/events/42/attendance"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.set_synced("42", true).await;
    client.cache().put(attendees_key("42"), roster_json()).await;

    client.clear_attendance("42").await.unwrap();

    assert!(!client.is_synced("42").await);
    assert_eq!(client.cache().invalidation_sweeps(), 1);
    // The roster has to be refetched, not served from before the clear
    assert!(client.cache().get(&attendees_key("42")).await.is_none());
}

#[tokio::test]
async fn test_clear_attendance_rolls_back_on_server_refusal() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/events/42/attendance"))
        .respond_with(ResponseTemplate::new(500).set_body_string("attendance table locked"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.set_synced("42", true).await;
    client.cache().put(attendees_key("42"), roster_json()).await;
    let mut toasts = client.notifications().subscribe();

    let err = client.clear_attendance("42").await.unwrap_err();
    assert_matches!(err, SyncError::Http { status: 500, .. });

    // Optimistic changes were rolled back
    assert!(client.is_synced("42").await);
    assert_eq!(
        client.cache().get(&attendees_key("42")).await,
        Some(roster_json())
    );
    assert_eq!(client.cache().invalidation_sweeps(), 0);

    let toast = toasts.recv().await.unwrap();
    assert_eq!(toast.severity, Severity::Error);
    assert_eq!(toast.title, "Clear attendance failed");
}

#[tokio::test]
async fn test_clear_attendance_rolls_back_when_server_unreachable() {
    // Nothing listens on this port, the request cannot even be sent
    let config = Config::with_builder(
        attendsync::shared::AppConfig::builder()
            .server_url("http://127.0.0.1:9")
            .request_timeout_secs(2),
    )
    .unwrap();
    let client = SyncClient::new(config);
    client.set_synced("42", true).await;
    client.cache().put(attendees_key("42"), roster_json()).await;

    let err = client.clear_attendance("42").await.unwrap_err();
    assert_matches!(err, SyncError::Transport { .. });

    assert!(client.is_synced("42").await);
    assert_eq!(
        client.cache().get(&attendees_key("42")).await,
        Some(roster_json())
    );
}

#[tokio::test]
async fn test_fetch_attendees_caches_and_derives_synced() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/events/42/attendees"))
        .respond_with(ResponseTemplate::new(200).set_body_json(roster_json()))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let roster = client.fetch_attendees("42").await.unwrap();
    assert_eq!(roster.len(), 2);
    assert_eq!(roster[0].name, "Ada Lovelace");
    assert_eq!(roster[1].company.as_deref(), Some("US Navy"));
    assert!(client.is_synced("42").await);

    // Served from cache; a second HTTP call would trip the expect(1)
    let cached = client.fetch_attendees("42").await.unwrap();
    assert_eq!(cached, roster);
}

#[tokio::test]
async fn test_fetch_attendees_empty_roster_is_not_synced() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/events/42/attendees"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let roster = client.fetch_attendees("42").await.unwrap();
    assert!(roster.is_empty());
    assert!(!client.is_synced("42").await);
}

#[tokio::test]
async fn test_fetch_attendees_surfaces_http_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/events/42/attendees"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such event"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.fetch_attendees("42").await.unwrap_err();
    assert_matches!(err, SyncError::Http { status: 404, .. });
}

#[tokio::test]
async fn test_fetch_attendees_rejects_undecodable_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/events/42/attendees"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.fetch_attendees("42").await.unwrap_err();
    assert_matches!(err, SyncError::Serialization(_));
}

#[tokio::test]
async fn test_roster_refetches_after_successful_clear() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/events/42/attendance"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;
    // After the clear the server reports an empty roster
    Mock::given(method("GET"))
        .and(path("/events/42/attendees"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.cache().put(attendees_key("42"), roster_json()).await;

    client.clear_attendance("42").await.unwrap();
    let roster = client.fetch_attendees("42").await.unwrap();
    assert!(roster.is_empty());
}
