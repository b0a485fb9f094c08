//! Integration tests for the refresh controller driven by a real
//! [`SheetsClient`] against a wiremock export endpoint.

use sheetfeed::feed::{SheetsClient, SourceKey};
use sheetfeed::refresh::{
    RefreshController, RefreshEvent, RefreshState, Schedule, FETCH_ERROR_MESSAGE,
};
use std::time::Duration;
use tokio::sync::mpsc;
use wiremock::matchers::{method, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CSV: &str = "Title,Description,Link,Date\n\
                   Alpha,first,https://example.com/a,2024-03-01\n\
                   Beta,second,https://example.com/b,2024-03-02\n";

fn controller(
    server: &MockServer,
    keep_items_on_error: bool,
) -> (RefreshController, mpsc::Receiver<RefreshEvent>) {
    let (tx, rx) = mpsc::channel(16);
    let client = SheetsClient::new(&server.uri(), Duration::from_secs(5)).unwrap();
    let controller = RefreshController::new(
        client,
        SourceKey::new("sheet", "0"),
        tx,
        keep_items_on_error,
    );
    (controller, rx)
}

async fn next_event(rx: &mut mpsc::Receiver<RefreshEvent>) -> RefreshEvent {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for refresh event")
        .expect("event channel closed")
}

#[tokio::test]
async fn test_manual_refresh_loads_records() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("gid", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_string(CSV))
        .expect(1)
        .mount(&server)
        .await;

    let (mut controller, mut rx) = controller(&server, true);
    assert!(controller.refresh_now());
    assert!(controller.is_loading());
    assert!(!controller.refresh_now(), "second manual refresh while loading");

    let event = next_event(&mut rx).await;
    assert!(controller.handle_event(event));

    assert_eq!(controller.state(), RefreshState::Ready);
    assert_eq!(controller.items().len(), 2);
    assert!(controller.last_updated_at().is_some());
    assert_eq!(controller.error(), None);
}

#[tokio::test]
async fn test_failure_after_success_keeps_stale_records() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(CSV))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let (mut controller, mut rx) = controller(&server, true);
    controller.refresh_now();
    let event = next_event(&mut rx).await;
    controller.handle_event(event);
    let updated = controller.last_updated_at();

    controller.refresh_now();
    let event = next_event(&mut rx).await;
    controller.handle_event(event);

    assert_eq!(controller.state(), RefreshState::Error);
    assert_eq!(controller.error(), Some(FETCH_ERROR_MESSAGE));
    assert_eq!(controller.visible_items().len(), 2);
    assert_eq!(controller.last_updated_at(), updated);
}

#[tokio::test]
async fn test_failure_hides_records_when_configured() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(CSV))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let (mut controller, mut rx) = controller(&server, false);
    controller.refresh_now();
    let event = next_event(&mut rx).await;
    controller.handle_event(event);

    controller.refresh_now();
    let event = next_event(&mut rx).await;
    controller.handle_event(event);

    assert!(controller.visible_items().is_empty());
    assert_eq!(controller.items().len(), 2);
}

#[tokio::test]
async fn test_stopped_controller_issues_no_requests() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(CSV))
        .expect(0)
        .mount(&server)
        .await;

    let (mut controller, mut rx) = controller(&server, true);
    controller.set_schedule(true, 1);
    assert!(controller.is_scheduled());
    controller.stop();
    assert!(!controller.is_scheduled());

    // Well past the first interval: no tick arrives, nothing is fetched.
    let waited = tokio::time::timeout(Duration::from_millis(1500), rx.recv()).await;
    assert!(waited.is_err());
    assert_eq!(
        controller.schedule(),
        Schedule {
            enabled: true,
            interval_secs: 1
        }
    );
}
