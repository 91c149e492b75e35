mod support;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use record_store_aws::handlers::http::{router, AppState, HOME_BANNER};
use record_store_aws::handlers::outcome::CORRELATION_ID_HEADER;
use record_store_core::contract::{MISSING_ID_MESSAGE, NON_OBJECT_BODY_MESSAGE};
use record_store_core::error::StoreOperation;
use record_store_core::memory::InMemoryTable;
use record_store_core::settings::ErrorDisclosure;
use record_store_core::{RecordStoreClient, TableService};
use serde_json::{json, Value};
use tower::ServiceExt;

use support::{failure_text, CapturedLogs, FailingTable};

fn app_with(service: Arc<dyn TableService>, disclosure: ErrorDisclosure) -> Router {
    let client = Arc::new(RecordStoreClient::new("records", service));
    router(AppState::new(client, disclosure))
}

fn app() -> (Router, Arc<InMemoryTable>) {
    let table = Arc::new(InMemoryTable::with_page_size(2));
    (app_with(table.clone(), ErrorDisclosure::Verbose), table)
}

struct Reply {
    status: StatusCode,
    correlation_id: Option<String>,
    body: Vec<u8>,
}

impl Reply {
    fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("response body should be JSON")
    }
}

async fn send(app: &Router, method: &str, uri: &str, body: &str) -> Reply {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request should build");

    let response = app.clone().oneshot(request).await.expect("router is infallible");
    let status = response.status();
    let correlation_id = response
        .headers()
        .get(CORRELATION_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should collect")
        .to_vec();

    Reply {
        status,
        correlation_id,
        body,
    }
}

#[tokio::test]
async fn home_route_answers_with_banner() {
    let (app, _) = app();

    let reply = send(&app, "GET", "/", "").await;

    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(String::from_utf8_lossy(&reply.body), HOME_BANNER);
}

#[tokio::test]
async fn post_then_get_round_trips_payload_with_forced_keys() {
    let (app, _) = app();
    let payload = json!({"foo": "bar", "a": 2, "bool": true, "pk": "spoofed", "sk": "spoofed"});

    let written = send(&app, "POST", "/api/mypk", &payload.to_string()).await;
    assert_eq!(written.status, StatusCode::OK);
    assert_eq!(written.json()["valid"], true);

    let fetched = send(&app, "GET", "/api/mypk", "").await;
    assert_eq!(fetched.status, StatusCode::OK);
    let body = fetched.json();
    assert_eq!(body["valid"], true);
    assert_eq!(
        body["data"],
        json!({"foo": "bar", "a": 2, "bool": true, "pk": "mypk", "sk": "mypk"})
    );
}

#[tokio::test]
async fn missing_record_is_invalid_but_still_200() {
    let (app, _) = app();

    let reply = send(&app, "GET", "/api/ghost", "").await;

    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.json(), json!({"valid": false}));
}

#[tokio::test]
async fn missing_id_is_rejected_regardless_of_table_state() {
    let (app, table) = app();
    send(&app, "POST", "/api/seed", r#"{"x": 1}"#).await;

    for (method, uri) in [
        ("POST", "/api"),
        ("POST", "/api/"),
        ("GET", "/api/%20"),
        ("POST", "/api/%20"),
    ] {
        let reply = send(&app, method, uri, r#"{"x": 1}"#).await;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST, "{method} {uri}");
        assert_eq!(
            reply.json(),
            json!({"valid": false, "data": MISSING_ID_MESSAGE}),
            "{method} {uri}"
        );
    }
    assert_eq!(table.len("records").expect("len"), 1);
}

#[tokio::test]
async fn non_object_body_is_rejected_before_writing() {
    let (app, table) = app();

    let reply = send(&app, "POST", "/api/list", "[1, 2, 3]").await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.json()["data"], NON_OBJECT_BODY_MESSAGE);

    let reply = send(&app, "POST", "/api/broken", "{\"foo\":").await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.json()["valid"], false);

    assert!(table.is_empty("records").expect("is_empty"));
}

#[tokio::test]
async fn undecodable_path_segment_still_answers_with_an_envelope() {
    let (app, table) = app();

    for method in ["GET", "POST"] {
        let reply = send(&app, method, "/api/%FF", r#"{"x": 1}"#).await;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST, "{method}");
        let body = reply.json();
        assert_eq!(body["valid"], false, "{method}");
        assert!(body["data"].is_string(), "{method}");
    }
    assert!(table.is_empty("records").expect("is_empty"));
}

#[tokio::test]
async fn oversized_body_is_refused_with_an_envelope() {
    let (app, table) = app();
    let payload = format!(r#"{{"blob": "{}"}}"#, "x".repeat(3 * 1024 * 1024));

    let reply = send(&app, "POST", "/api/big", &payload).await;

    assert_eq!(reply.status, StatusCode::PAYLOAD_TOO_LARGE);
    let body = reply.json();
    assert_eq!(body["valid"], false);
    assert!(body["data"].is_string());
    assert!(table.is_empty("records").expect("is_empty"));
}

#[tokio::test]
async fn empty_body_stores_key_only_record() {
    let (app, _) = app();

    let reply = send(&app, "POST", "/api/bare", "").await;

    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(
        reply.json(),
        json!({"valid": true, "data": {"pk": "bare", "sk": "bare"}})
    );
}

#[tokio::test]
async fn get_all_returns_flat_list_across_pages() {
    let (app, table) = app();
    for id in ["a", "b", "c", "d", "e"] {
        send(&app, "POST", &format!("/api/{id}"), r#"{"n": 1}"#).await;
    }

    for uri in ["/api", "/api/"] {
        let reply = send(&app, "GET", uri, "").await;
        assert_eq!(reply.status, StatusCode::OK);
        let body = reply.json();
        assert_eq!(body["valid"], true);

        let mut ids: Vec<String> = body["data"]
            .as_array()
            .expect("data should be a list")
            .iter()
            .map(|item| item["pk"].as_str().expect("pk").to_string())
            .collect();
        ids.sort();
        assert_eq!(ids, vec!["a", "b", "c", "d", "e"]);
    }
    assert_eq!(table.scan_calls(), 6);
}

#[tokio::test]
async fn put_overwrites_previous_record_entirely() {
    let (app, _) = app();
    send(&app, "POST", "/api/doc", r#"{"old": true}"#).await;
    send(&app, "POST", "/api/doc", r#"{"new": true}"#).await;

    let reply = send(&app, "GET", "/api/doc", "").await;

    assert_eq!(
        reply.json()["data"],
        json!({"new": true, "pk": "doc", "sk": "doc"})
    );
}

#[tokio::test]
async fn failing_store_logs_once_and_returns_500_with_message() {
    let logs = CapturedLogs::default();
    let _guard = logs.install();
    let failing = Arc::new(FailingTable::default());
    let app = app_with(failing.clone(), ErrorDisclosure::Verbose);

    let reply = send(&app, "GET", "/api/mypk", "").await;

    assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        reply.json(),
        json!({"valid": false, "data": failure_text(StoreOperation::GetItem)})
    );
    assert_eq!(failing.calls(), 1);

    let failures = logs.events("request_failed");
    assert_eq!(failures.len(), 1);
    assert_eq!(logs.error_count(), 1);
    assert_eq!(failures[0]["fields"]["id"], "mypk");
    assert_eq!(
        failures[0]["fields"]["correlation_id"].as_str(),
        reply.correlation_id.as_deref()
    );
}

#[tokio::test]
async fn failing_scan_never_reports_partial_success() {
    let failing = Arc::new(FailingTable::default());
    let app = app_with(failing, ErrorDisclosure::Verbose);

    let reply = send(&app, "GET", "/api", "").await;

    assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(reply.json()["valid"], false);
    assert_eq!(reply.json()["data"], failure_text(StoreOperation::Scan));
}

#[tokio::test]
async fn redacted_disclosure_keeps_detail_out_of_the_body() {
    let app = app_with(Arc::new(FailingTable::default()), ErrorDisclosure::Redacted);

    let reply = send(&app, "POST", "/api/mypk", r#"{"foo": "bar"}"#).await;

    assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
    let data = reply.json()["data"].as_str().expect("data").to_string();
    assert!(!data.contains(support::FAILURE_MESSAGE));
    let correlation_id = reply.correlation_id.expect("correlation header");
    assert!(data.contains(&correlation_id));
}

#[tokio::test]
async fn validation_rejections_are_not_logged_as_errors() {
    let logs = CapturedLogs::default();
    let _guard = logs.install();
    let (app, _) = app();

    send(&app, "POST", "/api", "").await;

    assert_eq!(logs.error_count(), 0);
    assert_eq!(logs.events("request_rejected").len(), 1);
    assert_eq!(logs.events("request_completed").len(), 1);
}
