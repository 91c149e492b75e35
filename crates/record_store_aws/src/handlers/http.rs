//! Persistent front end: one `RecordStoreClient` shared by every request for
//! the lifetime of the server process.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Bytes;
use axum::extract::rejection::{BytesRejection, PathRejection};
use axum::extract::{Path, Request, State};
use axum::http::{HeaderValue, Method, StatusCode, Uri};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use record_store_core::contract::{parse_payload, require_id, MISSING_ID_MESSAGE};
use record_store_core::settings::ErrorDisclosure;
use record_store_core::{Envelope, RecordStoreClient, ValidationError};
use serde::Serialize;
use serde_json::json;

use crate::handlers::outcome::{
    internal_failure, reject, NotFoundPolicy, CORRELATION_ID_HEADER,
};

const COMPONENT: &str = "http_api";
const NOT_FOUND_POLICY: NotFoundPolicy = NotFoundPolicy::EnvelopeOk;

pub const HOME_BANNER: &str = "record store is running; records live under /api";

#[derive(Clone)]
pub struct AppState {
    client: Arc<RecordStoreClient>,
    disclosure: ErrorDisclosure,
}

impl AppState {
    pub fn new(client: Arc<RecordStoreClient>, disclosure: ErrorDisclosure) -> Self {
        Self { client, disclosure }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/api", get(get_all).post(missing_id))
        .route("/api/", get(get_all).post(missing_id))
        .route("/api/:id", get(get_one).post(post_one))
        .layer(middleware::from_fn(log_requests))
        .with_state(state)
}

fn envelope_response<T: Serialize>(status: u16, envelope: Envelope<T>) -> Response {
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(envelope)).into_response()
}

/// Turns an extractor rejection (undecodable path, oversized body) into the
/// same envelope a validation failure gets, keeping axum's status.
fn extraction_rejected(status: StatusCode, message: String) -> Response {
    let (_, envelope) = reject(COMPONENT, &ValidationError::new(message));
    envelope_response(status.as_u16(), envelope)
}

fn failure_response(
    method: &Method,
    uri: &Uri,
    id: Option<&str>,
    error: &(dyn std::error::Error + 'static),
    disclosure: ErrorDisclosure,
) -> Response {
    let failure = internal_failure(
        COMPONENT,
        id,
        json!({
            "method": method.as_str(),
            "url": uri.to_string(),
            "params": { "id": id },
        }),
        error,
        disclosure,
    );

    let mut response = envelope_response(failure.status_code, failure.envelope);
    if let Ok(value) = HeaderValue::from_str(&failure.correlation_id) {
        response.headers_mut().insert(CORRELATION_ID_HEADER, value);
    }
    response
}

async fn home() -> &'static str {
    HOME_BANNER
}

async fn get_all(State(state): State<AppState>, method: Method, uri: Uri) -> Response {
    match state.client.scan_all().await {
        Ok(envelope) => envelope_response(200, envelope),
        Err(error) => failure_response(&method, &uri, None, &error, state.disclosure),
    }
}

async fn get_one(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
    method: Method,
    uri: Uri,
) -> Response {
    let Path(id) = match path {
        Ok(path) => path,
        Err(rejection) => return extraction_rejected(rejection.status(), rejection.body_text()),
    };
    let id = match require_id(Some(id.as_str())) {
        Ok(value) => value,
        Err(error) => {
            let (status, envelope) = reject(COMPONENT, &error);
            return envelope_response(status, envelope);
        }
    };

    match state.client.fetch_one(id).await {
        Ok(envelope) => envelope_response(NOT_FOUND_POLICY.status_for(envelope.valid), envelope),
        Err(error) => failure_response(&method, &uri, Some(id), &error, state.disclosure),
    }
}

async fn post_one(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
    method: Method,
    uri: Uri,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let Path(id) = match path {
        Ok(path) => path,
        Err(rejection) => return extraction_rejected(rejection.status(), rejection.body_text()),
    };
    let id = match require_id(Some(id.as_str())) {
        Ok(value) => value,
        Err(error) => {
            let (status, envelope) = reject(COMPONENT, &error);
            return envelope_response(status, envelope);
        }
    };
    let body = match body {
        Ok(body) => body,
        Err(rejection) => return extraction_rejected(rejection.status(), rejection.body_text()),
    };
    let payload = match parse_payload(&body) {
        Ok(payload) => payload,
        Err(error) => {
            let (status, envelope) = reject(COMPONENT, &error);
            return envelope_response(status, envelope);
        }
    };

    match state.client.put_one(id, payload).await {
        Ok(envelope) => envelope_response(200, envelope),
        Err(error) => failure_response(&method, &uri, Some(id), &error, state.disclosure),
    }
}

async fn missing_id() -> Response {
    let error = ValidationError::new(MISSING_ID_MESSAGE);
    let (status, envelope) = reject(COMPONENT, &error);
    envelope_response(status, envelope)
}

async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started_at = Instant::now();

    let response = next.run(request).await;

    tracing::info!(
        component = COMPONENT,
        event = "request_completed",
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        duration_ms = saturating_millis(started_at.elapsed())
    );
    response
}

fn saturating_millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}
