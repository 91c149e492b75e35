//! Single-shot front end: every invocation reads its settings, builds its own
//! client, performs one read and drops the client again.

use std::future::Future;
use std::sync::Arc;

use record_store_core::contract::require_id;
use record_store_core::settings::{ErrorDisclosure, StoreSettings};
use record_store_core::{ConfigError, Envelope, RecordStoreClient, TableService};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::handlers::outcome::{
    internal_failure, reject, NotFoundPolicy, CORRELATION_ID_HEADER,
};

const COMPONENT: &str = "lambda_handler";
const NOT_FOUND_POLICY: NotFoundPolicy = NotFoundPolicy::NotFoundStatus;

/// Identifier read when the event carries no `id` query parameter.
pub const DEFAULT_RECORD_ID: &str = "hello-world";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiGatewayResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub headers: Value,
    pub body: String,
}

/// Runs one get-one invocation. `connect` is called at most once, after the
/// settings are known to be usable, and the client it feeds is dropped when
/// this function returns.
pub async fn handle_invocation<F, Fut>(
    event: Value,
    settings: Result<StoreSettings, ConfigError>,
    connect: F,
) -> ApiGatewayResponse
where
    F: FnOnce(StoreSettings) -> Fut,
    Fut: Future<Output = Arc<dyn TableService>>,
{
    let requested = requested_id(&event);
    let id = match require_id(requested.as_deref()) {
        Ok(value) => value.to_string(),
        Err(error) => {
            let (status, envelope) = reject(COMPONENT, &error);
            return json_response(status, &envelope, None);
        }
    };

    let settings = match settings {
        Ok(value) => value,
        Err(error) => return failure(&id, &error, ErrorDisclosure::default()),
    };
    let disclosure = settings.disclosure;

    let client = RecordStoreClient::new(settings.table_name.clone(), connect(settings).await);
    match client.fetch_one(&id).await {
        Ok(envelope) => json_response(NOT_FOUND_POLICY.status_for(envelope.valid), &envelope, None),
        Err(error) => failure(&id, &error, disclosure),
    }
}

/// Reads `queryStringParameters.id`. Absent or null falls back to the default
/// identifier; any other non-string value counts as missing.
fn requested_id(event: &Value) -> Option<String> {
    let parameter = event
        .get("queryStringParameters")
        .and_then(Value::as_object)
        .and_then(|parameters| parameters.get("id"));

    match parameter {
        None | Some(Value::Null) => Some(DEFAULT_RECORD_ID.to_string()),
        Some(Value::String(id)) => Some(id.clone()),
        Some(_) => None,
    }
}

fn failure(
    id: &str,
    error: &(dyn std::error::Error + 'static),
    disclosure: ErrorDisclosure,
) -> ApiGatewayResponse {
    let failure = internal_failure(
        COMPONENT,
        Some(id),
        json!({ "params": { "id": id } }),
        error,
        disclosure,
    );
    json_response(
        failure.status_code,
        &failure.envelope,
        Some(&failure.correlation_id),
    )
}

fn json_response<T: Serialize>(
    status_code: u16,
    envelope: &Envelope<T>,
    correlation_id: Option<&str>,
) -> ApiGatewayResponse {
    let mut headers = Map::new();
    headers.insert("Content-Type".to_string(), json!("application/json"));
    if let Some(correlation_id) = correlation_id {
        headers.insert(CORRELATION_ID_HEADER.to_string(), json!(correlation_id));
    }

    let body = match serde_json::to_string(envelope) {
        Ok(body) => body,
        Err(error) => {
            tracing::error!(
                component = COMPONENT,
                event = "response_serialization_failed",
                error = %error
            );
            return ApiGatewayResponse {
                status_code: 500,
                headers: Value::Object(headers),
                body: json!({ "valid": false, "data": error.to_string() }).to_string(),
            };
        }
    };

    ApiGatewayResponse {
        status_code,
        headers: Value::Object(headers),
        body,
    }
}
