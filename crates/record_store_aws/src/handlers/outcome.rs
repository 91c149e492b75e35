//! Response policy shared by both front ends: status mapping for envelopes,
//! validation rejections and the outermost failure boundary.

use record_store_core::settings::ErrorDisclosure;
use record_store_core::{Envelope, ValidationError};
use serde_json::Value;
use uuid::Uuid;

pub const CORRELATION_ID_HEADER: &str = "x-correlation-id";

/// Status used when a read finds nothing. The two front ends have always
/// disagreed here and callers depend on each behavior, so both are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotFoundPolicy {
    /// Answer 200 and let `valid: false` carry the miss (HTTP server).
    EnvelopeOk,
    /// Answer 404 (Lambda handler).
    NotFoundStatus,
}

impl NotFoundPolicy {
    pub fn status_for(self, valid: bool) -> u16 {
        match (self, valid) {
            (_, true) | (Self::EnvelopeOk, false) => 200,
            (Self::NotFoundStatus, false) => 404,
        }
    }
}

/// A request rejected before any remote call. Not an exceptional condition,
/// so it is only traced at debug level.
pub fn reject(component: &'static str, error: &ValidationError) -> (u16, Envelope<String>) {
    tracing::debug!(
        component,
        event = "request_rejected",
        reason = error.message()
    );
    (400, Envelope::failure(error.message()))
}

#[derive(Debug, Clone, PartialEq)]
pub struct InternalFailure {
    pub status_code: u16,
    pub correlation_id: String,
    pub envelope: Envelope<String>,
}

/// Outermost boundary for anything that went wrong past validation. Emits
/// exactly one error event with the full detail and the request context, and
/// builds the 500 envelope the caller sees according to `disclosure`.
pub fn internal_failure(
    component: &'static str,
    id: Option<&str>,
    context: Value,
    error: &(dyn std::error::Error + 'static),
    disclosure: ErrorDisclosure,
) -> InternalFailure {
    let correlation_id = Uuid::new_v4().to_string();
    let message = error.to_string();

    tracing::error!(
        component,
        event = "request_failed",
        correlation_id = %correlation_id,
        id = id.unwrap_or_default(),
        error = %message,
        error_chain = %error_chain(error),
        context = %context
    );

    InternalFailure {
        status_code: 500,
        envelope: Envelope::failure(disclosure.public_message(&message, &correlation_id)),
        correlation_id,
    }
}

fn error_chain(error: &(dyn std::error::Error + 'static)) -> String {
    let mut parts = vec![error.to_string()];
    let mut source = error.source();
    while let Some(cause) = source {
        parts.push(cause.to_string());
        source = cause.source();
    }
    parts.join(": ")
}
