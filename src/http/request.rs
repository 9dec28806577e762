//! Inbound request handling.
//!
//! # Responsibilities
//! - Generate a UUID v4 request ID for every inbound request
//! - Turn the inbound body into the payload forwarded upstream
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - Bodies that are neither JSON objects nor forms forward as empty payloads

use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, HeaderValue, Request};
use serde_json::Value;
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

use crate::connectors::Payload;

pub const X_REQUEST_ID: &str = "x-request-id";

/// Request ID generator backed by UUID v4.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuidV4;

impl MakeRequestId for MakeRequestUuidV4 {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// The request ID set by the middleware, or `"unknown"`.
pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

/// Decode the inbound body as a form or JSON object.
pub fn parse_payload(headers: &HeaderMap, body: &[u8]) -> Payload {
    if body.is_empty() {
        return Payload::new();
    }

    let is_form = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));

    if is_form {
        return url::form_urlencoded::parse(body)
            .map(|(k, v)| (k.into_owned(), Value::String(v.into_owned())))
            .collect();
    }

    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => map,
        Ok(_) | Err(_) => {
            tracing::debug!(bytes = body.len(), "Inbound body is not a JSON object; forwarding empty payload");
            Payload::new()
        }
    }
}
