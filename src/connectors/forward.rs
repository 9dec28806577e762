//! Outbound request construction and response normalization.
//!
//! # Responsibilities
//! - Join a relative path onto a connector base URL without escaping it
//! - Merge connector auth material with caller headers and query params
//! - Encode the caller payload as a form body
//! - Turn any upstream body into JSON, falling back to `{}`
//!
//! # Design Decisions
//! - Caller values win on key collision, keeping the connector's position
//! - Transport errors drop the outbound URL (it may carry an api-key)

use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode};
use serde_json::{Map, Value};
use thiserror::Error;
use url::Url;

/// Query parameters in send order.
pub type Params = Vec<(String, String)>;

/// Caller body payload.
pub type Payload = Map<String, Value>;

/// One outbound call, built per inbound request.
#[derive(Debug, Clone)]
pub struct ForwardRequest {
    /// Path relative to the connector base URL.
    pub path: String,
    /// Operation route used for log fields and metric labels.
    pub route: String,
    pub method: Method,
    pub payload: Payload,
    pub headers: HeaderMap,
    pub params: Params,
}

impl ForwardRequest {
    /// A GET with no payload, headers or params.
    /// The route defaults to the path without surrounding slashes.
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            route: path.trim_matches('/').to_string(),
            path,
            method: Method::GET,
            payload: Payload::new(),
            headers: HeaderMap::new(),
            params: Params::new(),
        }
    }

    pub fn route(mut self, route: impl Into<String>) -> Self {
        self.route = route.into();
        self
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn payload(mut self, payload: Payload) -> Self {
        self.payload = payload;
        self
    }

    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }
}

/// Result of one outbound call.
#[derive(Debug, Clone, PartialEq)]
pub struct ForwardResponse {
    /// Upstream status, kept for logging and optional relaying.
    pub status: StatusCode,
    /// Parsed upstream JSON, or `{}` when the body was not JSON.
    pub body: Value,
}

impl ForwardResponse {
    pub fn from_body(status: StatusCode, body: &[u8]) -> Self {
        Self {
            status,
            body: normalize_body(body),
        }
    }
}

/// Errors raised while forwarding a call.
#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("path '{0}' escapes the connector base URL")]
    PathEscapesBase(String),

    #[error("invalid path '{path}': {source}")]
    InvalidPath {
        path: String,
        #[source]
        source: url::ParseError,
    },

    #[error("connector credential is not a valid header value")]
    InvalidCredential,

    #[error("upstream request timed out")]
    Timeout,

    #[error("upstream transport error: {0}")]
    Transport(#[source] reqwest::Error),
}

impl ForwardError {
    /// Whether the call never produced an upstream response.
    pub fn is_transport(&self) -> bool {
        matches!(self, ForwardError::Timeout | ForwardError::Transport(_))
    }
}

impl From<reqwest::Error> for ForwardError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ForwardError::Timeout
        } else {
            ForwardError::Transport(e.without_url())
        }
    }
}

/// Join `path` onto `base`, which must end with a slash.
///
/// Leading slashes are stripped so the path stays under the base prefix.
pub fn join_url(base: &Url, path: &str) -> Result<Url, ForwardError> {
    let joined = base
        .join(path.trim_start_matches('/'))
        .map_err(|source| ForwardError::InvalidPath {
            path: path.to_string(),
            source,
        })?;

    if joined.origin() != base.origin() || !joined.path().starts_with(base.path()) {
        return Err(ForwardError::PathEscapesBase(path.to_string()));
    }

    Ok(joined)
}

/// Auth param first, then caller params in their original order.
///
/// Caller values for the auth key take the auth param's place. All other
/// caller pairs pass through untouched, repeated keys included.
pub fn merge_query(auth: Option<(&str, &str)>, extra: &[(String, String)]) -> Params {
    let Some((name, secret)) = auth else {
        return extra.to_vec();
    };

    let (overrides, others): (Params, Params) =
        extra.iter().cloned().partition(|(k, _)| k == name);

    let mut merged = if overrides.is_empty() {
        vec![(name.to_string(), secret.to_string())]
    } else {
        overrides
    };
    merged.extend(others);
    merged
}

/// Connector headers first; any header name the caller sets replaces them.
pub fn merge_headers(base: HeaderMap, extra: &HeaderMap) -> HeaderMap {
    let mut merged = base;
    for name in extra.keys() {
        merged.remove(name);
    }
    for (name, value) in extra.iter() {
        merged.append(name.clone(), value.clone());
    }
    merged
}

/// Flatten a payload into form pairs.
///
/// Arrays repeat the key, nulls are dropped and nested objects are sent as
/// JSON text.
pub fn form_pairs(payload: &Payload) -> Params {
    let mut pairs = Params::new();
    for (key, value) in payload {
        match value {
            Value::Array(items) => {
                for item in items {
                    if let Some(text) = form_value(item) {
                        pairs.push((key.clone(), text));
                    }
                }
            }
            other => {
                if let Some(text) = form_value(other) {
                    pairs.push((key.clone(), text));
                }
            }
        }
    }
    pairs
}

fn form_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(_) | Value::Number(_) => Some(value.to_string()),
        Value::Array(_) | Value::Object(_) => Some(value.to_string()),
    }
}

/// Parse an upstream body, yielding `{}` for anything that is not JSON.
pub fn normalize_body(body: &[u8]) -> Value {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Null) | Err(_) => Value::Object(Map::new()),
        Ok(value) => value,
    }
}
