//! Response handling.
//!
//! # Responsibilities
//! - Relay the normalized upstream body to the caller
//! - Map local failures to HTTP status codes with a JSON error body
//!
//! # Design Decisions
//! - Upstream status is masked to 200 unless relaying is enabled
//! - Transport failures map to 502, timeouts to 504
//! - Error bodies never carry auth material or outbound URLs

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::connectors::{ForwardError, ForwardResponse, RegistryError};

/// Failure surfaced to the inbound caller.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Forward(#[from] ForwardError),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::Registry(RegistryError::UnknownConnector(_))
            | ProxyError::Registry(RegistryError::UnknownOperation { .. }) => StatusCode::NOT_FOUND,
            ProxyError::Registry(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ProxyError::Forward(ForwardError::Timeout) => StatusCode::GATEWAY_TIMEOUT,
            ProxyError::Forward(ForwardError::Transport(_)) => StatusCode::BAD_GATEWAY,
            ProxyError::Forward(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Build the caller response from an upstream result.
pub fn relay(response: ForwardResponse, surface_upstream_status: bool) -> Response {
    let status = if surface_upstream_status {
        response.status
    } else {
        StatusCode::OK
    };
    (status, Json(response.body)).into_response()
}
