//! Inbound handlers.

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Response;
use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};

use crate::connectors::ConnectorDescription;
use crate::http::request::{parse_payload, request_id};
use crate::http::response::{relay, ProxyError};
use crate::http::server::AppState;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub connectors: usize,
}

pub async fn get_status(State(state): State<AppState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        connectors: state.registry.len(),
    })
}

pub async fn list_connectors(State(state): State<AppState>) -> Json<Vec<ConnectorDescription>> {
    Json(state.registry.describe())
}

/// `GET /connectors/{connector}/{*route}`: forward to the named operation.
pub async fn forward(
    State(state): State<AppState>,
    Path((connector_id, route)): Path<(String, String)>,
    Query(params): Query<Vec<(String, String)>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ProxyError> {
    let request_id = request_id(&headers);
    let (connector, operation) = state.registry.resolve(&connector_id, &route)?;
    let payload = parse_payload(&headers, &body);

    tracing::debug!(
        request_id = %request_id,
        connector = %connector_id,
        route = %operation.route,
        params = params.len(),
        "Dispatching to connector"
    );

    let response = connector.invoke(operation, params, payload).await?;

    if !response.status.is_success() {
        tracing::warn!(
            request_id = %request_id,
            connector = %connector_id,
            route = %operation.route,
            upstream_status = response.status.as_u16(),
            "Upstream returned non-success status"
        );
    }

    Ok(relay(response, state.forwarding.surface_upstream_status))
}

pub async fn not_found() -> (StatusCode, Json<Value>) {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "no route matched" })))
}
