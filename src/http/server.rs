//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (request ID, tracing, timeout, body limit)
//! - Bind server to listener
//! - Dispatch `/connectors/...` requests to the connector registry

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::Request;
use axum::routing::get;
use axum::Router;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{ForwardingConfig, ProxyConfig};
use crate::connectors::{build_client, ConnectorRegistry, RegistryError};
use crate::http::handlers;
use crate::http::request::{request_id, MakeRequestUuidV4};
use crate::lifecycle::shutdown;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<ConnectorRegistry>,
    pub forwarding: ForwardingConfig,
}

/// Errors that stop the server from being built.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to build outbound HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// HTTP server for the connector proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
}

impl HttpServer {
    /// Create a server around an already built registry.
    pub fn new(config: ProxyConfig, registry: ConnectorRegistry) -> Self {
        let state = AppState {
            registry: Arc::new(registry),
            forwarding: config.forwarding.clone(),
        };

        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the outbound client and every configured connector.
    pub fn from_config(config: ProxyConfig) -> Result<Self, StartupError> {
        let client = build_client(&config.timeouts, &config.forwarding)?;
        let registry = ConnectorRegistry::from_config(&config.connectors, client)?;
        Ok(Self::new(config, registry))
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ProxyConfig, state: AppState) -> Router {
        Router::new()
            .route("/health", get(handlers::get_status))
            .route("/connectors", get(handlers::list_connectors))
            .route("/connectors/{connector}/{*route}", get(handlers::forward))
            .fallback(handlers::not_found)
            .with_state(state)
            .layer(RequestBodyLimitLayer::new(config.security.max_body_size))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "request",
                    request_id = %request_id(request.headers()),
                    method = %request.method(),
                    path = %request.uri().path(),
                )
            }))
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV4))
    }

    /// The router, for driving requests without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown::wait(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use serde_json::Value;
    use tower::ServiceExt;

    fn server() -> HttpServer {
        let mut config = ProxyConfig::default();
        config.connectors.trello.secret = Some("s".into());
        config.connectors.tmdb.token = Some("t".into());
        config.connectors.staging.enabled = false;
        config.forwarding.use_system_proxy = false;
        HttpServer::from_config(config).unwrap()
    }

    async fn get(router: Router, uri: &str) -> (StatusCode, Option<String>, Value) {
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let id = response
            .headers()
            .get("x-request-id")
            .map(|v| v.to_str().unwrap().to_string());
        let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
        (status, id, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let (status, id, body) = get(server().router(), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert!(id.is_some());
        assert_eq!(body["status"], "operational");
        assert_eq!(body["connectors"], 2);
    }

    #[tokio::test]
    async fn test_list_connectors() {
        let (status, _, body) = get(server().router(), "/connectors").await;
        assert_eq!(status, StatusCode::OK);
        let ids: Vec<_> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["identifier"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(ids, vec!["tmdb", "trello"]);
    }

    #[tokio::test]
    async fn test_unknown_connector_and_operation() {
        let (status, _, body) = get(server().router(), "/connectors/staging/app-types").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "unknown connector 'staging'");

        let (status, _, body) = get(server().router(), "/connectors/tmdb/tv/popular").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "connector 'tmdb' has no operation 'tv/popular'");
    }

    #[tokio::test]
    async fn test_fallback() {
        let (status, _, body) = get(server().router(), "/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "no route matched");
    }

    #[tokio::test]
    async fn test_request_id_is_propagated() {
        let response = server()
            .router()
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .header("x-request-id", "caller-id")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.headers().get("x-request-id").unwrap(), "caller-id");
    }
}
