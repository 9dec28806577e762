//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Router;
use tokio::net::TcpListener;

use connector_proxy::config::ProxyConfig;
use connector_proxy::{HttpServer, Shutdown};

pub const TRELLO_SECRET: &str = "trello-s3cret";
pub const TMDB_TOKEN: &str = "tmdb-t0ken";
pub const STAGING_USER: &str = "user";
pub const STAGING_PASSWORD: &str = "pass";

/// What the mock upstream saw.
#[derive(Debug, Clone)]
pub struct Captured {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub body: String,
}

/// What the mock upstream answers.
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: u16,
    pub body: String,
    pub delay: Duration,
}

impl Reply {
    pub fn new(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
            delay: Duration::ZERO,
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

type Responder = dyn Fn(&Captured) -> Reply + Send + Sync;

#[derive(Clone)]
struct UpstreamState {
    captured: Arc<Mutex<Vec<Captured>>>,
    respond: Arc<Responder>,
}

/// A programmable upstream that records every request it receives.
pub struct MockUpstream {
    pub addr: SocketAddr,
    captured: Arc<Mutex<Vec<Captured>>>,
}

impl MockUpstream {
    pub fn base_url(&self, prefix: &str) -> String {
        format!("http://{}{}", self.addr, prefix)
    }

    pub fn requests(&self) -> Vec<Captured> {
        self.captured.lock().unwrap().clone()
    }

    pub fn last(&self) -> Captured {
        self.requests().pop().expect("upstream received no request")
    }
}

async fn capture(State(state): State<UpstreamState>, request: Request<Body>) -> Response {
    let (parts, body) = request.into_parts();
    let header = |name: &str| {
        parts
            .headers
            .get(name)
            .map(|v| v.to_str().unwrap().to_string())
    };
    let bytes = axum::body::to_bytes(body, 1024 * 1024).await.unwrap();

    let captured = Captured {
        method: parts.method.to_string(),
        path: parts.uri.path().to_string(),
        query: parts.uri.query().map(str::to_string),
        authorization: header("authorization"),
        content_type: header("content-type"),
        body: String::from_utf8_lossy(&bytes).into_owned(),
    };

    let reply = (state.respond)(&captured);
    state.captured.lock().unwrap().push(captured);

    if !reply.delay.is_zero() {
        tokio::time::sleep(reply.delay).await;
    }
    (StatusCode::from_u16(reply.status).unwrap(), reply.body).into_response()
}

/// Start a mock upstream on an ephemeral port.
pub async fn start_upstream<F>(respond: F) -> MockUpstream
where
    F: Fn(&Captured) -> Reply + Send + Sync + 'static,
{
    let captured = Arc::new(Mutex::new(Vec::new()));
    let state = UpstreamState {
        captured: captured.clone(),
        respond: Arc::new(respond),
    };
    let app = Router::new().fallback(capture).with_state(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    MockUpstream { addr, captured }
}

/// Config whose built-in connectors all point at `upstream`, keeping each
/// connector's real path prefix.
pub fn config_for(upstream: &MockUpstream) -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.forwarding.use_system_proxy = false;
    config.connectors.trello.base_url = upstream.base_url("/1/");
    config.connectors.trello.secret = Some(TRELLO_SECRET.into());
    config.connectors.tmdb.base_url = upstream.base_url("/3/");
    config.connectors.tmdb.token = Some(TMDB_TOKEN.into());
    config.connectors.staging.base_url = upstream.base_url("/api/v1/");
    config.connectors.staging.username = Some(STAGING_USER.into());
    config.connectors.staging.password = Some(STAGING_PASSWORD.into());
    config
}

/// Start the proxy on an ephemeral port. Returns its base URL.
pub async fn start_proxy(config: ProxyConfig) -> (String, Shutdown) {
    let server = HttpServer::from_config(config).expect("server should build");
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    (format!("http://{}", addr), shutdown)
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
