//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the connector proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Inbound request limits.
    pub security: SecurityConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Response relaying behavior.
    pub forwarding: ForwardingConfig,

    /// Outbound connector definitions and their credentials.
    pub connectors: ConnectorsConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Timeout configuration for inbound and outbound calls.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Inbound request deadline in seconds. Must exceed `upstream_secs`.
    pub request_secs: u64,

    /// Total deadline for one outbound call in seconds.
    pub upstream_secs: u64,

    /// Outbound connection establishment timeout in seconds.
    pub connect_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 35,
            upstream_secs: 30,
            connect_secs: 5,
        }
    }
}

/// Inbound request limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum inbound body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Human readable or JSON log lines.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Outbound call and relaying behavior.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ForwardingConfig {
    /// Reply with the upstream status code instead of always 200.
    pub surface_upstream_status: bool,

    /// Honor HTTP_PROXY/HTTPS_PROXY for outbound calls.
    pub use_system_proxy: bool,
}

impl Default for ForwardingConfig {
    fn default() -> Self {
        Self {
            surface_upstream_status: false,
            use_system_proxy: true,
        }
    }
}

/// All connectors known to the service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ConnectorsConfig {
    /// Task board connector (api-key in query).
    pub trello: TrelloConfig,

    /// Movie metadata connector (bearer token).
    pub tmdb: TmdbConfig,

    /// Internal staging connector (basic auth).
    pub staging: StagingConfig,

    /// Additional connectors declared entirely in configuration.
    pub custom: Vec<CustomConnectorConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TrelloConfig {
    pub enabled: bool,
    pub base_url: String,
    /// Sent as the `token` query parameter.
    pub secret: Option<String>,
}

impl Default for TrelloConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "https://api.trello.com/1/".to_string(),
            secret: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TmdbConfig {
    pub enabled: bool,
    pub base_url: String,
    pub token: Option<String>,
}

impl Default for TmdbConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "https://api.themoviedb.org/3/".to_string(),
            token: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StagingConfig {
    pub enabled: bool,
    pub base_url: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Default for StagingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "https://crowdbotics-slack-dev.herokuapp.com/api/v1/".to_string(),
            username: None,
            password: None,
        }
    }
}

/// A connector declared in configuration rather than built in.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CustomConnectorConfig {
    /// Path segment under `/connectors/`.
    pub identifier: String,

    pub base_url: String,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub operations: Vec<OperationConfig>,
}

/// Authentication strategy as written in configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum AuthConfig {
    #[default]
    None,
    Basic {
        username: String,
        password: String,
    },
    Bearer {
        token: String,
    },
    ApiKey {
        query_name: String,
        secret: String,
    },
}

/// One operation exposed by a custom connector.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OperationConfig {
    /// Inbound route below the connector, e.g. `search/movie`.
    pub route: String,

    /// Upstream path joined onto the connector base URL.
    pub path: String,

    #[serde(default = "default_method")]
    pub method: String,
}

fn default_method() -> String {
    "GET".to_string()
}
