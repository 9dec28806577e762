//! Connector proxy library: forwards inbound calls to third-party APIs with
//! server-side credentials.

pub mod config;
pub mod connectors;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use config::schema::ProxyConfig;
pub use connectors::{Connector, ConnectorRegistry};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
