//! Outbound connector subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound (connector id, route, params, payload)
//!     → registry.rs (resolve connector + operation)
//!     → connector.rs (build outbound request)
//!         → auth.rs (Authorization header or query secret)
//!         → forward.rs (URL join, param/header merge, form body)
//!     → reqwest (single outbound call)
//!     → forward.rs (JSON body or `{}`)
//! ```
//!
//! # Design Decisions
//! - One forwarding implementation; connectors differ only by config
//! - Auth strategy is a closed enum chosen at registration
//! - Connector config is immutable and shared via Arc
//! - No retries, caching or response transformation

pub mod auth;
pub mod builtin;
pub mod connector;
pub mod forward;
pub mod registry;

pub use auth::AuthStrategy;
pub use connector::{parse_base_url, parse_method, BaseUrlError, Connector, ConnectorConfig, Operation};
pub use forward::{ForwardError, ForwardRequest, ForwardResponse, Params, Payload};
pub use registry::{build_client, ConnectorDescription, ConnectorRegistry, RegistryError};
