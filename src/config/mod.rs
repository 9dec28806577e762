//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → loader.rs (environment overrides for secrets)
//!     → validation.rs (semantic checks)
//!     → ProxyConfig (validated, immutable)
//!     → connectors built once, shared via Arc
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Secrets may come from the file or the environment
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    AuthConfig, ConnectorsConfig, CustomConnectorConfig, ForwardingConfig, ListenerConfig,
    LogFormat, ObservabilityConfig, OperationConfig, ProxyConfig, SecurityConfig, StagingConfig,
    TimeoutConfig, TmdbConfig, TrelloConfig,
};
pub use validation::{validate_config, ValidationError};
