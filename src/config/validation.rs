//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Require credentials for every enabled connector
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Detect conflicting connector identifiers and routes
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system
//! - Error messages name the missing field, never its value

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::{AuthConfig, CustomConnectorConfig, ProxyConfig};
use crate::connectors::builtin::{STAGING_ID, TMDB_ID, TRELLO_ID};
use crate::connectors::{parse_base_url, parse_method};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid bind address '{0}'")]
    InvalidBindAddress(String),

    #[error("invalid metrics address '{0}'")]
    InvalidMetricsAddress(String),

    #[error("timeout '{0}' must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error("request_secs ({request}) must be greater than upstream_secs ({upstream})")]
    RequestDeadlineTooShort { request: u64, upstream: u64 },

    #[error("max_body_size must be greater than zero")]
    ZeroBodyLimit,

    #[error("connector '{connector}' is missing required credential '{field}'")]
    MissingCredential { connector: String, field: &'static str },

    #[error("connector '{connector}' has invalid base URL '{url}': {reason}")]
    InvalidBaseUrl {
        connector: String,
        url: String,
        reason: String,
    },

    #[error("connector identifier '{0}' must be a single non-empty path segment")]
    InvalidIdentifier(String),

    #[error("connector identifier '{0}' is declared more than once")]
    DuplicateConnector(String),

    #[error("connector '{0}' declares no operations")]
    NoOperations(String),

    #[error("connector '{connector}' has an empty operation route")]
    EmptyRoute { connector: String },

    #[error("connector '{connector}' declares route '{route}' more than once")]
    DuplicateRoute { connector: String, route: String },

    #[error("connector '{connector}' route '{route}' uses unsupported method '{method}'")]
    UnsupportedMethod {
        connector: String,
        route: String,
        method: String,
    },
}

/// Check the whole configuration, collecting every problem found.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    let timeouts = [
        ("request_secs", config.timeouts.request_secs),
        ("upstream_secs", config.timeouts.upstream_secs),
        ("connect_secs", config.timeouts.connect_secs),
    ];
    for (name, value) in timeouts {
        if value == 0 {
            errors.push(ValidationError::ZeroTimeout(name));
        }
    }

    if config.timeouts.request_secs <= config.timeouts.upstream_secs {
        errors.push(ValidationError::RequestDeadlineTooShort {
            request: config.timeouts.request_secs,
            upstream: config.timeouts.upstream_secs,
        });
    }

    if config.security.max_body_size == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }

    validate_connectors(config, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_connectors(config: &ProxyConfig, errors: &mut Vec<ValidationError>) {
    let connectors = &config.connectors;
    let mut identifiers = HashSet::new();

    if connectors.trello.enabled {
        identifiers.insert(TRELLO_ID.to_string());
        check_base_url(TRELLO_ID, &connectors.trello.base_url, errors);
        require(TRELLO_ID, "secret", connectors.trello.secret.as_deref(), errors);
    }

    if connectors.tmdb.enabled {
        identifiers.insert(TMDB_ID.to_string());
        check_base_url(TMDB_ID, &connectors.tmdb.base_url, errors);
        require(TMDB_ID, "token", connectors.tmdb.token.as_deref(), errors);
    }

    if connectors.staging.enabled {
        identifiers.insert(STAGING_ID.to_string());
        check_base_url(STAGING_ID, &connectors.staging.base_url, errors);
        require(STAGING_ID, "username", connectors.staging.username.as_deref(), errors);
        require(STAGING_ID, "password", connectors.staging.password.as_deref(), errors);
    }

    for custom in &connectors.custom {
        let id = custom.identifier.as_str();
        if id.is_empty() || id.contains('/') {
            errors.push(ValidationError::InvalidIdentifier(id.to_string()));
        }
        if !identifiers.insert(id.to_string()) {
            errors.push(ValidationError::DuplicateConnector(id.to_string()));
        }
        check_base_url(id, &custom.base_url, errors);
        check_custom_auth(custom, errors);
        check_operations(custom, errors);
    }
}

fn require(connector: &str, field: &'static str, value: Option<&str>, errors: &mut Vec<ValidationError>) {
    if value.map_or(true, str::is_empty) {
        errors.push(ValidationError::MissingCredential {
            connector: connector.to_string(),
            field,
        });
    }
}

fn check_base_url(connector: &str, url: &str, errors: &mut Vec<ValidationError>) {
    if let Err(e) = parse_base_url(url) {
        errors.push(ValidationError::InvalidBaseUrl {
            connector: connector.to_string(),
            url: url.to_string(),
            reason: e.to_string(),
        });
    }
}

fn check_custom_auth(custom: &CustomConnectorConfig, errors: &mut Vec<ValidationError>) {
    let id = custom.identifier.as_str();
    match &custom.auth {
        AuthConfig::None => {}
        AuthConfig::Basic { username, .. } => {
            // An empty password is a legitimate basic-auth credential.
            require(id, "username", Some(username.as_str()), errors);
        }
        AuthConfig::Bearer { token } => require(id, "token", Some(token.as_str()), errors),
        AuthConfig::ApiKey { query_name, secret } => {
            require(id, "query_name", Some(query_name.as_str()), errors);
            require(id, "secret", Some(secret.as_str()), errors);
        }
    }
}

fn check_operations(custom: &CustomConnectorConfig, errors: &mut Vec<ValidationError>) {
    let id = custom.identifier.as_str();
    if custom.operations.is_empty() {
        errors.push(ValidationError::NoOperations(id.to_string()));
    }

    let mut routes = HashSet::new();
    for op in &custom.operations {
        let route = op.route.trim_matches('/');
        if route.is_empty() {
            errors.push(ValidationError::EmptyRoute {
                connector: id.to_string(),
            });
            continue;
        }
        if !routes.insert(route.to_string()) {
            errors.push(ValidationError::DuplicateRoute {
                connector: id.to_string(),
                route: route.to_string(),
            });
        }
        if parse_method(&op.method).is_none() {
            errors.push(ValidationError::UnsupportedMethod {
                connector: id.to_string(),
                route: route.to_string(),
                method: op.method.clone(),
            });
        }
    }
}
