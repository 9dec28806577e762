//! Connector registration and lookup.
//!
//! # Responsibilities
//! - Build every enabled built-in connector and each custom one from config
//! - Reject duplicate identifiers
//! - Resolve `(connector, route)` pairs for the HTTP layer
//!
//! # Design Decisions
//! - Immutable after construction, shared via Arc (no locks)
//! - Ordered map so listings are stable

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use thiserror::Error;

use crate::config::schema::{ConnectorsConfig, CustomConnectorConfig, ForwardingConfig, TimeoutConfig};
use crate::connectors::auth::AuthStrategy;
use crate::connectors::builtin;
use crate::connectors::connector::{parse_method, BaseUrlError, Connector, ConnectorConfig, Operation};

/// Errors raised while building or querying the registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("connector '{connector}' is missing required credential '{field}'")]
    MissingCredential { connector: String, field: &'static str },

    #[error("connector '{connector}' has an invalid base URL: {source}")]
    InvalidBaseUrl {
        connector: String,
        #[source]
        source: BaseUrlError,
    },

    #[error("connector '{connector}' route '{route}' uses unsupported method '{method}'")]
    UnsupportedMethod {
        connector: String,
        route: String,
        method: String,
    },

    #[error("connector '{0}' is already registered")]
    Duplicate(String),

    #[error("unknown connector '{0}'")]
    UnknownConnector(String),

    #[error("connector '{connector}' has no operation '{route}'")]
    UnknownOperation { connector: String, route: String },
}

/// Build the outbound client shared by every connector.
pub fn build_client(
    timeouts: &TimeoutConfig,
    forwarding: &ForwardingConfig,
) -> Result<Client, reqwest::Error> {
    let mut builder = Client::builder()
        .timeout(Duration::from_secs(timeouts.upstream_secs))
        .connect_timeout(Duration::from_secs(timeouts.connect_secs));
    if !forwarding.use_system_proxy {
        builder = builder.no_proxy();
    }
    builder.build()
}

/// Listing entry for one connector. Carries no auth material.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ConnectorDescription {
    pub identifier: String,
    pub base_url: String,
    pub auth: &'static str,
    pub operations: Vec<OperationDescription>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct OperationDescription {
    pub route: String,
    pub method: String,
    pub path: String,
}

/// All connectors available to the HTTP layer.
#[derive(Debug, Default)]
pub struct ConnectorRegistry {
    connectors: BTreeMap<String, Connector>,
}

impl ConnectorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every enabled built-in connector and all custom connectors.
    pub fn from_config(config: &ConnectorsConfig, client: Client) -> Result<Self, RegistryError> {
        let mut registry = Self::new();

        if config.trello.enabled {
            registry.register(Connector::new(builtin::trello(&config.trello)?, client.clone()))?;
        }
        if config.tmdb.enabled {
            registry.register(Connector::new(builtin::tmdb(&config.tmdb)?, client.clone()))?;
        }
        if config.staging.enabled {
            registry.register(Connector::new(builtin::staging(&config.staging)?, client.clone()))?;
        }
        for custom in &config.custom {
            registry.register(Connector::new(custom_connector(custom)?, client.clone()))?;
        }

        Ok(registry)
    }

    /// Add a connector. Identifiers must be unique.
    pub fn register(&mut self, connector: Connector) -> Result<(), RegistryError> {
        let id = connector.identifier().to_string();
        if self.connectors.contains_key(&id) {
            return Err(RegistryError::Duplicate(id));
        }

        if connector.config().auth == AuthStrategy::None {
            tracing::warn!(
                connector = %id,
                "Connector has no auth strategy; an empty Authorization header will be sent"
            );
        }

        tracing::info!(
            connector = %id,
            base_url = %connector.config().base_url,
            auth = connector.config().auth.kind(),
            operations = connector.config().operations.len(),
            "Connector registered"
        );

        self.connectors.insert(id, connector);
        Ok(())
    }

    pub fn get(&self, identifier: &str) -> Option<&Connector> {
        self.connectors.get(identifier)
    }

    /// Find the connector and operation an inbound route refers to.
    pub fn resolve(
        &self,
        identifier: &str,
        route: &str,
    ) -> Result<(&Connector, &Operation), RegistryError> {
        let connector = self
            .get(identifier)
            .ok_or_else(|| RegistryError::UnknownConnector(identifier.to_string()))?;

        let operation = connector.config().operation(route).ok_or_else(|| {
            RegistryError::UnknownOperation {
                connector: identifier.to_string(),
                route: route.trim_matches('/').to_string(),
            }
        })?;

        Ok((connector, operation))
    }

    pub fn describe(&self) -> Vec<ConnectorDescription> {
        self.connectors
            .values()
            .map(|connector| {
                let config = connector.config();
                ConnectorDescription {
                    identifier: config.identifier.clone(),
                    base_url: config.base_url.to_string(),
                    auth: config.auth.kind(),
                    operations: config
                        .operations
                        .iter()
                        .map(|op| OperationDescription {
                            route: op.route.clone(),
                            method: op.method.to_string(),
                            path: op.path.clone(),
                        })
                        .collect(),
                }
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.connectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connectors.is_empty()
    }
}

fn custom_connector(custom: &CustomConnectorConfig) -> Result<ConnectorConfig, RegistryError> {
    let id = custom.identifier.as_str();
    let mut config = ConnectorConfig::new(id, &custom.base_url, AuthStrategy::from(&custom.auth))
        .map_err(|source| RegistryError::InvalidBaseUrl {
            connector: id.to_string(),
            source,
        })?;

    for op in &custom.operations {
        let method = parse_method(&op.method).ok_or_else(|| RegistryError::UnsupportedMethod {
            connector: id.to_string(),
            route: op.route.clone(),
            method: op.method.clone(),
        })?;
        config = config.with_operation(&op.route, &op.path, method);
    }

    Ok(config)
}
