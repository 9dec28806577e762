//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use crate::config::schema::ProxyConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variables consulted after the file is parsed.
pub const ENV_TRELLO_SECRET: &str = "TRELLO_SECRET";
pub const ENV_TMDB_TOKEN: &str = "NEW_CONNECTOR_TOKEN";
pub const ENV_STAGING_USERNAME: &str = "CROWDBOTICS_STAGING_USERNAME";
pub const ENV_STAGING_PASSWORD: &str = "CROWDBOTICS_STAGING_PASSWORD";
pub const ENV_BIND_ADDRESS: &str = "CONNECTOR_PROXY_BIND";

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load configuration from an optional TOML file, apply environment
/// overrides from the process environment, and validate the result.
pub fn load_config(path: Option<&Path>) -> Result<ProxyConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
            parse_config(&content)?
        }
        None => ProxyConfig::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Deserialize a TOML document without validating it.
pub fn parse_config(content: &str) -> Result<ProxyConfig, ConfigError> {
    toml::from_str(content).map_err(ConfigError::Parse)
}

/// Overlay secrets and the bind address from `lookup`.
///
/// Empty values are ignored so an exported-but-blank variable does not wipe a
/// secret set in the file.
pub fn apply_env_overrides<F>(config: &mut ProxyConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

    if let Some(secret) = get(ENV_TRELLO_SECRET) {
        config.connectors.trello.secret = Some(secret);
    }
    if let Some(token) = get(ENV_TMDB_TOKEN) {
        config.connectors.tmdb.token = Some(token);
    }
    if let Some(username) = get(ENV_STAGING_USERNAME) {
        config.connectors.staging.username = Some(username);
    }
    if let Some(password) = get(ENV_STAGING_PASSWORD) {
        config.connectors.staging.password = Some(password);
    }
    if let Some(bind) = get(ENV_BIND_ADDRESS) {
        config.listener.bind_address = bind;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{AuthConfig, LogFormat};
    use std::collections::HashMap;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert_eq!(config.connectors.trello.base_url, "https://api.trello.com/1/");
        assert!(config.connectors.tmdb.enabled);
        assert!(!config.forwarding.surface_upstream_status);
    }

    #[test]
    fn test_parse_full_document() {
        let config = parse_config(
            r#"
            [listener]
            bind_address = "127.0.0.1:9000"

            [observability]
            log_format = "json"

            [forwarding]
            surface_upstream_status = true

            [connectors.trello]
            secret = "t"

            [connectors.staging]
            enabled = false

            [[connectors.custom]]
            identifier = "example"
            base_url = "https://api.example.com/v2/"
            auth = { type = "api-key", query_name = "key", secret = "k" }
            operations = [{ route = "items", path = "/items" }]
            "#,
        )
        .unwrap();

        assert_eq!(config.listener.bind_address, "127.0.0.1:9000");
        assert_eq!(config.observability.log_format, LogFormat::Json);
        assert!(config.forwarding.surface_upstream_status);
        assert_eq!(config.connectors.trello.secret.as_deref(), Some("t"));
        assert!(!config.connectors.staging.enabled);

        let custom = &config.connectors.custom[0];
        assert_eq!(
            custom.auth,
            AuthConfig::ApiKey {
                query_name: "key".into(),
                secret: "k".into()
            }
        );
        assert_eq!(custom.operations[0].method, "GET");
    }

    #[test]
    fn test_parse_error() {
        let err = parse_config("[listener\nbind_address = ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_TRELLO_SECRET, "trello-secret"),
            (ENV_TMDB_TOKEN, "tmdb-token"),
            (ENV_STAGING_USERNAME, "user"),
            (ENV_STAGING_PASSWORD, ""),
        ]);

        let mut config = ProxyConfig::default();
        config.connectors.staging.password = Some("from-file".into());
        apply_env_overrides(&mut config, |k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.connectors.trello.secret.as_deref(), Some("trello-secret"));
        assert_eq!(config.connectors.tmdb.token.as_deref(), Some("tmdb-token"));
        assert_eq!(config.connectors.staging.username.as_deref(), Some("user"));
        // blank env value leaves the file value alone
        assert_eq!(config.connectors.staging.password.as_deref(), Some("from-file"));
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Some(Path::new("/nonexistent/connector-proxy.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
