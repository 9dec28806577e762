//! Built-in connectors: task board, movie metadata and internal staging.

use reqwest::Method;

use crate::config::schema::{StagingConfig, TmdbConfig, TrelloConfig};
use crate::connectors::auth::AuthStrategy;
use crate::connectors::connector::ConnectorConfig;
use crate::connectors::registry::RegistryError;

pub const TRELLO_ID: &str = "trello";
pub const TMDB_ID: &str = "tmdb";
pub const STAGING_ID: &str = "staging";

/// Query parameter carrying the task board secret.
pub const TRELLO_QUERY_NAME: &str = "token";

/// Task board: secret sent as `?token=`.
pub fn trello(config: &TrelloConfig) -> Result<ConnectorConfig, RegistryError> {
    let secret = credential(TRELLO_ID, "secret", config.secret.as_deref())?;
    let auth = AuthStrategy::ApiKey {
        query_name: TRELLO_QUERY_NAME.to_string(),
        secret,
    };

    Ok(base(TRELLO_ID, &config.base_url, auth)?
        .with_operation("search", "/search", Method::GET))
}

/// Movie metadata: bearer token.
pub fn tmdb(config: &TmdbConfig) -> Result<ConnectorConfig, RegistryError> {
    let token = credential(TMDB_ID, "token", config.token.as_deref())?;
    let auth = AuthStrategy::Bearer { token };

    Ok(base(TMDB_ID, &config.base_url, auth)?
        .with_operation("search/movie", "/search/movie", Method::GET)
        .with_operation("test", "/test", Method::GET)
        .with_operation("movie/changes", "/movie/changes", Method::GET))
}

/// Internal staging: basic auth. Upstream paths keep their trailing slash.
pub fn staging(config: &StagingConfig) -> Result<ConnectorConfig, RegistryError> {
    let username = credential(STAGING_ID, "username", config.username.as_deref())?;
    let password = credential(STAGING_ID, "password", config.password.as_deref())?;
    let auth = AuthStrategy::Basic { username, password };

    Ok(base(STAGING_ID, &config.base_url, auth)?
        .with_operation("app-types", "/app-types/", Method::GET)
        .with_operation(
            "catalog/code-components",
            "/catalog/code-components/",
            Method::GET,
        ))
}

fn base(id: &str, base_url: &str, auth: AuthStrategy) -> Result<ConnectorConfig, RegistryError> {
    ConnectorConfig::new(id, base_url, auth).map_err(|source| RegistryError::InvalidBaseUrl {
        connector: id.to_string(),
        source,
    })
}

fn credential(connector: &str, field: &'static str, value: Option<&str>) -> Result<String, RegistryError> {
    match value {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(RegistryError::MissingCredential {
            connector: connector.to_string(),
            field,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trello_operations() {
        let config = TrelloConfig {
            secret: Some("s".into()),
            ..TrelloConfig::default()
        };
        let connector = trello(&config).unwrap();
        assert_eq!(connector.base_url.as_str(), "https://api.trello.com/1/");
        assert_eq!(connector.auth.query_param(), Some(("token", "s")));
        assert_eq!(connector.operation("search").unwrap().path, "/search");
        assert_eq!(connector.operations.len(), 1);
    }

    #[test]
    fn test_tmdb_operations() {
        let config = TmdbConfig {
            token: Some("t".into()),
            ..TmdbConfig::default()
        };
        let connector = tmdb(&config).unwrap();
        let routes: Vec<_> = connector.operations.iter().map(|o| o.route.as_str()).collect();
        assert_eq!(routes, vec!["search/movie", "test", "movie/changes"]);
        assert!(connector.operations.iter().all(|o| o.method == Method::GET));
        assert_eq!(connector.auth.kind(), "bearer");
    }

    #[test]
    fn test_staging_operations() {
        let config = StagingConfig {
            username: Some("u".into()),
            password: Some("p".into()),
            ..StagingConfig::default()
        };
        let connector = staging(&config).unwrap();
        assert_eq!(
            connector.base_url.as_str(),
            "https://crowdbotics-slack-dev.herokuapp.com/api/v1/"
        );
        assert_eq!(connector.operation("app-types").unwrap().path, "/app-types/");
        assert_eq!(
            connector.operation("catalog/code-components").unwrap().path,
            "/catalog/code-components/"
        );
    }

    #[test]
    fn test_missing_credential() {
        let err = staging(&StagingConfig {
            username: Some("u".into()),
            ..StagingConfig::default()
        })
        .unwrap_err();
        assert!(matches!(
            err,
            RegistryError::MissingCredential { field: "password", .. }
        ));
    }
}
