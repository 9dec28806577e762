//! The connector base contract.
//!
//! A [`Connector`] pairs an immutable [`ConnectorConfig`] with the shared
//! outbound HTTP client. Every connector forwards the same way; only the
//! configuration (base URL, auth strategy, operations) differs.

use std::sync::Arc;
use std::time::Instant;

use reqwest::{Client, Method};
use thiserror::Error;
use url::Url;

use crate::connectors::auth::AuthStrategy;
use crate::connectors::forward::{
    form_pairs, join_url, merge_headers, merge_query, ForwardError, ForwardRequest,
    ForwardResponse, Params, Payload,
};
use crate::observability::metrics;

/// Why a base URL was refused.
#[derive(Debug, Error)]
pub enum BaseUrlError {
    #[error("{0}")]
    Parse(#[from] url::ParseError),

    #[error("unsupported scheme '{0}'")]
    UnsupportedScheme(String),
}

/// Parse a connector base URL and normalize it to end with exactly one slash.
pub fn parse_base_url(raw: &str) -> Result<Url, BaseUrlError> {
    let mut url = Url::parse(raw)?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(BaseUrlError::UnsupportedScheme(url.scheme().to_string()));
    }

    let trimmed = url.path().trim_end_matches('/').to_string();
    url.set_path(&format!("{}/", trimmed));
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

/// Methods a connector operation may use upstream.
pub fn parse_method(raw: &str) -> Option<Method> {
    match raw.to_ascii_uppercase().as_str() {
        "GET" => Some(Method::GET),
        "POST" => Some(Method::POST),
        "PUT" => Some(Method::PUT),
        "PATCH" => Some(Method::PATCH),
        "DELETE" => Some(Method::DELETE),
        _ => None,
    }
}

/// A named operation exposed by a connector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    /// Inbound route below `/connectors/<id>/`, without surrounding slashes.
    pub route: String,
    /// Upstream path joined onto the base URL.
    pub path: String,
    pub method: Method,
}

impl Operation {
    /// The outbound call for this operation with the caller's params and payload.
    pub fn request(&self, params: Params, payload: Payload) -> ForwardRequest {
        ForwardRequest::new(self.path.clone())
            .route(self.route.clone())
            .method(self.method.clone())
            .params(params)
            .payload(payload)
    }
}

/// Static description of one connector.
#[derive(Debug, Clone)]
pub struct ConnectorConfig {
    pub identifier: String,
    pub base_url: Url,
    pub auth: AuthStrategy,
    pub operations: Vec<Operation>,
}

impl ConnectorConfig {
    pub fn new(
        identifier: impl Into<String>,
        base_url: &str,
        auth: AuthStrategy,
    ) -> Result<Self, BaseUrlError> {
        Ok(Self {
            identifier: identifier.into(),
            base_url: parse_base_url(base_url)?,
            auth,
            operations: Vec::new(),
        })
    }

    /// Add an operation. The route is stored without surrounding slashes.
    pub fn with_operation(mut self, route: &str, path: &str, method: Method) -> Self {
        self.operations.push(Operation {
            route: route.trim_matches('/').to_string(),
            path: path.to_string(),
            method,
        });
        self
    }

    /// Look up an operation by its inbound route.
    pub fn operation(&self, route: &str) -> Option<&Operation> {
        let route = route.trim_matches('/');
        self.operations.iter().find(|op| op.route == route)
    }
}

/// A registered connector ready to forward calls.
#[derive(Debug, Clone)]
pub struct Connector {
    config: Arc<ConnectorConfig>,
    client: Client,
}

impl Connector {
    pub fn new(config: ConnectorConfig, client: Client) -> Self {
        Self {
            config: Arc::new(config),
            client,
        }
    }

    pub fn identifier(&self) -> &str {
        &self.config.identifier
    }

    pub fn config(&self) -> &ConnectorConfig {
        &self.config
    }

    /// Build the outbound request without sending it.
    pub fn build_request(&self, request: &ForwardRequest) -> Result<reqwest::Request, ForwardError> {
        let url = join_url(&self.config.base_url, &request.path)?;

        let auth_headers = self
            .config
            .auth
            .headers()
            .map_err(|_| ForwardError::InvalidCredential)?;
        let headers = merge_headers(auth_headers, &request.headers);
        let query = merge_query(self.config.auth.query_param(), &request.params);

        let mut builder = self
            .client
            .request(request.method.clone(), url)
            .headers(headers);
        if !query.is_empty() {
            builder = builder.query(&query);
        }

        let form = form_pairs(&request.payload);
        if !form.is_empty() {
            builder = builder.form(&form);
        }

        Ok(builder.build()?)
    }

    /// Issue one outbound call and normalize the response.
    ///
    /// Non-JSON bodies become `{}`. Upstream 4xx/5xx statuses are returned,
    /// not raised; only transport failures are errors.
    pub async fn forward(&self, request: ForwardRequest) -> Result<ForwardResponse, ForwardError> {
        let start = Instant::now();
        let outbound = self.build_request(&request)?;

        let result = self.execute(outbound).await;
        match &result {
            Ok(response) => {
                tracing::debug!(
                    connector = %self.config.identifier,
                    route = %request.route,
                    method = %request.method,
                    status = response.status.as_u16(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Forwarded request"
                );
                metrics::record_forward(
                    &self.config.identifier,
                    &request.route,
                    response.status.as_u16(),
                    start,
                );
            }
            Err(e) => {
                tracing::error!(
                    connector = %self.config.identifier,
                    route = %request.route,
                    method = %request.method,
                    error = %e,
                    "Upstream call failed"
                );
                if e.is_transport() {
                    metrics::record_transport_error(&self.config.identifier);
                }
            }
        }
        result
    }

    /// Forward the caller's params and payload through a named operation.
    pub async fn invoke(
        &self,
        operation: &Operation,
        params: Params,
        payload: Payload,
    ) -> Result<ForwardResponse, ForwardError> {
        self.forward(operation.request(params, payload)).await
    }

    async fn execute(&self, request: reqwest::Request) -> Result<ForwardResponse, ForwardError> {
        let response = self.client.execute(request).await?;
        let status = response.status();
        let body = response.bytes().await?;
        Ok(ForwardResponse::from_body(status, &body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
    use serde_json::json;

    fn connector(auth: AuthStrategy) -> Connector {
        let config = ConnectorConfig::new("test", "https://x/1", auth)
            .unwrap()
            .with_operation("/search/", "/search", Method::GET);
        Connector::new(config, Client::new())
    }

    #[test]
    fn test_parse_base_url_normalizes_trailing_slash() {
        assert_eq!(parse_base_url("https://x/1").unwrap().as_str(), "https://x/1/");
        assert_eq!(parse_base_url("https://x/1/").unwrap().as_str(), "https://x/1/");
        assert_eq!(parse_base_url("https://x/1//").unwrap().as_str(), "https://x/1/");
        assert_eq!(parse_base_url("https://x").unwrap().as_str(), "https://x/");
        assert!(matches!(
            parse_base_url("ftp://x/1/"),
            Err(BaseUrlError::UnsupportedScheme(_))
        ));
        assert!(parse_base_url("no scheme").is_err());
    }

    #[test]
    fn test_parse_method() {
        assert_eq!(parse_method("get"), Some(Method::GET));
        assert_eq!(parse_method("PATCH"), Some(Method::PATCH));
        assert_eq!(parse_method("TRACE"), None);
    }

    #[test]
    fn test_operation_lookup_ignores_slashes() {
        let c = connector(AuthStrategy::None);
        assert!(c.config().operation("search").is_some());
        assert!(c.config().operation("/search/").is_some());
        assert!(c.config().operation("other").is_none());
    }

    #[test]
    fn test_operation_request_carries_route() {
        let op = Operation {
            route: "search/movie".into(),
            path: "/search/movie".into(),
            method: Method::POST,
        };
        let request = op.request(vec![("query".into(), "alien".into())], Payload::new());
        assert_eq!(request.route, "search/movie");
        assert_eq!(request.path, "/search/movie");
        assert_eq!(request.method, Method::POST);
        assert_eq!(request.params, vec![("query".to_string(), "alien".to_string())]);
    }

    #[tokio::test]
    async fn test_build_request_api_key() {
        let c = connector(AuthStrategy::ApiKey {
            query_name: "token".into(),
            secret: "s3cret".into(),
        });
        let request = ForwardRequest::new("/search")
            .params(vec![("query".into(), "foo".into())]);
        let built = c.build_request(&request).unwrap();

        assert_eq!(built.method(), &Method::GET);
        assert_eq!(built.url().as_str(), "https://x/1/search?token=s3cret&query=foo");
        assert!(built.headers().get(AUTHORIZATION).is_none());
        assert!(built.body().is_none());
    }

    #[tokio::test]
    async fn test_build_request_caller_overrides_auth() {
        let c = connector(AuthStrategy::Bearer { token: "server".into() });

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer caller"));
        let request = ForwardRequest::new("/search").headers(headers);
        let built = c.build_request(&request).unwrap();

        assert_eq!(built.headers().get(AUTHORIZATION).unwrap(), "Bearer caller");
        assert_eq!(built.url().as_str(), "https://x/1/search");
    }

    #[tokio::test]
    async fn test_build_request_none_auth_sends_empty_header() {
        let c = connector(AuthStrategy::None);
        let built = c.build_request(&ForwardRequest::new("search")).unwrap();
        assert_eq!(built.headers().get(AUTHORIZATION).unwrap(), "");
    }

    #[tokio::test]
    async fn test_build_request_form_payload() {
        let c = connector(AuthStrategy::None);
        let payload = json!({"name": "x"}).as_object().unwrap().clone();
        let request = ForwardRequest::new("/search")
            .method(Method::POST)
            .payload(payload);
        let built = c.build_request(&request).unwrap();

        assert_eq!(built.method(), &Method::POST);
        assert_eq!(
            built.headers().get(reqwest::header::CONTENT_TYPE).unwrap(),
            "application/x-www-form-urlencoded"
        );
        assert_eq!(built.body().and_then(|b| b.as_bytes()), Some(&b"name=x"[..]));
    }

    #[tokio::test]
    async fn test_build_request_rejects_escaping_path() {
        let c = connector(AuthStrategy::None);
        let err = c.build_request(&ForwardRequest::new("../../etc")).unwrap_err();
        assert!(matches!(err, ForwardError::PathEscapesBase(_)));
        assert!(!err.is_transport());
    }

    #[tokio::test]
    async fn test_forward_transport_error() {
        // Bind then drop to get a port nothing listens on.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let config = ConnectorConfig::new(
            "closed",
            &format!("http://{}/", addr),
            AuthStrategy::Bearer { token: "hunter2".into() },
        )
        .unwrap();
        let client = Client::builder().no_proxy().build().unwrap();
        let c = Connector::new(config, client);

        let err = c.forward(ForwardRequest::new("/x")).await.unwrap_err();
        assert!(err.is_transport());
        assert!(!err.to_string().contains("hunter2"));
    }
}
