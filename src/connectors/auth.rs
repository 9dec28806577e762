//! Outbound authentication strategies.
//!
//! Each connector carries exactly one strategy. The strategy decides what is
//! attached to the outbound call: an `Authorization` header, a query
//! parameter, or (for `None`) an empty `Authorization` header.

use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::header::{HeaderMap, HeaderValue, InvalidHeaderValue, AUTHORIZATION};

use crate::config::schema::AuthConfig;

/// How a connector authenticates its outbound calls.
#[derive(Clone, PartialEq, Eq)]
pub enum AuthStrategy {
    /// No credential. An empty `Authorization` header is still sent.
    None,
    /// `Authorization: Basic base64(username:password)`.
    Basic { username: String, password: String },
    /// `Authorization: Bearer <token>`.
    Bearer { token: String },
    /// Secret carried in the query string under `query_name`.
    ApiKey { query_name: String, secret: String },
}

impl AuthStrategy {
    /// Short label used in logs and the connector listing.
    pub fn kind(&self) -> &'static str {
        match self {
            AuthStrategy::None => "none",
            AuthStrategy::Basic { .. } => "basic",
            AuthStrategy::Bearer { .. } => "bearer",
            AuthStrategy::ApiKey { .. } => "api-key",
        }
    }

    /// The `Authorization` header value, or `None` when the strategy does not
    /// use the header at all.
    pub fn authorization_value(&self) -> Option<String> {
        match self {
            AuthStrategy::None => Some(String::new()),
            AuthStrategy::Basic { username, password } => {
                Some(format!("Basic {}", basic_token(username, password)))
            }
            AuthStrategy::Bearer { token } => Some(format!("Bearer {}", token)),
            AuthStrategy::ApiKey { .. } => None,
        }
    }

    /// The query parameter injected into every outbound call, if any.
    pub fn query_param(&self) -> Option<(&str, &str)> {
        match self {
            AuthStrategy::ApiKey { query_name, secret } => {
                Some((query_name.as_str(), secret.as_str()))
            }
            _ => None,
        }
    }

    /// Headers contributed by this strategy. Values are marked sensitive.
    pub fn headers(&self) -> Result<HeaderMap, InvalidHeaderValue> {
        let mut headers = HeaderMap::new();
        if let Some(value) = self.authorization_value() {
            let mut value = HeaderValue::from_str(&value)?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }
        Ok(headers)
    }
}

/// `base64(username + ":" + password)` with standard padding.
pub fn basic_token(username: &str, password: &str) -> String {
    STANDARD.encode(format!("{}:{}", username, password))
}

impl std::fmt::Debug for AuthStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthStrategy::None => f.write_str("None"),
            AuthStrategy::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
            AuthStrategy::Bearer { .. } => f
                .debug_struct("Bearer")
                .field("token", &"<redacted>")
                .finish(),
            AuthStrategy::ApiKey { query_name, .. } => f
                .debug_struct("ApiKey")
                .field("query_name", query_name)
                .field("secret", &"<redacted>")
                .finish(),
        }
    }
}

impl From<&AuthConfig> for AuthStrategy {
    fn from(config: &AuthConfig) -> Self {
        match config {
            AuthConfig::None => AuthStrategy::None,
            AuthConfig::Basic { username, password } => AuthStrategy::Basic {
                username: username.clone(),
                password: password.clone(),
            },
            AuthConfig::Bearer { token } => AuthStrategy::Bearer {
                token: token.clone(),
            },
            AuthConfig::ApiKey { query_name, secret } => AuthStrategy::ApiKey {
                query_name: query_name.clone(),
                secret: secret.clone(),
            },
        }
    }
}
