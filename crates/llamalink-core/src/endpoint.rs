//! Server endpoint configuration.
//!
//! An [`Endpoint`] describes where the inference server listens and how
//! requests to it are decorated. It is an explicit value handed to every
//! component that talks to the server; nothing reads ambient global state.

use std::collections::BTreeMap;
use std::time::Duration;

use thiserror::Error;
use tracing::debug;
use url::Url;

/// Default URL scheme for a local llama-server.
pub const DEFAULT_SCHEME: &str = "http";

/// Default host for a local llama-server.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default port llama-server binds to.
pub const DEFAULT_PORT: u16 = 8080;

/// Default request timeout for non-streaming calls.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// API key value that means "no authentication, talk to the local server".
pub const NO_KEY_SENTINEL: &str = "sk-no-key-required";

/// Environment variable overriding the server base URL.
pub const BASE_URL_ENV: &str = "OPENAI_BASE_URL";

/// Environment variable carrying the bearer token.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Errors raised while building an endpoint.
#[derive(Debug, Error)]
pub enum EndpointError {
    /// The base URL could not be parsed.
    #[error("Invalid base URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The base URL has no host component.
    #[error("Base URL '{0}' has no host")]
    MissingHost(String),

    /// The scheme has no known default port and none was given.
    #[error("Base URL '{0}' has no port and scheme has no default")]
    MissingPort(String),
}

/// Address, headers and timeout policy for the inference server.
///
/// The base URL is always derived from `scheme`, `host` and `port` at the
/// moment it is needed, so changing any field affects the next request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub scheme: String,
    pub host: String,
    pub port: u16,
    /// Headers attached to every request.
    pub headers: BTreeMap<String, String>,
    /// Timeout applied to non-streaming requests.
    pub timeout: Duration,
}

impl Default for Endpoint {
    fn default() -> Self {
        Self::local(DEFAULT_PORT)
    }
}

impl Endpoint {
    /// Endpoint for a llama-server on the loopback interface.
    #[must_use]
    pub fn local(port: u16) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        Self {
            scheme: DEFAULT_SCHEME.to_string(),
            host: DEFAULT_HOST.to_string(),
            port,
            headers,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Parse an endpoint from a base URL such as `http://localhost:8080/v1`.
    ///
    /// Any path component is dropped: request paths are always absolute
    /// (`/v1/chat/completions`, `/health`), so keeping a `/v1` suffix would
    /// double it.
    pub fn from_base_url(raw: &str) -> Result<Self, EndpointError> {
        let url = Url::parse(raw).map_err(|e| EndpointError::InvalidUrl {
            url: raw.to_string(),
            reason: e.to_string(),
        })?;

        let host = url
            .host_str()
            .ok_or_else(|| EndpointError::MissingHost(raw.to_string()))?
            .to_string();
        let port = url
            .port_or_known_default()
            .ok_or_else(|| EndpointError::MissingPort(raw.to_string()))?;

        if !matches!(url.path(), "" | "/") {
            debug!(path = %url.path(), "Ignoring path component of base URL");
        }

        Ok(Self {
            scheme: url.scheme().to_string(),
            host,
            port,
            ..Self::default()
        })
    }

    /// Resolve an endpoint from the `OPENAI_BASE_URL` / `OPENAI_API_KEY` pair.
    ///
    /// An explicit base URL wins. Without one the local default is used.
    /// A key other than [`NO_KEY_SENTINEL`] is attached as a bearer token.
    pub fn from_env_values(
        base_url: Option<&str>,
        api_key: Option<&str>,
    ) -> Result<Self, EndpointError> {
        let endpoint = match base_url.map(str::trim).filter(|s| !s.is_empty()) {
            Some(url) => Self::from_base_url(url)?,
            None => Self::default(),
        };

        Ok(match api_key.map(str::trim) {
            Some(key) if !key.is_empty() && key != NO_KEY_SENTINEL => endpoint.with_bearer(key),
            _ => endpoint,
        })
    }

    /// Resolve an endpoint from the process environment.
    pub fn from_env() -> Result<Self, EndpointError> {
        let base_url = std::env::var(BASE_URL_ENV).ok();
        let api_key = std::env::var(API_KEY_ENV).ok();
        Self::from_env_values(base_url.as_deref(), api_key.as_deref())
    }

    /// `scheme://host:port`, computed fresh on every call.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("{}://{}:{}", self.scheme, self.host, self.port)
    }

    /// Absolute URL for a request path.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url(), path)
        } else {
            format!("{}/{}", self.base_url(), path)
        }
    }

    /// Attach an `Authorization: Bearer` header.
    #[must_use]
    pub fn with_bearer(mut self, token: &str) -> Self {
        self.headers
            .insert("Authorization".to_string(), format!("Bearer {token}"));
        self
    }

    /// Set the non-streaming request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Whether a bearer token is configured.
    #[must_use]
    pub fn has_bearer(&self) -> bool {
        self.headers.contains_key("Authorization")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_local() {
        let endpoint = Endpoint::default();
        assert_eq!(endpoint.base_url(), "http://127.0.0.1:8080");
        assert_eq!(
            endpoint.headers.get("Content-Type").map(String::as_str),
            Some("application/json")
        );
        assert!(!endpoint.has_bearer());
    }

    #[test]
    fn test_base_url_follows_mutation() {
        let mut endpoint = Endpoint::default();
        assert_eq!(endpoint.url("/health"), "http://127.0.0.1:8080/health");

        endpoint.port = 9001;
        endpoint.host = "localhost".to_string();
        assert_eq!(endpoint.url("health"), "http://localhost:9001/health");
    }

    #[test]
    fn test_from_base_url_drops_path() {
        let endpoint = Endpoint::from_base_url("http://localhost:8080/v1").unwrap();
        assert_eq!(endpoint.scheme, "http");
        assert_eq!(endpoint.host, "localhost");
        assert_eq!(endpoint.port, 8080);
        assert_eq!(
            endpoint.url("/v1/models"),
            "http://localhost:8080/v1/models"
        );
    }

    #[test]
    fn test_from_base_url_uses_scheme_default_port() {
        let endpoint = Endpoint::from_base_url("https://example.com").unwrap();
        assert_eq!(endpoint.port, 443);
    }

    #[test]
    fn test_from_base_url_rejects_garbage() {
        let err = Endpoint::from_base_url("not a url").unwrap_err();
        assert!(matches!(err, EndpointError::InvalidUrl { .. }));
    }

    #[test]
    fn test_sentinel_key_means_no_auth() {
        let endpoint = Endpoint::from_env_values(None, Some(NO_KEY_SENTINEL)).unwrap();
        assert_eq!(endpoint.base_url(), "http://127.0.0.1:8080");
        assert!(!endpoint.has_bearer());
    }

    #[test]
    fn test_real_key_adds_bearer() {
        let endpoint =
            Endpoint::from_env_values(Some("http://10.0.0.2:9000"), Some("secret")).unwrap();
        assert_eq!(endpoint.base_url(), "http://10.0.0.2:9000");
        assert_eq!(
            endpoint.headers.get("Authorization").map(String::as_str),
            Some("Bearer secret")
        );
    }

    #[test]
    fn test_blank_base_url_falls_back_to_local() {
        let endpoint = Endpoint::from_env_values(Some("  "), None).unwrap();
        assert_eq!(endpoint, Endpoint::default());
    }
}
