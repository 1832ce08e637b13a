//! Transport error kinds.

use serde_json::{Value, json};
use thiserror::Error;

/// Errors raised by [`Transport`](super::Transport).
///
/// Connection failures, HTTP failures and stream-protocol failures are kept
/// apart so callers can decide what to retry.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection refused, reset or timed out.
    #[error("Server unavailable at {url}: {message}")]
    Unavailable { url: String, message: String },

    /// Non-2xx response. Status and body are kept verbatim.
    #[error("HTTP {status} from {url}: {body}")]
    Http {
        url: String,
        status: u16,
        body: String,
    },

    /// A streamed line was not valid JSON. Fatal for that stream only.
    #[error("Malformed stream payload {line:?}: {source}")]
    Protocol {
        line: String,
        #[source]
        source: serde_json::Error,
    },

    /// `get`/`post` called with a body or query asking for streaming.
    #[error("Streaming requested on a non-streaming call to {path}; use stream() instead")]
    StreamNotAllowed { path: String },

    /// `stream` called without `"stream": true` in the body.
    #[error("stream() requires \"stream\": true in the request body for {path}")]
    StreamRequired { path: String },

    /// The response parsed but did not have the expected shape.
    #[error("Unexpected response from {path}: {reason}")]
    UnexpectedResponse { path: String, reason: String },

    /// Any other client-side failure.
    #[error("Request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("Failed to serialize request body: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl TransportError {
    /// Classify a reqwest error. Connect and timeout failures are `Unavailable`.
    pub(crate) fn from_reqwest(url: &str, err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            Self::Unavailable {
                url: url.to_string(),
                message: err.to_string(),
            }
        } else {
            Self::Request(err)
        }
    }

    /// Whether the same call may succeed later without changes.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }

    /// Whether the caller used the wrong call for the stream flag.
    #[must_use]
    pub const fn is_misuse(&self) -> bool {
        matches!(
            self,
            Self::StreamNotAllowed { .. } | Self::StreamRequired { .. }
        )
    }

    /// Short machine-readable kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Unavailable { .. } => "unavailable_error",
            Self::Http { .. } => "http_error",
            Self::Protocol { .. } => "protocol_error",
            Self::StreamNotAllowed { .. } | Self::StreamRequired { .. } => "misuse_error",
            Self::UnexpectedResponse { .. } => "unexpected_response",
            Self::Request(_) => "request_error",
            Self::Serialize(_) => "serialize_error",
        }
    }

    /// HTTP status carried by the error, if any.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Render as an OpenAI-style `{"error": {code, message, type}}` body.
    ///
    /// HTTP errors whose body is already such an object are returned as-is.
    #[must_use]
    pub fn to_error_body(&self) -> Value {
        if let Self::Http { body, .. } = self {
            if let Ok(parsed) = serde_json::from_str::<Value>(body) {
                if parsed.get("error").is_some_and(Value::is_object) {
                    return parsed;
                }
            }
        }
        json!({
            "error": {
                "code": self.status().unwrap_or(500),
                "message": self.to_string(),
                "type": self.kind(),
            }
        })
    }
}
