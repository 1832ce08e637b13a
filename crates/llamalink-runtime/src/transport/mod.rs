//! Low-level HTTP transport to llama-server.
//!
//! [`Transport`] issues plain GET/POST calls and long-lived streaming POSTs
//! against the current [`Endpoint`]. The endpoint is shared behind a lock so
//! that changing host, port or headers takes effect on the next request.

mod error;
mod lines;

use std::sync::{Arc, PoisonError, RwLock};

use llamalink_core::Endpoint;
use reqwest::{Client, RequestBuilder, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

pub use error::TransportError;
pub use lines::ChunkStream;

/// Decoded body of a non-streaming response.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(Value),
    /// Body that was not valid JSON (for example Prometheus text).
    Text(String),
}

impl Payload {
    fn from_body(body: String) -> Self {
        serde_json::from_str(&body).map_or(Self::Text(body), Self::Json)
    }

    #[must_use]
    pub const fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            Self::Text(_) => None,
        }
    }

    /// Raw text, rendering JSON back to a string if needed.
    #[must_use]
    pub fn into_text(self) -> String {
        match self {
            Self::Json(value) => value.to_string(),
            Self::Text(text) => text,
        }
    }

    /// Deserialize a JSON payload into `T`.
    pub fn into_typed<T: DeserializeOwned>(self, path: &str) -> Result<T, TransportError> {
        match self {
            Self::Json(value) => {
                serde_json::from_value(value).map_err(|e| TransportError::UnexpectedResponse {
                    path: path.to_string(),
                    reason: e.to_string(),
                })
            }
            Self::Text(text) => Err(TransportError::UnexpectedResponse {
                path: path.to_string(),
                reason: format!("expected JSON, got {} bytes of text", text.len()),
            }),
        }
    }
}

/// HTTP client bound to a mutable [`Endpoint`].
#[derive(Debug, Clone)]
pub struct Transport {
    client: Client,
    endpoint: Arc<RwLock<Endpoint>>,
}

impl Transport {
    pub fn new(endpoint: Endpoint) -> Result<Self, TransportError> {
        let client = Client::builder().build().map_err(TransportError::Request)?;
        Ok(Self {
            client,
            endpoint: Arc::new(RwLock::new(endpoint)),
        })
    }

    /// Snapshot of the current endpoint.
    #[must_use]
    pub fn endpoint(&self) -> Endpoint {
        self.endpoint
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Mutate the endpoint in place. Visible to every clone of this transport.
    pub fn update_endpoint(&self, update: impl FnOnce(&mut Endpoint)) {
        let mut guard = self
            .endpoint
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        update(&mut guard);
    }

    /// `GET path?params`. Fails with `StreamNotAllowed` if the query asks to stream.
    pub async fn get(&self, path: &str, params: &[(&str, &str)]) -> Result<Payload, TransportError> {
        if params
            .iter()
            .any(|(k, v)| *k == "stream" && v.eq_ignore_ascii_case("true"))
        {
            return Err(TransportError::StreamNotAllowed {
                path: path.to_string(),
            });
        }

        let endpoint = self.endpoint();
        let url = endpoint.url(path);
        debug!(%url, "GET");

        let request = decorate(self.client.get(&url), &endpoint)
            .query(params)
            .timeout(endpoint.timeout);
        let response = request
            .send()
            .await
            .map_err(|e| TransportError::from_reqwest(&url, e))?;
        read_response(&url, response).await
    }

    /// `POST path` with a JSON body. Fails with `StreamNotAllowed` if the
    /// body sets `"stream": true`.
    pub async fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Payload, TransportError> {
        let body = serde_json::to_value(body)?;
        if wants_stream(&body) {
            return Err(TransportError::StreamNotAllowed {
                path: path.to_string(),
            });
        }

        let endpoint = self.endpoint();
        let url = endpoint.url(path);
        debug!(%url, "POST");

        let request = self
            .json_post(&url, &endpoint, &body)?
            .timeout(endpoint.timeout);
        let response = request
            .send()
            .await
            .map_err(|e| TransportError::from_reqwest(&url, e))?;
        read_response(&url, response).await
    }

    /// Open a streaming `POST path` and decode its `data:` lines.
    ///
    /// The body must set `"stream": true`; otherwise this fails with
    /// `StreamRequired` before any network call. No total timeout applies
    /// to streaming requests.
    pub async fn stream<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<ChunkStream, TransportError> {
        let body = serde_json::to_value(body)?;
        if !wants_stream(&body) {
            return Err(TransportError::StreamRequired {
                path: path.to_string(),
            });
        }

        let endpoint = self.endpoint();
        let url = endpoint.url(path);
        debug!(%url, "POST (stream)");

        let response = self
            .json_post(&url, &endpoint, &body)?
            .send()
            .await
            .map_err(|e| TransportError::from_reqwest(&url, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Http {
                url,
                status: status.as_u16(),
                body,
            });
        }

        Ok(lines::decode_chunks(response.bytes_stream(), url))
    }

    fn json_post(
        &self,
        url: &str,
        endpoint: &Endpoint,
        body: &Value,
    ) -> Result<RequestBuilder, TransportError> {
        let mut request = decorate(self.client.post(url), endpoint);
        if !endpoint
            .headers
            .keys()
            .any(|k| k.eq_ignore_ascii_case("content-type"))
        {
            request = request.header("Content-Type", "application/json");
        }
        Ok(request.body(serde_json::to_vec(body)?))
    }
}

fn decorate(mut request: RequestBuilder, endpoint: &Endpoint) -> RequestBuilder {
    for (name, value) in &endpoint.headers {
        request = request.header(name.as_str(), value.as_str());
    }
    request
}

fn wants_stream(body: &Value) -> bool {
    body.get("stream").and_then(Value::as_bool).unwrap_or(false)
}

async fn read_response(url: &str, response: Response) -> Result<Payload, TransportError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| TransportError::from_reqwest(url, e))?;

    if !status.is_success() {
        debug!(%url, status = status.as_u16(), "Request failed");
        return Err(TransportError::Http {
            url: url.to_string(),
            status: status.as_u16(),
            body,
        });
    }

    Ok(Payload::from_body(body))
}
