//! Health probing and readiness polling for llama-server.

use std::time::Duration;

use serde_json::{Value, json};
use tokio::time::{Instant, sleep, timeout};
use tracing::{debug, info};

use crate::transport::{Payload, Transport, TransportError};

/// Interval between readiness probes.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Result of one `GET /health` probe. Connection failures are a value, not
/// an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    Healthy,
    /// The server answered but is not ready (loading a model, no slot, ...).
    Unhealthy {
        code: u16,
        message: String,
        kind: String,
    },
    /// Nothing is listening, or the connection failed.
    Unavailable { message: String },
}

impl HealthStatus {
    #[must_use]
    pub const fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy)
    }

    /// Render as the body llama-server would return.
    #[must_use]
    pub fn to_body(&self) -> Value {
        match self {
            Self::Healthy => json!({"status": "ok"}),
            Self::Unhealthy {
                code,
                message,
                kind,
            } => json!({"error": {"code": code, "message": message, "type": kind}}),
            Self::Unavailable { message } => json!({
                "error": {"code": 500, "message": message, "type": "unavailable_error"}
            }),
        }
    }

    fn from_payload(payload: &Payload) -> Self {
        let status = payload
            .as_json()
            .and_then(|v| v.get("status"))
            .and_then(Value::as_str);
        match status {
            None | Some("ok") => Self::Healthy,
            Some(other) => Self::Unhealthy {
                code: 200,
                message: other.to_string(),
                kind: "unavailable_error".to_string(),
            },
        }
    }

    fn from_error(err: &TransportError) -> Self {
        match err {
            TransportError::Http { status, body, .. } => {
                let parsed: Option<Value> = serde_json::from_str(body).ok();
                let error = parsed.as_ref().and_then(|v| v.get("error"));
                let field = |name: &str| {
                    error
                        .and_then(|e| e.get(name))
                        .and_then(Value::as_str)
                        .map(ToString::to_string)
                };
                Self::Unhealthy {
                    code: *status,
                    message: field("message").unwrap_or_else(|| body.clone()),
                    kind: field("type").unwrap_or_else(|| "http_error".to_string()),
                }
            }
            other => Self::Unavailable {
                message: other.to_string(),
            },
        }
    }
}

/// Probe `GET /health` once.
pub async fn probe(transport: &Transport) -> HealthStatus {
    match transport.get("/health", &[]).await {
        Ok(payload) => HealthStatus::from_payload(&payload),
        Err(e) => HealthStatus::from_error(&e),
    }
}

/// Outcome of [`wait_for_health`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthWait {
    pub ready: bool,
    pub attempts: u32,
    /// Status seen on the last probe.
    pub last: HealthStatus,
}

/// Poll `/health` every `interval` until healthy or `deadline` elapses.
///
/// Unavailable and unhealthy answers are expected while the server starts
/// and are retried. A probe never runs past the deadline.
pub async fn wait_for_health(
    transport: &Transport,
    interval: Duration,
    deadline: Duration,
) -> HealthWait {
    let started = Instant::now();
    let end = started + deadline;
    let mut attempts = 0;

    info!(url = %transport.endpoint().base_url(), ?deadline, "Waiting for llama-server to be ready");

    loop {
        attempts += 1;
        let remaining = end.saturating_duration_since(Instant::now());
        let last = timeout(remaining, probe(transport))
            .await
            .unwrap_or_else(|_| HealthStatus::Unavailable {
                message: "health probe timed out".to_string(),
            });

        if last.is_healthy() {
            info!(attempts, elapsed = ?started.elapsed(), "llama-server is ready");
            return HealthWait {
                ready: true,
                attempts,
                last,
            };
        }
        debug!(attempts, status = ?last, "Server not ready, retrying");

        let remaining = end.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            info!(attempts, "llama-server did not become ready in time");
            return HealthWait {
                ready: false,
                attempts,
                last,
            };
        }
        sleep(interval.min(remaining)).await;
    }
}
