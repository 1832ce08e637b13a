//! Client for llama-server's router mode (`/models`, `/models/load`, `/models/unload`).
//!
//! The registry is owned by the server. Every projection here takes a fresh
//! snapshot; nothing is cached between calls.

use std::collections::BTreeMap;
use std::time::Duration;

use llamalink_core::{ModelRecord, ModelStatus, RegistryListing};
use serde_json::{Value, json};
use thiserror::Error;
use tokio::time::{Instant, sleep};
use tracing::{debug, info};

use crate::transport::{Transport, TransportError};

/// Default delay between status polls.
pub const DEFAULT_LOAD_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Fixed-delay polling policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOptions {
    pub interval: Duration,
    /// `None` polls until the target state is reached.
    pub timeout: Option<Duration>,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            interval: DEFAULT_LOAD_POLL_INTERVAL,
            timeout: None,
        }
    }
}

impl PollOptions {
    #[must_use]
    pub const fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

#[derive(Debug, Error)]
pub enum RouterError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Rejected before contacting the load/unload endpoint.
    #[error("Unknown model '{id}'. Available: {}", .known.join(", "))]
    UnknownModel { id: String, known: Vec<String> },

    #[error("Model '{id}' did not reach {target} within {waited:?}")]
    Timeout {
        id: String,
        target: ModelStatus,
        waited: Duration,
    },

    #[error("Server reported that loading model '{id}' failed")]
    LoadFailed { id: String },
}

/// Result of a load or unload request.
#[derive(Debug, Clone, PartialEq)]
pub enum TransitionOutcome {
    /// The model was already in the requested state; nothing was sent.
    AlreadyInState(ModelStatus),
    /// The server acknowledged and the model reached the target state.
    Reached { waited: Duration, polls: u32 },
    /// The server did not acknowledge. Carries its raw response.
    NotAcknowledged(Value),
}

/// One progress report emitted while polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionProgress {
    pub status: ModelStatus,
    pub elapsed: Duration,
    pub polls: u32,
}

/// Observes the server's model registry and requests transitions.
#[derive(Debug, Clone)]
pub struct ModelRouter {
    transport: Transport,
    poll: PollOptions,
}

impl ModelRouter {
    #[must_use]
    pub fn new(transport: Transport) -> Self {
        Self {
            transport,
            poll: PollOptions::default(),
        }
    }

    #[must_use]
    pub const fn with_poll_options(mut self, poll: PollOptions) -> Self {
        self.poll = poll;
        self
    }

    #[must_use]
    pub const fn poll_options(&self) -> PollOptions {
        self.poll
    }

    /// Fresh registry snapshot.
    pub async fn records(&self) -> Result<Vec<ModelRecord>, RouterError> {
        let listing: RegistryListing = self
            .transport
            .get("/models", &[])
            .await?
            .into_typed("/models")?;
        Ok(listing.data)
    }

    pub async fn list_ids(&self) -> Result<Vec<String>, RouterError> {
        Ok(self.records().await?.into_iter().map(|r| r.id).collect())
    }

    pub async fn args_by_id(&self) -> Result<BTreeMap<String, Vec<String>>, RouterError> {
        Ok(self
            .records()
            .await?
            .into_iter()
            .map(|r| (r.id, r.status.args))
            .collect())
    }

    pub async fn presets_by_id(&self) -> Result<BTreeMap<String, String>, RouterError> {
        Ok(self
            .records()
            .await?
            .into_iter()
            .map(|r| (r.id, r.status.preset))
            .collect())
    }

    pub async fn status_by_id(&self) -> Result<BTreeMap<String, ModelStatus>, RouterError> {
        Ok(self
            .records()
            .await?
            .into_iter()
            .map(|r| (r.id, r.status.value))
            .collect())
    }

    pub async fn contains(&self, id: &str) -> Result<bool, RouterError> {
        Ok(self.records().await?.iter().any(|r| r.id == id))
    }

    /// Fetch the record for `id`, or fail with `UnknownModel`.
    pub async fn require(&self, id: &str) -> Result<ModelRecord, RouterError> {
        let records = self.records().await?;
        let known: Vec<String> = records.iter().map(|r| r.id.clone()).collect();
        records
            .into_iter()
            .find(|r| r.id == id)
            .ok_or_else(|| RouterError::UnknownModel {
                id: id.to_string(),
                known,
            })
    }

    /// Load a model and wait until it is `Loaded`.
    pub async fn load(&self, id: &str) -> Result<TransitionOutcome, RouterError> {
        self.load_with_progress(id, |_| {}).await
    }

    pub async fn load_with_progress(
        &self,
        id: &str,
        progress: impl FnMut(TransitionProgress),
    ) -> Result<TransitionOutcome, RouterError> {
        self.transition(id, "/models/load", ModelStatus::Loaded, progress)
            .await
    }

    /// Unload a model and wait until it is `Unloaded`.
    pub async fn unload(&self, id: &str) -> Result<TransitionOutcome, RouterError> {
        self.unload_with_progress(id, |_| {}).await
    }

    pub async fn unload_with_progress(
        &self,
        id: &str,
        progress: impl FnMut(TransitionProgress),
    ) -> Result<TransitionOutcome, RouterError> {
        self.transition(id, "/models/unload", ModelStatus::Unloaded, progress)
            .await
    }

    async fn transition(
        &self,
        id: &str,
        path: &str,
        target: ModelStatus,
        mut progress: impl FnMut(TransitionProgress),
    ) -> Result<TransitionOutcome, RouterError> {
        let record = self.require(id).await?;
        if record.status.value == target {
            debug!(model = id, status = %target, "Model already in requested state");
            return Ok(TransitionOutcome::AlreadyInState(target));
        }

        let response = match self.transport.post(path, &json!({ "model": id })).await {
            Ok(payload) => payload.as_json().cloned().unwrap_or(Value::Null),
            Err(TransportError::Http { status, body, .. }) => {
                debug!(model = id, status, "Transition request rejected");
                return Ok(TransitionOutcome::NotAcknowledged(
                    serde_json::from_str(&body).unwrap_or(Value::String(body)),
                ));
            }
            Err(e) => return Err(e.into()),
        };

        if response.get("success").and_then(Value::as_bool) != Some(true) {
            return Ok(TransitionOutcome::NotAcknowledged(response));
        }

        info!(model = id, target = %target, "Waiting for model");
        self.poll_until(id, target, &mut progress).await
    }

    async fn poll_until(
        &self,
        id: &str,
        target: ModelStatus,
        progress: &mut impl FnMut(TransitionProgress),
    ) -> Result<TransitionOutcome, RouterError> {
        let started = Instant::now();
        let mut polls = 0;

        loop {
            polls += 1;
            let record = self.require(id).await?;
            let status = record.status.value;
            let elapsed = started.elapsed();

            if status == target {
                info!(model = id, status = %status, ?elapsed, "Model transition complete");
                return Ok(TransitionOutcome::Reached {
                    waited: elapsed,
                    polls,
                });
            }
            if target == ModelStatus::Loaded && record.status.failed {
                return Err(RouterError::LoadFailed { id: id.to_string() });
            }

            debug!(model = id, status = %status, polls, ?elapsed, "Model not yet in target state");
            progress(TransitionProgress {
                status,
                elapsed,
                polls,
            });

            if let Some(limit) = self.poll.timeout {
                if elapsed >= limit {
                    return Err(RouterError::Timeout {
                        id: id.to_string(),
                        target,
                        waited: elapsed,
                    });
                }
            }
            sleep(self.poll.interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poll_options_default_has_no_timeout() {
        let poll = PollOptions::default();
        assert_eq!(poll.interval, DEFAULT_LOAD_POLL_INTERVAL);
        assert!(poll.timeout.is_none());

        let poll = poll.with_timeout(Duration::from_secs(3));
        assert_eq!(poll.timeout, Some(Duration::from_secs(3)));
    }

    #[test]
    fn test_unknown_model_message_lists_known_ids() {
        let err = RouterError::UnknownModel {
            id: "nope".to_string(),
            known: vec!["a".to_string(), "b".to_string()],
        };
        assert_eq!(err.to_string(), "Unknown model 'nope'. Available: a, b");
    }
}
