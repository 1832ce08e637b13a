//! Client settings and sampling parameters.
//!
//! These are plain values constructed by the caller (usually the CLI) and
//! passed into the API layer. There is no process-wide settings object.

use serde::{Deserialize, Serialize};

/// Default seed sent with generation requests.
pub const DEFAULT_SEED: i64 = 1337;

/// Sampling parameters forwarded to the server with every generation request.
///
/// All fields are optional; `None` fields are omitted from the request body so
/// the server applies its own defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SamplingParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<i32>,

    /// Maximum tokens to generate. `-1` means "until end of generation".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<i32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f32>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stop: Vec<String>,
}

impl SamplingParams {
    /// Merge another set of parameters into this one, keeping values already set.
    pub fn merge_with(&mut self, other: &Self) {
        if self.temperature.is_none() {
            self.temperature = other.temperature;
        }
        if self.top_p.is_none() {
            self.top_p = other.top_p;
        }
        if self.top_k.is_none() {
            self.top_k = other.top_k;
        }
        if self.max_tokens.is_none() {
            self.max_tokens = other.max_tokens;
        }
        if self.seed.is_none() {
            self.seed = other.seed;
        }
        if self.presence_penalty.is_none() {
            self.presence_penalty = other.presence_penalty;
        }
        if self.frequency_penalty.is_none() {
            self.frequency_penalty = other.frequency_penalty;
        }
        if self.stop.is_empty() {
            self.stop.clone_from(&other.stop);
        }
    }

    /// Hardcoded fallbacks used when nothing else is configured.
    #[must_use]
    pub const fn with_hardcoded_defaults() -> Self {
        Self {
            temperature: Some(0.7),
            top_p: Some(0.95),
            top_k: None,
            max_tokens: Some(-1),
            seed: Some(DEFAULT_SEED),
            presence_penalty: Some(0.0),
            frequency_penalty: Some(0.0),
            stop: Vec::new(),
        }
    }
}

/// Per-session client settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct ClientSettings {
    /// Model identifier sent in request bodies (router mode selects by this).
    pub model: Option<String>,

    /// Whether generation requests stream by default.
    pub stream: Option<bool>,

    /// Sampling parameters.
    pub sampling: SamplingParams,
}

impl ClientSettings {
    /// Settings with sensible defaults.
    #[must_use]
    pub const fn with_defaults() -> Self {
        Self {
            model: None,
            stream: Some(true),
            sampling: SamplingParams::with_hardcoded_defaults(),
        }
    }

    /// Whether requests stream, defaulting to `true`.
    #[must_use]
    pub fn effective_stream(&self) -> bool {
        self.stream.unwrap_or(true)
    }
}

/// Settings validation error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SettingsError {
    #[error("Temperature must be between 0.0 and 2.0, got {0}")]
    InvalidTemperature(f32),

    #[error("top_p must be between 0.0 and 1.0, got {0}")]
    InvalidTopP(f32),

    #[error("max_tokens must be -1 or positive, got {0}")]
    InvalidMaxTokens(i32),

    #[error("Model identifier cannot be empty")]
    EmptyModel,
}

/// Validate settings values.
pub fn validate_settings(settings: &ClientSettings) -> Result<(), SettingsError> {
    let sampling = &settings.sampling;

    if let Some(t) = sampling.temperature {
        if !(0.0..=2.0).contains(&t) {
            return Err(SettingsError::InvalidTemperature(t));
        }
    }

    if let Some(p) = sampling.top_p {
        if !(0.0..=1.0).contains(&p) {
            return Err(SettingsError::InvalidTopP(p));
        }
    }

    if let Some(n) = sampling.max_tokens {
        if n == 0 || n < -1 {
            return Err(SettingsError::InvalidMaxTokens(n));
        }
    }

    if settings.model.as_ref().is_some_and(|m| m.trim().is_empty()) {
        return Err(SettingsError::EmptyModel);
    }

    Ok(())
}
