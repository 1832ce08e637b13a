//! Model registry types as reported by a llama-server running in router mode.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Residency state of a model on the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelStatus {
    Loaded,
    Unloaded,
    Loading,
    Unloading,
    /// Any state string this client does not know about.
    #[default]
    #[serde(other)]
    Unknown,
}

impl ModelStatus {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Loaded => "loaded",
            Self::Unloaded => "unloaded",
            Self::Loading => "loading",
            Self::Unloading => "unloading",
            Self::Unknown => "unknown",
        }
    }

    /// Whether the model is between states.
    #[must_use]
    pub const fn is_transitional(&self) -> bool {
        matches!(self, Self::Loading | Self::Unloading)
    }
}

impl std::fmt::Display for ModelStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The `status` object of a registry entry.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ModelState {
    #[serde(default)]
    pub value: ModelStatus,

    /// Launch arguments the server uses for this model's worker.
    #[serde(default)]
    pub args: Vec<String>,

    /// Preset text, opaque to the client.
    #[serde(default)]
    pub preset: String,

    /// Set by the server when the last load attempt failed.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub failed: bool,
}

/// GGUF metadata attached to a `/v1/models` entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ModelMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n_vocab: Option<u64>,

    /// Context length the model was trained with.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n_ctx_train: Option<u64>,

    /// Embedding width.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n_embd: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n_params: Option<u64>,

    /// File size in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

/// One model known to the server's registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelRecord {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    #[serde(default)]
    pub status: ModelState,

    /// Present on `/v1/models` entries of a single-model server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<ModelMeta>,
}

impl ModelRecord {
    /// Model file path. Single-model servers use the path as the id.
    #[must_use]
    pub fn model_path(&self) -> &Path {
        Path::new(self.path.as_deref().unwrap_or(&self.id))
    }

    /// Name of the directory holding the model file, or the file stem when
    /// the path has no directory.
    #[must_use]
    pub fn model_name(&self) -> Option<String> {
        let path = self.model_path();
        path.parent()
            .and_then(Path::file_name)
            .map(|name| name.to_string_lossy().into_owned())
            .or_else(|| Self::id_from_path(path))
    }

    #[must_use]
    pub fn vocab_size(&self) -> Option<u64> {
        self.meta.and_then(|m| m.n_vocab)
    }

    /// Maximum sequence length (training context).
    #[must_use]
    pub fn max_seq_len(&self) -> Option<u64> {
        self.meta.and_then(|m| m.n_ctx_train)
    }

    #[must_use]
    pub fn max_embed_len(&self) -> Option<u64> {
        self.meta.and_then(|m| m.n_embd)
    }

    /// Derive the stable model id from a file path: the file stem.
    ///
    /// `models/qwen3-8b.gguf` becomes `qwen3-8b`.
    #[must_use]
    pub fn id_from_path(path: impl AsRef<Path>) -> Option<String> {
        path.as_ref()
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
    }
}

/// Body of `GET /models` and `GET /v1/models`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryListing {
    #[serde(default)]
    pub data: Vec<ModelRecord>,
}

impl RegistryListing {
    /// Entry at `slot`, in server order.
    #[must_use]
    pub fn slot(&self, slot: usize) -> Option<&ModelRecord> {
        self.data.get(slot)
    }
}

/// Subset of `GET /props` the client reads.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ModelProps {
    #[serde(default)]
    pub model_path: Option<String>,

    #[serde(default)]
    pub n_ctx: Option<u64>,

    #[serde(default)]
    pub chat_template: Option<String>,

    #[serde(default)]
    pub is_sleeping: bool,
}

impl ModelProps {
    /// Extract the fields of interest from a raw `/props` body.
    ///
    /// The context size lives under `default_generation_settings.n_ctx`.
    #[must_use]
    pub fn from_value(raw: &Value) -> Self {
        Self {
            model_path: raw
                .get("model_path")
                .and_then(Value::as_str)
                .map(ToString::to_string),
            n_ctx: raw
                .pointer("/default_generation_settings/n_ctx")
                .and_then(Value::as_u64),
            chat_template: raw
                .get("chat_template")
                .and_then(Value::as_str)
                .map(ToString::to_string),
            is_sleeping: raw
                .get("is_sleeping")
                .and_then(Value::as_bool)
                .unwrap_or(false),
        }
    }
}
