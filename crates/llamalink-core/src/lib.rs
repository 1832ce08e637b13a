//! Core types for llamalink.
//!
//! This crate has no I/O. It holds the endpoint and settings values passed
//! to every runtime component, the chat and model registry shapes exchanged
//! with llama-server, the per-turn [`StreamClassifier`] and the metrics
//! decoder.

pub mod domain;
pub mod endpoint;
pub mod metrics;
pub mod settings;
pub mod stream;

pub use domain::{
    ChatCompletionChunk, ChatCompletionRequest, ChatMessage, ChunkChoice, ChunkDelta,
    CompletionRequest, FunctionDelta, MessageRole, ModelMeta, ModelProps, ModelRecord, ModelState,
    ModelStatus, RegistryListing, ToolCallDelta, ToolCallRequest,
};
pub use endpoint::{Endpoint, EndpointError};
pub use metrics::{MetricNumber, MetricValue, Metrics};
pub use settings::{ClientSettings, SamplingParams, SettingsError, validate_settings};
pub use stream::{
    AssembledTurn, EventKind, IncompleteToolCall, StreamClassifier, StreamEvent,
    ToolCallBoundary, TurnAssembler,
};
