//! Domain types shared by the runtime and the CLI.

pub mod chat;
pub mod chunk;
pub mod model;

pub use chat::{ChatCompletionRequest, ChatMessage, CompletionRequest, MessageRole, ToolCallRequest};
pub use chunk::{ChatCompletionChunk, ChunkChoice, ChunkDelta, FunctionDelta, ToolCallDelta};
pub use model::{ModelMeta, ModelProps, ModelRecord, ModelState, ModelStatus, RegistryListing};
