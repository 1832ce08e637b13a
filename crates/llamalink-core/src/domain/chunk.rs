//! Streaming chunk shapes for `/v1/chat/completions` and `/v1/completions`.
//!
//! Every field is optional on the wire. Missing and `null` fields both
//! deserialize to defaults so a sparse delta never fails to parse.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::chat::MessageRole;

/// One `data:` payload of a streaming response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatCompletionChunk {
    #[serde(default, deserialize_with = "null_as_default")]
    pub choices: Vec<ChunkChoice>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChunkChoice {
    #[serde(default, deserialize_with = "null_as_default")]
    pub index: u32,

    /// Chat-style delta.
    #[serde(default, deserialize_with = "null_as_default")]
    pub delta: ChunkDelta,

    /// Plain completion text (`/v1/completions`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChunkDelta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<MessageRole>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning_content: Option<String>,

    /// Field name some backends use instead of `reasoning_content`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,

    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub tool_calls: Vec<ToolCallDelta>,

    /// Refusal payload, forwarded untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refusal: Option<Value>,
}

/// One tool-call fragment inside a delta.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolCallDelta {
    #[serde(default, deserialize_with = "null_as_default")]
    pub index: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function: Option<FunctionDelta>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FunctionDelta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<String>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl ChunkDelta {
    /// Reasoning text, preferring `reasoning_content` over `reasoning`.
    #[must_use]
    pub fn reasoning_text(&self) -> Option<&str> {
        self.reasoning_content
            .as_deref()
            .filter(|s| !s.is_empty())
            .or(self.reasoning.as_deref())
    }
}

impl ChatCompletionChunk {
    /// The first choice, which is the only one llama-server emits.
    #[must_use]
    pub fn first_choice(&self) -> Option<&ChunkChoice> {
        self.choices.first()
    }
}

impl ChunkChoice {
    /// The delta with completion `text` folded into `content`.
    #[must_use]
    pub fn effective_delta(&self) -> ChunkDelta {
        let mut delta = self.delta.clone();
        if delta.content.is_none() {
            delta.content.clone_from(&self.text);
        }
        delta
    }
}
