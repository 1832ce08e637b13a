//! Typed events emitted by the stream classifier.

use serde::Serialize;
use serde_json::Value;

use crate::domain::chat::{MessageRole, ToolCallRequest};

/// Value carried by [`StreamEvent::ReasoningClose`].
pub const REASONING_CLOSE_MARKER: &str = "\n";

/// One semantic event decoded from a streaming response.
///
/// Serializes as `{"type": "...", "value": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum StreamEvent {
    Role(MessageRole),
    /// First fragment of a reasoning block.
    ReasoningOpen(String),
    /// Subsequent fragment of an open reasoning block.
    Reasoning(String),
    /// End of a reasoning block. Carries [`REASONING_CLOSE_MARKER`].
    ReasoningClose(String),
    Content(String),
    ToolCall(ToolCallRequest),
    /// Raw refusal payload from the server.
    Refusal(Value),
}

/// Discriminant of a [`StreamEvent`], handy for assertions and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Role,
    ReasoningOpen,
    Reasoning,
    ReasoningClose,
    Content,
    ToolCall,
    Refusal,
}

impl EventKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Role => "role",
            Self::ReasoningOpen => "reasoning_open",
            Self::Reasoning => "reasoning",
            Self::ReasoningClose => "reasoning_close",
            Self::Content => "content",
            Self::ToolCall => "tool_call",
            Self::Refusal => "refusal",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl StreamEvent {
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::Role(_) => EventKind::Role,
            Self::ReasoningOpen(_) => EventKind::ReasoningOpen,
            Self::Reasoning(_) => EventKind::Reasoning,
            Self::ReasoningClose(_) => EventKind::ReasoningClose,
            Self::Content(_) => EventKind::Content,
            Self::ToolCall(_) => EventKind::ToolCall,
            Self::Refusal(_) => EventKind::Refusal,
        }
    }

    /// Closing event for a reasoning block.
    #[must_use]
    pub fn reasoning_close() -> Self {
        Self::ReasoningClose(REASONING_CLOSE_MARKER.to_string())
    }
}
