//! Folding classified events back into conversation messages.

use serde_json::Value;

use crate::domain::chat::{ChatMessage, MessageRole, ToolCallRequest};

use super::event::StreamEvent;

/// Accumulates the events of one turn.
#[derive(Debug, Default)]
pub struct TurnAssembler {
    role: Option<MessageRole>,
    reasoning: String,
    content: String,
    tool_calls: Vec<ToolCallRequest>,
    refusal: Option<Value>,
}

/// The finished result of one streamed turn.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssembledTurn {
    pub role: Option<MessageRole>,
    /// Thinking text, kept apart from the answer.
    pub reasoning: Option<String>,
    pub content: Option<String>,
    pub tool_calls: Vec<ToolCallRequest>,
    pub refusal: Option<Value>,
}

impl TurnAssembler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: &StreamEvent) {
        match event {
            StreamEvent::Role(role) => self.role = Some(*role),
            StreamEvent::ReasoningOpen(text) | StreamEvent::Reasoning(text) => {
                self.reasoning.push_str(text);
            }
            StreamEvent::ReasoningClose(_) => {}
            StreamEvent::Content(text) => self.content.push_str(text),
            StreamEvent::ToolCall(call) => self.tool_calls.push(call.clone()),
            StreamEvent::Refusal(value) => self.refusal = Some(value.clone()),
        }
    }

    #[must_use]
    pub fn finish(self) -> AssembledTurn {
        AssembledTurn {
            role: self.role,
            reasoning: non_empty(self.reasoning),
            content: non_empty(self.content),
            tool_calls: self.tool_calls,
            refusal: self.refusal,
        }
    }
}

fn non_empty(text: String) -> Option<String> {
    if text.is_empty() { None } else { Some(text) }
}

impl AssembledTurn {
    /// Messages to append to the conversation log.
    ///
    /// Answer text becomes an assistant message; tool calls become a
    /// separate assistant message carrying the requests. Reasoning is never
    /// part of either.
    #[must_use]
    pub fn messages(&self) -> Vec<ChatMessage> {
        let mut messages = Vec::new();
        if let Some(content) = &self.content {
            messages.push(ChatMessage::assistant(content.clone()));
        }
        if !self.tool_calls.is_empty() {
            messages.push(ChatMessage::tool_request(self.tool_calls.clone()));
        }
        messages
    }

    #[must_use]
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_reasoning_kept_apart_from_content() {
        let mut assembler = TurnAssembler::new();
        for event in [
            StreamEvent::Role(MessageRole::Assistant),
            StreamEvent::ReasoningOpen("think".to_string()),
            StreamEvent::Reasoning("ing".to_string()),
            StreamEvent::reasoning_close(),
            StreamEvent::Content("Hello".to_string()),
            StreamEvent::Content(" world".to_string()),
        ] {
            assembler.push(&event);
        }
        let turn = assembler.finish();

        assert_eq!(turn.role, Some(MessageRole::Assistant));
        assert_eq!(turn.reasoning.as_deref(), Some("thinking"));
        assert_eq!(turn.content.as_deref(), Some("Hello world"));
        assert_eq!(turn.messages(), vec![ChatMessage::assistant("Hello world")]);
    }

    #[test]
    fn test_tool_calls_become_request_message() {
        let mut assembler = TurnAssembler::new();
        let call = ToolCallRequest::new("shell", json!({"cmd": "ls"}));
        assembler.push(&StreamEvent::ToolCall(call.clone()));
        let turn = assembler.finish();

        assert!(turn.has_tool_calls());
        assert!(turn.content.is_none());
        assert_eq!(turn.messages(), vec![ChatMessage::tool_request(vec![call])]);
    }

    #[test]
    fn test_empty_turn_has_no_messages() {
        assert!(TurnAssembler::new().finish().messages().is_empty());
    }
}
