//! Rendering of classified stream events.
//!
//! Answer content and tool calls go to stdout; reasoning and refusals go to
//! stderr so piping the output keeps only the answer.

use std::io::{self, Stderr, Stdout, Write};

use llamalink_core::StreamEvent;
use serde_json::Value;

pub struct EventRenderer<O: Write, E: Write> {
    out: O,
    err: E,
}

impl EventRenderer<Stdout, Stderr> {
    pub fn terminal() -> Self {
        Self::new(io::stdout(), io::stderr())
    }
}

impl<O: Write, E: Write> EventRenderer<O, E> {
    pub const fn new(out: O, err: E) -> Self {
        Self { out, err }
    }

    pub fn render(&mut self, event: &StreamEvent) -> io::Result<()> {
        match event {
            StreamEvent::Role(role) => {
                tracing::debug!(%role, "Turn started");
            }
            StreamEvent::ReasoningOpen(text) => {
                write!(self.err, "[thinking] {text}")?;
                self.err.flush()?;
            }
            StreamEvent::Reasoning(text) => {
                write!(self.err, "{text}")?;
                self.err.flush()?;
            }
            StreamEvent::ReasoningClose(marker) => {
                write!(self.err, "{marker}")?;
                self.err.flush()?;
            }
            StreamEvent::Content(text) => {
                write!(self.out, "{text}")?;
                self.out.flush()?;
            }
            StreamEvent::ToolCall(call) => {
                writeln!(self.out, "\n[tool call] {}({})", call.name, call.arguments)?;
            }
            StreamEvent::Refusal(value) => {
                writeln!(self.err, "\n[refusal] {}", refusal_text(value))?;
            }
        }
        Ok(())
    }

    /// Terminate the output line once the turn is over.
    pub fn finish(&mut self) -> io::Result<()> {
        writeln!(self.out)?;
        self.out.flush()
    }

    pub fn into_parts(self) -> (O, E) {
        (self.out, self.err)
    }
}

fn refusal_text(value: &Value) -> String {
    value
        .as_str()
        .map_or_else(|| value.to_string(), ToString::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use llamalink_core::{MessageRole, ToolCallRequest};
    use serde_json::json;

    fn render(events: &[StreamEvent]) -> (String, String) {
        let mut renderer = EventRenderer::new(Vec::new(), Vec::new());
        for event in events {
            renderer.render(event).unwrap();
        }
        let (out, err) = renderer.into_parts();
        (
            String::from_utf8(out).unwrap(),
            String::from_utf8(err).unwrap(),
        )
    }

    #[test]
    fn test_reasoning_goes_to_stderr() {
        let (out, err) = render(&[
            StreamEvent::Role(MessageRole::Assistant),
            StreamEvent::ReasoningOpen("Let me".to_string()),
            StreamEvent::Reasoning(" think".to_string()),
            StreamEvent::reasoning_close(),
            StreamEvent::Content("42".to_string()),
        ]);
        assert_eq!(out, "42");
        assert_eq!(err, "[thinking] Let me think\n");
    }

    #[test]
    fn test_tool_call_and_refusal() {
        let (out, err) = render(&[
            StreamEvent::ToolCall(ToolCallRequest::new("lookup", json!({"q": "x"}))),
            StreamEvent::Refusal(json!("no")),
        ]);
        assert_eq!(out, "\n[tool call] lookup({\"q\":\"x\"})\n");
        assert_eq!(err, "\n[refusal] no\n");
    }
}
