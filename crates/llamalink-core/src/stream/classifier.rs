//! Incremental classifier turning streaming deltas into [`StreamEvent`]s.
//!
//! The classifier is a small state machine with two orthogonal parts:
//!
//! - a reasoning state (`Idle` / `Reasoning`) that brackets thinking text
//!   with exactly one open and one close event per block, fed either by
//!   `reasoning_content` or, when enabled, by `<think>` tags in content, and
//! - a tool-call accumulator that concatenates argument fragments until
//!   they form a complete JSON document.
//!
//! Each delta is processed in a fixed order: role, reasoning, content,
//! tool calls, refusal. One classifier handles one turn; create a new one
//! per request.

use serde_json::Value;
use tracing::{debug, warn};

use crate::domain::chat::ToolCallRequest;
use crate::domain::chunk::{ChatCompletionChunk, ChunkDelta, ToolCallDelta};

use super::event::StreamEvent;

/// Rule deciding when accumulated tool-call arguments are worth parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToolCallBoundary {
    /// Attempt a parse whenever the latest fragment, trimmed, ends with `}`.
    #[default]
    TrailingBrace,
    /// Attempt a parse when brace depth, counted outside string literals,
    /// returns to zero.
    BalancedBraces,
}

/// Tag opening an inline reasoning block in `content`.
pub const THINK_OPEN_TAG: &str = "<think>";
/// Tag closing an inline reasoning block in `content`.
pub const THINK_CLOSE_TAG: &str = "</think>";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum ReasoningState {
    #[default]
    Idle,
    /// Block opened by `reasoning_content`.
    Reasoning,
    /// Block opened by a `<think>` tag. `opened` is set once the open event
    /// has been emitted.
    Tagged { opened: bool },
}

/// Length of the longest proper prefix of `tag` that `text` ends with.
fn partial_tag_len(text: &str, tag: &str) -> usize {
    (1..tag.len())
        .rev()
        .find(|&len| text.ends_with(&tag[..len]))
        .unwrap_or(0)
}

/// Brace depth of a JSON text fed in arbitrary fragments.
///
/// Braces inside string literals (including escaped quotes) are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BraceDepth {
    depth: i64,
    opened: bool,
    in_string: bool,
    escaped: bool,
}

impl BraceDepth {
    /// Feed the next fragment.
    pub fn feed(&mut self, fragment: &str) {
        for ch in fragment.chars() {
            if self.in_string {
                if self.escaped {
                    self.escaped = false;
                } else if ch == '\\' {
                    self.escaped = true;
                } else if ch == '"' {
                    self.in_string = false;
                }
                continue;
            }
            match ch {
                '"' => self.in_string = true,
                '{' => {
                    self.depth += 1;
                    self.opened = true;
                }
                '}' => self.depth -= 1,
                _ => {}
            }
        }
    }

    /// True once at least one object was opened and every brace has closed.
    #[must_use]
    pub const fn is_balanced(&self) -> bool {
        self.opened && self.depth <= 0 && !self.in_string
    }

    #[must_use]
    pub const fn depth(&self) -> i64 {
        self.depth
    }
}

/// A tool call whose arguments never formed valid JSON.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncompleteToolCall {
    pub name: Option<String>,
    /// Concatenated argument text received so far.
    pub arguments: String,
}

/// Argument fragments for the tool call currently being streamed.
#[derive(Debug, Clone, Default)]
pub struct ToolCallAccumulator {
    name: Option<String>,
    fragments: Vec<String>,
    depth: BraceDepth,
}

impl ToolCallAccumulator {
    /// Whether nothing has been received for the current call.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.fragments.is_empty()
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Concatenation of all fragments received so far.
    #[must_use]
    pub fn arguments(&self) -> String {
        self.fragments.concat()
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = Some(name.to_string());
    }

    /// Append a fragment and report whether a parse should be attempted.
    pub fn push_fragment(&mut self, fragment: &str, boundary: ToolCallBoundary) -> bool {
        self.fragments.push(fragment.to_string());
        self.depth.feed(fragment);
        match boundary {
            ToolCallBoundary::TrailingBrace => fragment.trim_end().ends_with('}'),
            ToolCallBoundary::BalancedBraces => self.depth.is_balanced(),
        }
    }

    /// Parse the concatenated arguments. On success the accumulator is cleared.
    pub fn try_complete(&mut self) -> Result<ToolCallRequest, serde_json::Error> {
        let arguments: Value = serde_json::from_str(&self.arguments())?;
        let name = self.name.take().unwrap_or_default();
        self.clear();
        Ok(ToolCallRequest::new(name, arguments))
    }

    /// Drop the current call, returning it if anything had been received.
    pub fn abandon(&mut self) -> Option<IncompleteToolCall> {
        if self.is_empty() {
            return None;
        }
        let incomplete = IncompleteToolCall {
            name: self.name.take(),
            arguments: self.arguments(),
        };
        self.clear();
        Some(incomplete)
    }

    fn clear(&mut self) {
        self.name = None;
        self.fragments.clear();
        self.depth = BraceDepth::default();
    }
}

/// Per-turn classifier from raw deltas to ordered [`StreamEvent`]s.
#[derive(Debug, Default)]
pub struct StreamClassifier {
    reasoning: ReasoningState,
    tool_call: ToolCallAccumulator,
    boundary: ToolCallBoundary,
    think_tags: bool,
    /// Trailing content that may be the start of a split tag.
    tag_carry: String,
    parse_failures: usize,
    dropped: Vec<IncompleteToolCall>,
}

impl StreamClassifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Classifier using a specific tool-call boundary rule.
    #[must_use]
    pub fn with_boundary(boundary: ToolCallBoundary) -> Self {
        Self {
            boundary,
            ..Self::default()
        }
    }

    /// Also split `<think>`/`</think>` tags out of content and report the
    /// text between them as reasoning. llama-server streams reasoning this
    /// way when started with `--reasoning-format none`.
    #[must_use]
    pub fn with_think_tags(mut self) -> Self {
        self.think_tags = true;
        self
    }

    /// Whether a reasoning block is currently open.
    #[must_use]
    pub const fn in_reasoning(&self) -> bool {
        matches!(
            self.reasoning,
            ReasoningState::Reasoning | ReasoningState::Tagged { opened: true }
        )
    }

    /// Number of tool-call parse attempts that failed and kept accumulating.
    #[must_use]
    pub const fn parse_failures(&self) -> usize {
        self.parse_failures
    }

    /// Tool calls abandoned without ever parsing.
    #[must_use]
    pub fn dropped_tool_calls(&self) -> &[IncompleteToolCall] {
        &self.dropped
    }

    /// Classify one streaming chunk. Chunks without choices yield nothing.
    pub fn push_chunk(&mut self, chunk: &ChatCompletionChunk) -> Vec<StreamEvent> {
        match chunk.first_choice() {
            Some(choice) => self.push_delta(&choice.effective_delta()),
            None => Vec::new(),
        }
    }

    /// Classify one delta.
    pub fn push_delta(&mut self, delta: &ChunkDelta) -> Vec<StreamEvent> {
        let mut events = Vec::new();

        if let Some(role) = delta.role {
            events.push(StreamEvent::Role(role));
        }

        match delta.reasoning_text().filter(|s| !s.is_empty()) {
            Some(text) => self.push_reasoning_text(text, &mut events),
            None => {
                // A tag-opened block only ends at `</think>`
                if self.reasoning == ReasoningState::Reasoning {
                    self.reasoning = ReasoningState::Idle;
                    events.push(StreamEvent::reasoning_close());
                }
            }
        }

        if let Some(text) = delta.content.as_deref().filter(|s| !s.is_empty()) {
            if self.think_tags {
                self.push_tagged_content(text, &mut events);
            } else {
                events.push(StreamEvent::Content(text.to_string()));
            }
        }

        for fragment in &delta.tool_calls {
            if let Some(call) = self.push_tool_fragment(fragment) {
                events.push(StreamEvent::ToolCall(call));
            }
        }

        if let Some(refusal) = &delta.refusal {
            events.push(StreamEvent::Refusal(refusal.clone()));
        }

        events
    }

    /// End the turn.
    ///
    /// Closes a reasoning block left open and drops any tool call that never
    /// completed, logging it as a diagnostic.
    pub fn finish(&mut self) -> Vec<StreamEvent> {
        let mut events = Vec::new();
        // A partial tag that never completed was plain text
        let carry = std::mem::take(&mut self.tag_carry);
        self.push_text(&carry, &mut events);
        if self.in_reasoning() {
            events.push(StreamEvent::reasoning_close());
        }
        self.reasoning = ReasoningState::Idle;
        self.drop_pending("stream ended");
        events
    }

    /// Emit reasoning text, opening the block on its first fragment.
    fn push_reasoning_text(&mut self, text: &str, events: &mut Vec<StreamEvent>) {
        if self.in_reasoning() {
            events.push(StreamEvent::Reasoning(text.to_string()));
        } else {
            self.reasoning = match self.reasoning {
                ReasoningState::Tagged { .. } => ReasoningState::Tagged { opened: true },
                _ => ReasoningState::Reasoning,
            };
            events.push(StreamEvent::ReasoningOpen(text.to_string()));
        }
    }

    /// Emit content text as reasoning inside `<think>` tags, as content otherwise.
    fn push_text(&mut self, text: &str, events: &mut Vec<StreamEvent>) {
        if text.is_empty() {
            return;
        }
        if matches!(self.reasoning, ReasoningState::Tagged { .. }) {
            self.push_reasoning_text(text, events);
        } else {
            events.push(StreamEvent::Content(text.to_string()));
        }
    }

    fn push_tagged_content(&mut self, text: &str, events: &mut Vec<StreamEvent>) {
        let mut pending = std::mem::take(&mut self.tag_carry);
        pending.push_str(text);
        let mut rest = pending.as_str();

        loop {
            let tagged = matches!(self.reasoning, ReasoningState::Tagged { .. });
            let tag = if tagged { THINK_CLOSE_TAG } else { THINK_OPEN_TAG };

            let Some(pos) = rest.find(tag) else {
                let (text, carry) = rest.split_at(rest.len() - partial_tag_len(rest, tag));
                self.push_text(text, events);
                self.tag_carry = carry.to_string();
                return;
            };

            self.push_text(&rest[..pos], events);
            self.reasoning = match self.reasoning {
                ReasoningState::Tagged { opened } => {
                    if opened {
                        events.push(StreamEvent::reasoning_close());
                    }
                    ReasoningState::Idle
                }
                // `<think>` inside a native block continues it
                ReasoningState::Reasoning => ReasoningState::Tagged { opened: true },
                ReasoningState::Idle => ReasoningState::Tagged { opened: false },
            };
            rest = &rest[pos + tag.len()..];
        }
    }

    fn push_tool_fragment(&mut self, fragment: &ToolCallDelta) -> Option<ToolCallRequest> {
        let function = fragment.function.as_ref()?;

        if let Some(name) = function.name.as_deref().filter(|s| !s.is_empty()) {
            if !self.tool_call.arguments().is_empty() {
                self.drop_pending("new tool call started");
            }
            self.tool_call.set_name(name);
        }

        let arguments = function.arguments.as_deref().filter(|s| !s.is_empty())?;
        if !self.tool_call.push_fragment(arguments, self.boundary) {
            return None;
        }

        match self.tool_call.try_complete() {
            Ok(call) => {
                debug!(name = %call.name, "Tool call arguments complete");
                Some(call)
            }
            Err(e) => {
                self.parse_failures += 1;
                debug!(
                    name = self.tool_call.name().unwrap_or("<unnamed>"),
                    error = %e,
                    "Tool call arguments not yet valid JSON, accumulating"
                );
                None
            }
        }
    }

    fn drop_pending(&mut self, reason: &str) {
        if let Some(incomplete) = self.tool_call.abandon() {
            warn!(
                name = incomplete.name.as_deref().unwrap_or("<unnamed>"),
                received = incomplete.arguments.len(),
                reason,
                "Dropping incomplete tool call"
            );
            self.dropped.push(incomplete);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::chat::MessageRole;
    use crate::domain::chunk::FunctionDelta;
    use crate::stream::event::{EventKind, REASONING_CLOSE_MARKER};
    use serde_json::json;

    fn reasoning(text: &str) -> ChunkDelta {
        ChunkDelta {
            reasoning_content: Some(text.to_string()),
            ..Default::default()
        }
    }

    fn content(text: &str) -> ChunkDelta {
        ChunkDelta {
            content: Some(text.to_string()),
            ..Default::default()
        }
    }

    fn tool(name: Option<&str>, arguments: &str) -> ChunkDelta {
        ChunkDelta {
            tool_calls: vec![ToolCallDelta {
                index: 0,
                id: None,
                function: Some(FunctionDelta {
                    name: name.map(ToString::to_string),
                    arguments: Some(arguments.to_string()),
                }),
            }],
            ..Default::default()
        }
    }

    fn run(classifier: &mut StreamClassifier, deltas: &[ChunkDelta]) -> Vec<StreamEvent> {
        let mut events: Vec<StreamEvent> =
            deltas.iter().flat_map(|d| classifier.push_delta(d)).collect();
        events.extend(classifier.finish());
        events
    }

    fn kinds(events: &[StreamEvent]) -> Vec<EventKind> {
        events.iter().map(StreamEvent::kind).collect()
    }

    #[test]
    fn test_reasoning_then_answer_is_bracketed() {
        let mut classifier = StreamClassifier::new();
        let deltas = [
            ChunkDelta {
                role: Some(MessageRole::Assistant),
                ..Default::default()
            },
            reasoning("Let me"),
            reasoning(" think"),
            reasoning(" more"),
            content("Answer"),
            content(" here"),
        ];
        let events = run(&mut classifier, &deltas);

        assert_eq!(
            kinds(&events),
            vec![
                EventKind::Role,
                EventKind::ReasoningOpen,
                EventKind::Reasoning,
                EventKind::Reasoning,
                EventKind::ReasoningClose,
                EventKind::Content,
                EventKind::Content,
            ]
        );
        assert_eq!(events[1], StreamEvent::ReasoningOpen("Let me".to_string()));
        assert_eq!(
            events[4],
            StreamEvent::ReasoningClose(REASONING_CLOSE_MARKER.to_string())
        );
    }

    #[test]
    fn test_close_precedes_content_in_same_delta() {
        let mut classifier = StreamClassifier::new();
        classifier.push_delta(&reasoning("hmm"));
        let events = classifier.push_delta(&content("Yes"));
        assert_eq!(
            kinds(&events),
            vec![EventKind::ReasoningClose, EventKind::Content]
        );
    }

    #[test]
    fn test_reasoning_and_content_in_one_delta() {
        let mut classifier = StreamClassifier::new();
        let delta = ChunkDelta {
            reasoning_content: Some("a".to_string()),
            content: Some("b".to_string()),
            ..Default::default()
        };
        let events = classifier.push_delta(&delta);
        assert_eq!(
            kinds(&events),
            vec![EventKind::ReasoningOpen, EventKind::Content]
        );
    }

    #[test]
    fn test_two_reasoning_blocks_each_open_once() {
        let mut classifier = StreamClassifier::new();
        let events = run(
            &mut classifier,
            &[reasoning("a"), content("x"), reasoning("b"), reasoning("c")],
        );
        assert_eq!(
            kinds(&events),
            vec![
                EventKind::ReasoningOpen,
                EventKind::ReasoningClose,
                EventKind::Content,
                EventKind::ReasoningOpen,
                EventKind::Reasoning,
                EventKind::ReasoningClose,
            ]
        );
    }

    #[test]
    fn test_empty_fragments_emit_nothing() {
        let mut classifier = StreamClassifier::new();
        let events = run(&mut classifier, &[content(""), reasoning("")]);
        assert!(events.is_empty());
    }

    #[test]
    fn test_tool_call_across_fragments() {
        let mut classifier = StreamClassifier::new();
        let fragments = ["{\"ci", "ty\": \"Par", "is\", \"unit", "s\": \"C\"}"];
        let mut deltas = vec![tool(Some("get_weather"), fragments[0])];
        deltas.extend(fragments[1..].iter().map(|f| tool(None, f)));

        let events = run(&mut classifier, &deltas);

        assert_eq!(events.len(), 1);
        let StreamEvent::ToolCall(call) = &events[0] else {
            panic!("expected tool call, got {events:?}");
        };
        assert_eq!(call.name, "get_weather");
        let expected: Value = serde_json::from_str(&fragments.concat()).unwrap();
        assert_eq!(call.arguments, expected);
        assert!(classifier.dropped_tool_calls().is_empty());
    }

    #[test]
    fn test_nested_brace_false_positive_keeps_accumulating() {
        let mut classifier = StreamClassifier::new();
        let events = run(
            &mut classifier,
            &[
                tool(Some("f"), "{\"a\": {\"b\": 1}"),
                tool(None, ", \"c\": 2}"),
            ],
        );
        assert_eq!(classifier.parse_failures(), 1);
        assert_eq!(
            events,
            vec![StreamEvent::ToolCall(ToolCallRequest::new(
                "f",
                json!({"a": {"b": 1}, "c": 2})
            ))]
        );
    }

    #[test]
    fn test_trailing_brace_check_trims_whitespace() {
        let deltas = [tool(Some("f"), "{\"a\": 1"), tool(None, "} \n")];
        let mut classifier = StreamClassifier::new();
        assert_eq!(run(&mut classifier, &deltas).len(), 1);

        let garbled = [tool(Some("f"), "{\"a\": 1"), tool(None, "}\"")];
        let mut classifier = StreamClassifier::new();
        assert!(run(&mut classifier, &garbled).is_empty());
        assert_eq!(classifier.parse_failures(), 0);
        assert_eq!(classifier.dropped_tool_calls().len(), 1);
    }

    #[test]
    fn test_balanced_braces_ignores_braces_in_strings() {
        let mut classifier = StreamClassifier::with_boundary(ToolCallBoundary::BalancedBraces);
        let events = run(
            &mut classifier,
            &[
                tool(Some("write"), "{\"text\": \"a}"),
                tool(None, "b\\\"}\"}"),
            ],
        );
        assert_eq!(classifier.parse_failures(), 0);
        assert_eq!(
            events,
            vec![StreamEvent::ToolCall(ToolCallRequest::new(
                "write",
                json!({"text": "a}b\"}"})
            ))]
        );
    }

    #[test]
    fn test_dangling_tool_call_is_dropped_not_raised() {
        let mut classifier = StreamClassifier::new();
        let events = run(&mut classifier, &[tool(Some("f"), "{\"a\": ")]);

        assert!(events.iter().all(|e| e.kind() != EventKind::ToolCall));
        let dropped = classifier.dropped_tool_calls();
        assert_eq!(dropped.len(), 1);
        assert_eq!(dropped[0].name.as_deref(), Some("f"));
        assert_eq!(dropped[0].arguments, "{\"a\": ");
    }

    #[test]
    fn test_second_tool_call_after_first_completes() {
        let mut classifier = StreamClassifier::new();
        let events = run(
            &mut classifier,
            &[tool(Some("a"), "{}"), tool(Some("b"), "{\"x\": 1}")],
        );
        let names: Vec<&str> = events
            .iter()
            .filter_map(|e| match e {
                StreamEvent::ToolCall(call) => Some(call.name.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_reasoning_closes_before_tool_call() {
        let mut classifier = StreamClassifier::new();
        classifier.push_delta(&reasoning("plan"));
        let events = classifier.push_delta(&tool(Some("f"), "{}"));
        assert_eq!(
            kinds(&events),
            vec![EventKind::ReasoningClose, EventKind::ToolCall]
        );
    }

    #[test]
    fn test_finish_closes_open_reasoning() {
        let mut classifier = StreamClassifier::new();
        classifier.push_delta(&reasoning("still thinking"));
        assert_eq!(classifier.finish(), vec![StreamEvent::reasoning_close()]);
        assert!(classifier.finish().is_empty());
    }

    #[test]
    fn test_refusal_is_forwarded_raw() {
        let mut classifier = StreamClassifier::new();
        let delta = ChunkDelta {
            refusal: Some(json!("I can't help with that")),
            ..Default::default()
        };
        assert_eq!(
            classifier.push_delta(&delta),
            vec![StreamEvent::Refusal(json!("I can't help with that"))]
        );
    }

    #[test]
    fn test_completion_chunk_text_is_content() {
        let mut classifier = StreamClassifier::new();
        let chunk: ChatCompletionChunk =
            serde_json::from_value(json!({"choices": [{"text": "Once"}]})).unwrap();
        assert_eq!(
            classifier.push_chunk(&chunk),
            vec![StreamEvent::Content("Once".to_string())]
        );
        assert!(classifier.push_chunk(&ChatCompletionChunk::default()).is_empty());
    }

    #[test]
    fn test_both_reasoning_fields_open_once() {
        let mut classifier = StreamClassifier::new();
        let chunks = [
            json!({"choices": [{"delta": {"reasoning_content": "hm", "reasoning": "hm"}}]}),
            json!({"choices": [{"delta": {"content": "ok"}}]}),
        ];
        let events: Vec<StreamEvent> = chunks
            .into_iter()
            .map(|raw| serde_json::from_value::<ChatCompletionChunk>(raw).unwrap())
            .flat_map(|chunk| classifier.push_chunk(&chunk))
            .collect();
        assert_eq!(
            events,
            vec![
                StreamEvent::ReasoningOpen("hm".to_string()),
                StreamEvent::reasoning_close(),
                StreamEvent::Content("ok".to_string()),
            ]
        );
    }

    #[test]
    fn test_null_tool_calls_still_classified() {
        let mut classifier = StreamClassifier::new();
        let chunk: ChatCompletionChunk = serde_json::from_value(json!({
            "choices": [{"index": 0, "delta": {"role": "assistant", "content": "Hi", "tool_calls": null}}]
        }))
        .unwrap();
        assert_eq!(
            classifier.push_chunk(&chunk),
            vec![
                StreamEvent::Role(MessageRole::Assistant),
                StreamEvent::Content("Hi".to_string()),
            ]
        );
    }

    #[test]
    fn test_think_tags_drive_reasoning() {
        let mut classifier = StreamClassifier::new().with_think_tags();
        let events = run(
            &mut classifier,
            &[content("<think>plan"), content("</think>Answer")],
        );
        assert_eq!(
            events,
            vec![
                StreamEvent::ReasoningOpen("plan".to_string()),
                StreamEvent::reasoning_close(),
                StreamEvent::Content("Answer".to_string()),
            ]
        );
    }

    #[test]
    fn test_think_tag_split_across_chunks() {
        let mut classifier = StreamClassifier::new().with_think_tags();
        let events = run(
            &mut classifier,
            &[
                content("<thi"),
                content("nk>step one"),
                content(", step two</th"),
                content("ink>\n\nDone"),
            ],
        );
        assert_eq!(
            events,
            vec![
                StreamEvent::ReasoningOpen("step one".to_string()),
                StreamEvent::Reasoning(", step two".to_string()),
                StreamEvent::reasoning_close(),
                StreamEvent::Content("\n\nDone".to_string()),
            ]
        );
    }

    #[test]
    fn test_think_tags_in_one_fragment() {
        let mut classifier = StreamClassifier::new().with_think_tags();
        let events = run(&mut classifier, &[content("a<think>b</think>c<think></think>d")]);
        assert_eq!(
            events,
            vec![
                StreamEvent::Content("a".to_string()),
                StreamEvent::ReasoningOpen("b".to_string()),
                StreamEvent::reasoning_close(),
                StreamEvent::Content("c".to_string()),
                StreamEvent::Content("d".to_string()),
            ]
        );
    }

    #[test]
    fn test_unclosed_think_tag_closed_at_finish() {
        let mut classifier = StreamClassifier::new().with_think_tags();
        classifier.push_delta(&content("<think>still"));
        assert!(classifier.in_reasoning());
        assert_eq!(
            classifier.push_delta(&content(" going <")),
            vec![StreamEvent::Reasoning(" going ".to_string())]
        );
        assert_eq!(
            classifier.finish(),
            vec![
                StreamEvent::Reasoning("<".to_string()),
                StreamEvent::reasoning_close(),
            ]
        );
    }

    #[test]
    fn test_think_tags_ignored_by_default() {
        let mut classifier = StreamClassifier::new();
        assert_eq!(
            classifier.push_delta(&content("<think>plan")),
            vec![StreamEvent::Content("<think>plan".to_string())]
        );
    }

    #[test]
    fn test_brace_depth_tracks_fragments() {
        let mut depth = BraceDepth::default();
        depth.feed("{\"a\": {");
        assert_eq!(depth.depth(), 2);
        depth.feed("}}");
        assert!(depth.is_balanced());
    }
}
