//! Chat domain types.
//!
//! These mirror the OpenAI-compatible message shape accepted by
//! llama-server's `/v1/chat/completions`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::settings::SamplingParams;

/// The role of a message sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
    Tool,
}

impl MessageRole {
    /// Parse a role from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "system" => Some(Self::System),
            "user" => Some(Self::User),
            "assistant" => Some(Self::Assistant),
            "tool" => Some(Self::Tool),
            _ => None,
        }
    }

    /// Convert role to string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::Tool => "tool",
        }
    }
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A fully received tool invocation issued by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    pub name: String,
    /// Parsed JSON arguments. Always valid JSON by construction.
    pub arguments: Value,
}

impl ToolCallRequest {
    #[must_use]
    pub fn new(name: impl Into<String>, arguments: Value) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }
}

/// A message in a conversation log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    /// Tool calls carried by an assistant message.
    #[serde(default, skip_serializing_if = "Option::is_none", with = "wire")]
    pub tool_calls: Option<Vec<ToolCallRequest>>,

    /// Tool identity on tool-role messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ChatMessage {
    fn text(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: Some(content.into()),
            tool_calls: None,
            name: None,
        }
    }

    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self::text(MessageRole::System, content)
    }

    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::text(MessageRole::User, content)
    }

    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::text(MessageRole::Assistant, content)
    }

    /// Assistant message requesting one or more tool invocations.
    #[must_use]
    pub const fn tool_request(calls: Vec<ToolCallRequest>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: None,
            tool_calls: Some(calls),
            name: None,
        }
    }

    /// Tool result fed back to the model.
    #[must_use]
    pub fn tool_result(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Tool,
            content: Some(content.into()),
            tool_calls: None,
            name: Some(name.into()),
        }
    }
}

/// Request body for `/v1/chat/completions`.
#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub messages: Vec<ChatMessage>,
    pub stream: bool,
    #[serde(flatten)]
    pub sampling: SamplingParams,
    /// Tool schemas, passed through untouched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<Value>>,
}

/// Request body for `/v1/completions`.
#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub prompt: String,
    pub stream: bool,
    #[serde(flatten)]
    pub sampling: SamplingParams,
}

/// OpenAI wire shape for tool calls: `{"type":"function","function":{"name","arguments"}}`
/// with `arguments` encoded as a JSON string.
mod wire {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use serde_json::Value;

    use super::ToolCallRequest;

    #[derive(Serialize, Deserialize)]
    struct WireToolCall {
        #[serde(rename = "type", default = "function_kind")]
        kind: String,
        function: WireFunction,
    }

    #[derive(Serialize, Deserialize)]
    struct WireFunction {
        name: String,
        #[serde(default)]
        arguments: String,
    }

    fn function_kind() -> String {
        "function".to_string()
    }

    impl From<&ToolCallRequest> for WireToolCall {
        fn from(call: &ToolCallRequest) -> Self {
            Self {
                kind: function_kind(),
                function: WireFunction {
                    name: call.name.clone(),
                    arguments: call.arguments.to_string(),
                },
            }
        }
    }

    impl From<WireToolCall> for ToolCallRequest {
        fn from(wire: WireToolCall) -> Self {
            let arguments = serde_json::from_str(&wire.function.arguments)
                .unwrap_or(Value::String(wire.function.arguments));
            Self {
                name: wire.function.name,
                arguments,
            }
        }
    }

    #[allow(clippy::ref_option)]
    pub fn serialize<S: Serializer>(
        calls: &Option<Vec<ToolCallRequest>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match calls {
            Some(calls) => {
                let wire: Vec<WireToolCall> = calls.iter().map(WireToolCall::from).collect();
                wire.serialize(serializer)
            }
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Vec<ToolCallRequest>>, D::Error> {
        let wire = Option::<Vec<WireToolCall>>::deserialize(deserializer)?;
        Ok(wire.map(|calls| calls.into_iter().map(ToolCallRequest::from).collect()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_role_parse() {
        assert_eq!(MessageRole::parse("tool"), Some(MessageRole::Tool));
        assert_eq!(MessageRole::parse("robot"), None);
        assert_eq!(MessageRole::Assistant.to_string(), "assistant");
    }

    #[test]
    fn test_plain_message_omits_empty_fields() {
        let json = serde_json::to_value(ChatMessage::user("hi")).unwrap();
        assert_eq!(json, json!({"role": "user", "content": "hi"}));
    }

    #[test]
    fn test_tool_request_uses_openai_shape() {
        let msg = ChatMessage::tool_request(vec![ToolCallRequest::new(
            "get_weather",
            json!({"city": "Paris"}),
        )]);
        let json = serde_json::to_value(&msg).unwrap();

        assert_eq!(json["role"], "assistant");
        assert!(json.get("content").is_none());
        let call = &json["tool_calls"][0];
        assert_eq!(call["type"], "function");
        assert_eq!(call["function"]["name"], "get_weather");
        assert_eq!(call["function"]["arguments"], r#"{"city":"Paris"}"#);
    }

    #[test]
    fn test_tool_calls_parse_back_into_json_arguments() {
        let raw = json!({
            "role": "assistant",
            "tool_calls": [{
                "type": "function",
                "function": {"name": "read_file", "arguments": "{\"path\":\"a.txt\"}"}
            }]
        });
        let msg: ChatMessage = serde_json::from_value(raw).unwrap();
        let calls = msg.tool_calls.unwrap();
        assert_eq!(calls[0].name, "read_file");
        assert_eq!(calls[0].arguments, json!({"path": "a.txt"}));
    }

    #[test]
    fn test_tool_result_carries_name() {
        let msg = ChatMessage::tool_result("shell", "ok");
        assert_eq!(msg.role, MessageRole::Tool);
        assert_eq!(msg.name.as_deref(), Some("shell"));
    }

    #[test]
    fn test_chat_request_flattens_sampling() {
        let request = ChatCompletionRequest {
            model: Some("qwen3".to_string()),
            messages: vec![ChatMessage::user("hello")],
            stream: true,
            sampling: SamplingParams {
                temperature: Some(0.5),
                ..Default::default()
            },
            tools: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "qwen3");
        assert_eq!(json["stream"], true);
        assert_eq!(json["temperature"], 0.5);
        assert!(json.get("tools").is_none());
    }
}
