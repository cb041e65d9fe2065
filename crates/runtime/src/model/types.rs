use super::errors::ModelError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::future::Future;
use std::ops::AddAssign;

/// The role of a message sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    Tool,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::Tool => "tool",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tool call requested by the model.
///
/// Only ever produced by a backend's decision response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Identifier used to correlate the result.
    pub id: String,
    /// Name of the tool to invoke.
    pub name: String,
    /// Named arguments.
    #[serde(default)]
    pub arguments: Map<String, Value>,
}

/// A message in the conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Tool calls requested by an assistant message. Empty means none.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    /// Set on tool messages only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl Message {
    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: Some(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    /// Create an assistant message with text content.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: Some(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    /// Create an assistant message requesting tool calls.
    pub fn assistant_with_calls(content: Option<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            role: Role::Assistant,
            content,
            tool_calls,
            tool_call_id: None,
        }
    }

    /// Create a tool message answering the call with the given id.
    pub fn tool(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: Some(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: Some(tool_call_id.into()),
        }
    }

    /// Text content, or an empty string when absent.
    pub fn text(&self) -> &str {
        self.content.as_deref().unwrap_or_default()
    }

    /// Whether this message asks for tool execution.
    pub fn requests_tools(&self) -> bool {
        self.role == Role::Assistant && !self.tool_calls.is_empty()
    }
}

/// A tool definition offered to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    /// JSON Schema describing the parameters.
    pub parameters: Value,
}

impl ToolSpec {
    pub fn new(name: impl Into<String>, description: impl Into<String>, parameters: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

/// Token usage statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl Usage {
    pub fn total_tokens(&self) -> u32 {
        self.input_tokens.saturating_add(self.output_tokens)
    }
}

impl AddAssign for Usage {
    fn add_assign(&mut self, rhs: Self) {
        self.input_tokens = self.input_tokens.saturating_add(rhs.input_tokens);
        self.output_tokens = self.output_tokens.saturating_add(rhs.output_tokens);
    }
}

/// Everything needed for a model request.
///
/// An empty `tools` slice means no tools are offered.
#[derive(Debug, Clone, Copy)]
pub struct ModelRequest<'a> {
    pub messages: &'a [Message],
    pub tools: &'a [ToolSpec],
}

/// The response from a model.
#[derive(Debug, Clone)]
pub struct ModelResponse {
    pub message: Message,
    pub usage: Usage,
}

/// Trait for model backends.
pub trait Backend: Send + Sync {
    fn call(
        &self,
        request: ModelRequest<'_>,
    ) -> impl Future<Output = Result<ModelResponse, ModelError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_tool_calls_means_no_request() {
        let msg = Message::assistant_with_calls(Some("hi".into()), Vec::new());
        assert!(!msg.requests_tools());
        assert_eq!(msg.text(), "hi");
    }

    #[test]
    fn assistant_with_calls_requests_tools() {
        let msg = Message::assistant_with_calls(
            None,
            vec![ToolCall {
                id: "1".into(),
                name: "search".into(),
                arguments: Map::new(),
            }],
        );
        assert!(msg.requests_tools());
        assert_eq!(msg.text(), "");
    }

    #[test]
    fn tool_message_serializes_call_id() {
        let msg = Message::tool("call_1", r#"{"ok":true}"#);
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(
            value,
            json!({"role": "tool", "content": "{\"ok\":true}", "tool_call_id": "call_1"})
        );
    }

    #[test]
    fn usage_accumulates() {
        let mut usage = Usage {
            input_tokens: 10,
            output_tokens: 5,
        };
        usage += Usage {
            input_tokens: 3,
            output_tokens: 2,
        };
        assert_eq!(usage.total_tokens(), 20);
    }

    #[test]
    fn usage_saturates_instead_of_overflowing() {
        let mut usage = Usage {
            input_tokens: u32::MAX - 1,
            output_tokens: 7,
        };
        assert_eq!(usage.total_tokens(), u32::MAX);

        usage += Usage {
            input_tokens: 5,
            output_tokens: 1,
        };
        assert_eq!(usage.input_tokens, u32::MAX);
        assert_eq!(usage.output_tokens, 8);
        assert_eq!(usage.total_tokens(), u32::MAX);
    }
}
