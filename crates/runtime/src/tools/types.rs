//! Tool result types.

use super::ToolError;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Outcome of a tool execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ToolOutcome {
    Success { output: Value },
    Failure { error: ToolError },
}

impl ToolOutcome {
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Failure { .. })
    }
}

/// Result of a tool execution, paired with the call ID.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub tool_call_id: String,
    pub outcome: ToolOutcome,
}

impl ToolResult {
    /// Create a successful result.
    pub fn success(tool_call_id: impl Into<String>, output: Value) -> Self {
        Self {
            tool_call_id: tool_call_id.into(),
            outcome: ToolOutcome::Success { output },
        }
    }

    /// Create a failed result.
    pub fn failure(tool_call_id: impl Into<String>, error: ToolError) -> Self {
        Self {
            tool_call_id: tool_call_id.into(),
            outcome: ToolOutcome::Failure { error },
        }
    }

    pub fn error(&self) -> Option<&ToolError> {
        match &self.outcome {
            ToolOutcome::Failure { error } => Some(error),
            ToolOutcome::Success { .. } => None,
        }
    }

    /// Serialized payload placed in the tool message sent to the model.
    pub fn content(&self) -> String {
        match &self.outcome {
            ToolOutcome::Success { output } => output.to_string(),
            ToolOutcome::Failure { error } => {
                json!({ "error": error.to_string(), "kind": error.kind() }).to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_content_is_compact_json() {
        let result = ToolResult::success("1", json!({"capital": "Berlin"}));
        assert_eq!(result.content(), r#"{"capital":"Berlin"}"#);
        assert!(result.error().is_none());
    }

    #[test]
    fn failure_content_embeds_error_descriptor() {
        let result = ToolResult::failure(
            "1",
            ToolError::UnknownTool {
                name: "lookup_weather".into(),
            },
        );
        let payload: Value = serde_json::from_str(&result.content()).unwrap();
        assert_eq!(payload["kind"], "unknown_tool");
        assert_eq!(payload["error"], "unknown tool: lookup_weather");
        assert!(result.outcome.is_error());
    }
}
