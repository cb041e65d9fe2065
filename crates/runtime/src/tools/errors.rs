use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while executing a single tool call.
///
/// These never abort a run. The executor folds them into a failed
/// [`ToolResult`](super::ToolResult) that the model gets to see.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ToolError {
    #[error("unknown tool: {name}")]
    UnknownTool { name: String },

    #[error("missing required argument '{argument}' for tool {tool}")]
    MissingArgument { tool: String, argument: String },

    #[error("argument '{argument}' for tool {tool} must be {expected}, got {found}")]
    TypeMismatch {
        tool: String,
        argument: String,
        expected: String,
        found: String,
    },

    #[error("invocation failed: {message}")]
    Invocation { message: String },

    #[error("timeout after {millis}ms")]
    Timeout { millis: u64 },
}

impl ToolError {
    /// Create an invocation error.
    pub fn invocation(message: impl Into<String>) -> Self {
        Self::Invocation {
            message: message.into(),
        }
    }

    /// Stable snake_case name of the variant.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnknownTool { .. } => "unknown_tool",
            Self::MissingArgument { .. } => "missing_argument",
            Self::TypeMismatch { .. } => "type_mismatch",
            Self::Invocation { .. } => "invocation",
            Self::Timeout { .. } => "timeout",
        }
    }
}
