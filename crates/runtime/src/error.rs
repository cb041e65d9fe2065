use crate::model::ModelError;
use thiserror::Error;

/// Which backend round trip failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Decision,
    Synthesis,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Decision => f.write_str("decision"),
            Self::Synthesis => f.write_str("synthesis"),
        }
    }
}

/// Runtime errors.
///
/// Tool-level failures are not represented here; they are recovered into
/// failed tool results. Everything below ends a run.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("tool already registered: {0}")]
    DuplicateTool(String),

    #[error("invalid parameter schema for tool {tool}: {reason}")]
    InvalidSchema { tool: String, reason: String },

    #[error("{phase} request failed: {source}")]
    Backend {
        phase: Phase,
        #[source]
        source: ModelError,
    },

    #[error(
        "tool result {} has no matching tool call",
        .tool_call_id.as_deref().unwrap_or("<missing id>")
    )]
    OrphanToolResult { tool_call_id: Option<String> },

    #[error("tool execution produced no results")]
    NoToolResults,

    #[error("run cancelled")]
    Cancelled,
}

impl Error {
    /// Stable name of the error kind, for reporting.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DuplicateTool(_) => "duplicate_tool",
            Self::InvalidSchema { .. } => "invalid_schema",
            Self::Backend { .. } => "backend",
            Self::OrphanToolResult { .. } => "orphan_tool_result",
            Self::NoToolResults => "no_tool_results",
            Self::Cancelled => "cancelled",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_kind_is_distinct() {
        let errors = [
            Error::DuplicateTool("get_country_info".into()),
            Error::InvalidSchema {
                tool: "bad".into(),
                reason: "not an object".into(),
            },
            Error::Backend {
                phase: Phase::Decision,
                source: ModelError::Network("connection refused".into()),
            },
            Error::OrphanToolResult { tool_call_id: None },
            Error::NoToolResults,
            Error::Cancelled,
        ];

        let kinds: Vec<_> = errors.iter().map(Error::kind).collect();
        assert_eq!(
            kinds,
            [
                "duplicate_tool",
                "invalid_schema",
                "backend",
                "orphan_tool_result",
                "no_tool_results",
                "cancelled",
            ]
        );
    }

    #[test]
    fn orphan_without_id_names_the_gap() {
        let err = Error::OrphanToolResult { tool_call_id: None };
        assert_eq!(err.to_string(), "tool result <missing id> has no matching tool call");
    }
}
