//! Capability trait.

use super::ToolError;
use async_trait::async_trait;
use serde_json::{Map, Value};

/// A side-effecting capability bound to a registered tool.
///
/// This is the boundary between the orchestration loop and side effects.
/// Arguments have already been validated against the tool's schema when
/// `invoke` is called.
#[async_trait]
pub trait Capability: Send + Sync {
    async fn invoke(&self, arguments: &Map<String, Value>) -> Result<Value, ToolError>;
}
