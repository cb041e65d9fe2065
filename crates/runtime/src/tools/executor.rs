//! Tool execution.

use super::{ToolError, ToolRegistry, ToolResult};
use crate::model::ToolCall;
use futures::future::join_all;
use std::any::Any;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task;
use tracing::{info, warn};

/// Default per-call timeout.
pub const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(30);

/// How a batch of tool calls is run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExecutionMode {
    /// One call after another, in request order.
    #[default]
    Sequential,
    /// All calls at once. Results still come back in request order.
    Concurrent,
}

#[derive(Debug, Clone, Copy)]
pub struct ExecutorConfig {
    /// Upper bound for a single invocation.
    pub timeout: Duration,
    pub mode: ExecutionMode,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TOOL_TIMEOUT,
            mode: ExecutionMode::default(),
        }
    }
}

/// Maps tool calls onto registered capabilities.
///
/// Every call yields exactly one [`ToolResult`]; unknown tools, bad
/// arguments, capability errors, panics and timeouts all become failed
/// results rather than errors.
#[derive(Debug, Clone)]
pub struct ToolExecutor {
    registry: Arc<ToolRegistry>,
    config: ExecutorConfig,
}

impl ToolExecutor {
    pub fn new(registry: Arc<ToolRegistry>, config: ExecutorConfig) -> Self {
        Self { registry, config }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Execute a single tool call.
    pub async fn execute(&self, call: &ToolCall) -> ToolResult {
        match self.try_execute(call).await {
            Ok(output) => {
                info!(tool = %call.name, tool_call_id = %call.id, "tool succeeded");
                ToolResult::success(&call.id, output)
            }
            Err(error) => {
                warn!(
                    tool = %call.name,
                    tool_call_id = %call.id,
                    kind = error.kind(),
                    "tool failed: {error}"
                );
                ToolResult::failure(&call.id, error)
            }
        }
    }

    /// Execute a batch, returning one result per call in request order.
    pub async fn execute_all(&self, calls: &[ToolCall]) -> Vec<ToolResult> {
        match self.config.mode {
            ExecutionMode::Concurrent => {
                join_all(calls.iter().map(|call| self.execute(call))).await
            }
            ExecutionMode::Sequential => {
                let mut results = Vec::with_capacity(calls.len());
                for call in calls {
                    results.push(self.execute(call).await);
                }
                results
            }
        }
    }

    async fn try_execute(&self, call: &ToolCall) -> Result<serde_json::Value, ToolError> {
        let tool = self
            .registry
            .get(&call.name)
            .ok_or_else(|| ToolError::UnknownTool {
                name: call.name.clone(),
            })?;

        tool.schema.validate(&call.name, &call.arguments)?;

        info!(tool = %call.name, tool_call_id = %call.id, "invoking tool");
        let capability = Arc::clone(&tool.capability);
        let arguments = call.arguments.clone();
        let runtime = Handle::current();
        // Each invocation gets its own blocking-pool thread, so a capability
        // that blocks cannot hold up the timeout or its siblings.
        let invocation =
            task::spawn_blocking(move || runtime.block_on(capability.invoke(&arguments)));

        match tokio::time::timeout(self.config.timeout, invocation).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(join)) if join.is_panic() => Err(ToolError::invocation(format!(
                "tool panicked: {}",
                panic_message(join.into_panic().as_ref())
            ))),
            Ok(Err(join)) => Err(ToolError::invocation(format!("tool task failed: {join}"))),
            Err(_) => Err(ToolError::Timeout {
                millis: u64::try_from(self.config.timeout.as_millis()).unwrap_or(u64::MAX),
            }),
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ToolSpec;
    use crate::tools::{Capability, ToolOutcome};
    use async_trait::async_trait;
    use serde_json::{Map, Value, json};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Instant;

    /// Echoes `text` back after `delay_ms`.
    struct Echo {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Capability for Echo {
        async fn invoke(&self, arguments: &Map<String, Value>) -> Result<Value, ToolError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let delay = arguments.get("delay_ms").and_then(Value::as_u64).unwrap_or(0);
            tokio::time::sleep(Duration::from_millis(delay)).await;
            Ok(json!({ "echo": arguments["text"].clone() }))
        }
    }

    struct Failing;

    #[async_trait]
    impl Capability for Failing {
        async fn invoke(&self, _arguments: &Map<String, Value>) -> Result<Value, ToolError> {
            Err(ToolError::invocation("service unavailable"))
        }
    }

    struct Panicking;

    #[async_trait]
    impl Capability for Panicking {
        async fn invoke(&self, _arguments: &Map<String, Value>) -> Result<Value, ToolError> {
            panic!("boom")
        }
    }

    struct Hanging;

    #[async_trait]
    impl Capability for Hanging {
        async fn invoke(&self, _arguments: &Map<String, Value>) -> Result<Value, ToolError> {
            tokio::time::sleep(Duration::from_secs(3)).await;
            Ok(Value::Null)
        }
    }

    /// Holds its thread without yielding to the runtime.
    struct Blocking;

    #[async_trait]
    impl Capability for Blocking {
        async fn invoke(&self, _arguments: &Map<String, Value>) -> Result<Value, ToolError> {
            std::thread::sleep(Duration::from_secs(1));
            Ok(Value::Null)
        }
    }

    fn executor(mode: ExecutionMode) -> (ToolExecutor, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut registry = ToolRegistry::new();
        registry
            .register(
                ToolSpec::new(
                    "echo",
                    "Echo text",
                    json!({
                        "type": "object",
                        "properties": {
                            "text": {"type": "string"},
                            "delay_ms": {"type": "integer"}
                        },
                        "required": ["text"]
                    }),
                ),
                Echo {
                    calls: calls.clone(),
                },
            )
            .unwrap();
        registry
            .register(ToolSpec::new("failing", "Always fails", Value::Null), Failing)
            .unwrap();
        registry
            .register(ToolSpec::new("panicking", "Panics", Value::Null), Panicking)
            .unwrap();
        registry
            .register(ToolSpec::new("hanging", "Never returns", Value::Null), Hanging)
            .unwrap();
        registry
            .register(ToolSpec::new("blocking", "Blocks its thread", Value::Null), Blocking)
            .unwrap();

        let config = ExecutorConfig {
            timeout: Duration::from_millis(200),
            mode,
        };
        (ToolExecutor::new(Arc::new(registry), config), calls)
    }

    fn call(id: &str, name: &str, arguments: Value) -> ToolCall {
        ToolCall {
            id: id.into(),
            name: name.into(),
            arguments: arguments.as_object().cloned().unwrap_or_default(),
        }
    }

    #[tokio::test]
    async fn valid_call_returns_capability_output() {
        let (executor, calls) = executor(ExecutionMode::Sequential);
        let result = executor
            .execute(&call("c1", "echo", json!({"text": "hi"})))
            .await;

        assert_eq!(result, ToolResult::success("c1", json!({"echo": "hi"})));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unknown_tool_becomes_failed_result() {
        let (executor, _) = executor(ExecutionMode::Sequential);
        let result = executor
            .execute(&call("c1", "lookup_weather", json!({"city": "Berlin"})))
            .await;

        assert_eq!(result.tool_call_id, "c1");
        assert_eq!(
            result.error(),
            Some(&ToolError::UnknownTool {
                name: "lookup_weather".into()
            })
        );
    }

    #[tokio::test]
    async fn invalid_arguments_skip_invocation() {
        let (executor, calls) = executor(ExecutionMode::Sequential);

        let missing = executor.execute(&call("c1", "echo", json!({}))).await;
        let mismatch = executor.execute(&call("c2", "echo", json!({"text": 7}))).await;

        assert_eq!(missing.error().map(ToolError::kind), Some("missing_argument"));
        assert_eq!(mismatch.error().map(ToolError::kind), Some("type_mismatch"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn capability_error_is_captured() {
        let (executor, _) = executor(ExecutionMode::Sequential);
        let result = executor.execute(&call("c1", "failing", json!({}))).await;
        assert_eq!(
            result.error(),
            Some(&ToolError::invocation("service unavailable"))
        );
    }

    #[tokio::test]
    async fn panic_is_captured() {
        let (executor, _) = executor(ExecutionMode::Sequential);
        let result = executor.execute(&call("c1", "panicking", json!({}))).await;
        assert_eq!(
            result.error(),
            Some(&ToolError::invocation("tool panicked: boom"))
        );
    }

    #[tokio::test]
    async fn slow_tool_times_out() {
        let (executor, _) = executor(ExecutionMode::Sequential);
        let result = executor.execute(&call("c1", "hanging", json!({}))).await;
        assert_eq!(result.error(), Some(&ToolError::Timeout { millis: 200 }));
    }

    #[tokio::test]
    async fn blocking_tool_times_out_on_schedule() {
        let (executor, _) = executor(ExecutionMode::Sequential);
        let started = Instant::now();
        let result = executor.execute(&call("c1", "blocking", json!({}))).await;

        assert_eq!(result.error(), Some(&ToolError::Timeout { millis: 200 }));
        assert!(started.elapsed() < Duration::from_millis(900));
    }

    #[tokio::test]
    async fn blocking_tool_does_not_stall_concurrent_siblings() {
        let (executor, calls) = executor(ExecutionMode::Concurrent);
        let batch = [
            call("stuck", "blocking", json!({})),
            call("quick", "echo", json!({"text": "done"})),
        ];
        let started = Instant::now();

        let results = executor.execute_all(&batch).await;

        assert!(started.elapsed() < Duration::from_millis(900));
        assert_eq!(results[0].tool_call_id, "stuck");
        assert_eq!(results[0].error().map(ToolError::kind), Some("timeout"));
        assert_eq!(results[1], ToolResult::success("quick", json!({"echo": "done"})));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn concurrent_batch_preserves_request_order() {
        let (executor, _) = executor(ExecutionMode::Concurrent);
        let batch = [
            call("slow", "echo", json!({"text": "a", "delay_ms": 80})),
            call("broken", "failing", json!({})),
            call("fast", "echo", json!({"text": "c"})),
        ];

        let results = executor.execute_all(&batch).await;

        let ids: Vec<_> = results.iter().map(|r| r.tool_call_id.as_str()).collect();
        assert_eq!(ids, ["slow", "broken", "fast"]);
        assert!(!results[0].outcome.is_error());
        assert!(results[1].outcome.is_error());
        assert_eq!(
            results[2].outcome,
            ToolOutcome::Success {
                output: json!({"echo": "c"})
            }
        );
    }

    #[tokio::test]
    async fn sequential_batch_continues_past_failures() {
        let (executor, calls) = executor(ExecutionMode::Sequential);
        let batch = [
            call("1", "missing_tool", json!({})),
            call("2", "hanging", json!({})),
            call("3", "echo", json!({"text": "still runs"})),
        ];

        let results = executor.execute_all(&batch).await;

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].error().map(ToolError::kind), Some("unknown_tool"));
        assert_eq!(results[1].error().map(ToolError::kind), Some("timeout"));
        assert_eq!(results[2].tool_call_id, "3");
        assert!(!results[2].outcome.is_error());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn repeated_calls_are_independent() {
        let (executor, _) = executor(ExecutionMode::Sequential);
        let first = executor.execute(&call("a", "echo", json!({"text": "x"}))).await;
        let second = executor.execute(&call("b", "echo", json!({"text": "x"}))).await;
        assert_eq!(first.outcome, second.outcome);
    }
}
