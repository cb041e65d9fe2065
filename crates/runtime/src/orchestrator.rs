//! The decision → execution → synthesis loop.

use crate::conversation::ConversationState;
use crate::error::Phase;
use crate::model::{Backend, Message, ModelError, ModelRequest, ModelResponse, Role, Usage};
use crate::tools::ToolExecutor;
use crate::{Error, Result};
use std::future::Future;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Where a run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Init,
    AwaitingDecision,
    /// The model answered directly without requesting tools.
    NoToolTerminal,
    Executing,
    AwaitingSynthesis,
    Done,
    Failed,
}

impl RunState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::AwaitingDecision => "awaiting_decision",
            Self::NoToolTerminal => "no_tool_terminal",
            Self::Executing => "executing",
            Self::AwaitingSynthesis => "awaiting_synthesis",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A successfully finished run.
#[derive(Debug, Clone)]
pub struct Completion {
    /// Either [`RunState::Done`] or [`RunState::NoToolTerminal`].
    pub state: RunState,
    /// Content of the last assistant message.
    pub answer: String,
    pub conversation: ConversationState,
    /// Tokens spent across all backend calls of the run.
    pub usage: Usage,
}

/// A failed run, with the conversation as it was when the run stopped.
#[derive(Debug, thiserror::Error)]
#[error("run failed while {stage}: {error}")]
pub struct RunFailure {
    #[source]
    pub error: Error,
    /// The stage that was active when the run failed.
    pub stage: RunState,
    pub conversation: ConversationState,
}

impl RunFailure {
    pub fn state(&self) -> RunState {
        RunState::Failed
    }
}

struct Run {
    state: RunState,
    conversation: ConversationState,
    usage: Usage,
}

impl Run {
    fn transition(&mut self, next: RunState) {
        debug!(from = %self.state, to = %next, "run state transition");
        self.state = next;
    }
}

/// Mediates between the model backend and the tool executor.
///
/// Each run makes at most two backend calls: one decision call offering
/// the registered tools, and, if tools were requested, one synthesis call
/// after every tool result has been appended.
pub struct OrchestrationLoop<B> {
    backend: B,
    executor: ToolExecutor,
}

impl<B: Backend> OrchestrationLoop<B> {
    pub fn new(backend: B, executor: ToolExecutor) -> Self {
        Self { backend, executor }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn executor(&self) -> &ToolExecutor {
        &self.executor
    }

    /// Run the protocol for one user request.
    pub async fn run(
        &self,
        prompt: impl Into<String>,
    ) -> std::result::Result<Completion, RunFailure> {
        self.run_with_cancel(prompt, &CancellationToken::new()).await
    }

    /// Run the protocol, aborting the current stage once `cancel` fires.
    pub async fn run_with_cancel(
        &self,
        prompt: impl Into<String>,
        cancel: &CancellationToken,
    ) -> std::result::Result<Completion, RunFailure> {
        let mut run = Run {
            state: RunState::Init,
            conversation: ConversationState::seeded(prompt),
            usage: Usage::default(),
        };

        match self.drive(&mut run, cancel).await {
            Ok(()) => {
                let answer = run
                    .conversation
                    .last()
                    .map(|m| m.text().to_string())
                    .unwrap_or_default();
                info!(state = %run.state, tokens = run.usage.total_tokens(), "run finished");
                Ok(Completion {
                    state: run.state,
                    answer,
                    conversation: run.conversation,
                    usage: run.usage,
                })
            }
            Err(err) => {
                error!(stage = %run.state, kind = err.kind(), "run failed: {err}");
                Err(RunFailure {
                    error: err,
                    stage: run.state,
                    conversation: run.conversation,
                })
            }
        }
    }

    async fn drive(&self, run: &mut Run, cancel: &CancellationToken) -> Result<()> {
        run.transition(RunState::AwaitingDecision);
        let decision = self
            .ask(
                Phase::Decision,
                ModelRequest {
                    messages: run.conversation.snapshot(),
                    tools: self.executor.registry().list_specs(),
                },
                cancel,
            )
            .await?;
        run.usage += decision.usage;

        let calls = decision.message.tool_calls.clone();
        run.conversation.append(decision.message)?;

        if calls.is_empty() {
            run.transition(RunState::NoToolTerminal);
            return Ok(());
        }

        run.transition(RunState::Executing);
        info!(count = calls.len(), "model requested tool calls");
        // Results are joined before anything is appended, so a cancelled
        // batch leaves no partial tool messages behind.
        let results = until_cancelled(cancel, self.executor.execute_all(&calls)).await?;
        if results.is_empty() {
            return Err(Error::NoToolResults);
        }
        for result in &results {
            run.conversation
                .append(Message::tool(&result.tool_call_id, result.content()))?;
        }

        run.transition(RunState::AwaitingSynthesis);
        let synthesis = self
            .ask(
                Phase::Synthesis,
                ModelRequest {
                    messages: run.conversation.snapshot(),
                    tools: &[],
                },
                cancel,
            )
            .await?;
        run.usage += synthesis.usage;
        run.conversation.append(synthesis.message)?;

        run.transition(RunState::Done);
        Ok(())
    }

    async fn ask(
        &self,
        phase: Phase,
        request: ModelRequest<'_>,
        cancel: &CancellationToken,
    ) -> Result<ModelResponse> {
        debug!(
            %phase,
            messages = request.messages.len(),
            tools = request.tools.len(),
            "calling backend"
        );
        let response = until_cancelled(cancel, self.backend.call(request))
            .await?
            .map_err(|source| Error::Backend { phase, source })?;

        if response.message.role != Role::Assistant {
            return Err(Error::Backend {
                phase,
                source: ModelError::InvalidResponse(format!(
                    "expected an assistant message, got {}",
                    response.message.role
                )),
            });
        }
        Ok(response)
    }
}

async fn until_cancelled<F: Future>(cancel: &CancellationToken, fut: F) -> Result<F::Output> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Error::Cancelled),
        output = fut => Ok(output),
    }
}
