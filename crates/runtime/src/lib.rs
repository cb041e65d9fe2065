//! Toolrelay runtime: model-driven tool calling.
//!
//! This crate lets a language model decide whether to call a tool to answer
//! a request, runs the requested tools, and feeds the results back to the
//! model for a final answer.
//!
//! # Overview
//!
//! The runtime is organized around these concepts:
//!
//! - **ToolRegistry**: The tool contracts offered to the model, each bound to
//!   a [`Capability`].
//! - **ToolExecutor**: Validates arguments and invokes capabilities. Tool
//!   failures come back as failed [`ToolResult`]s, never as errors.
//! - **ConversationState**: The append-only message log of a single run.
//! - **OrchestrationLoop**: Drives decision → execution → synthesis against a
//!   [`Backend`].
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use runtime::{
//!     CountryInfo, ExecutorConfig, OllamaBackend, OrchestrationLoop, ToolExecutor, ToolRegistry,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut registry = ToolRegistry::new();
//! registry.register(
//!     CountryInfo::spec(),
//!     CountryInfo::new(reqwest::Client::new(), "https://restcountries.com/v3.1"),
//! )?;
//!
//! let backend = OllamaBackend::builder("qwen3:4b").build()?;
//! let executor = ToolExecutor::new(Arc::new(registry), ExecutorConfig::default());
//! let orchestrator = OrchestrationLoop::new(backend, executor);
//!
//! let completion = orchestrator.run("What is the capital of Germany?").await?;
//! println!("{}", completion.answer);
//! # Ok(())
//! # }
//! ```

mod conversation;
mod error;
pub mod model;
mod orchestrator;
pub mod tools;

// Model protocol
pub use model::{
    Backend, Message, ModelError, ModelRequest, ModelResponse, OllamaBackend, Role, ToolCall,
    ToolSpec, Usage,
};

// Tools
pub use tools::{
    Capability, CountryInfo, ExecutionMode, ExecutorConfig, ToolError, ToolExecutor, ToolOutcome,
    ToolRegistry, ToolResult,
};

// Error types
pub use error::{Error, Phase, Result};

// Orchestration
pub use conversation::ConversationState;
pub use orchestrator::{Completion, OrchestrationLoop, RunFailure, RunState};
