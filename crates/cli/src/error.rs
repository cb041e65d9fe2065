//! CLI error types.

use crate::config::ConfigError;
use thiserror::Error;

/// CLI errors.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Configuration is invalid or could not be read.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The model backend could not be constructed.
    #[error("backend setup failed: {0}")]
    Backend(#[from] runtime::ModelError),

    /// The HTTP client for a tool could not be constructed.
    #[error("tool setup failed: {0}")]
    ToolSetup(String),

    /// An error occurred in the runtime layer.
    #[error(transparent)]
    Runtime(#[from] runtime::Error),

    /// An orchestration run failed.
    #[error(transparent)]
    Run(#[from] Box<runtime::RunFailure>),
}

pub type Result<T> = std::result::Result<T, Error>;
