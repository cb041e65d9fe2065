use thiserror::Error;

/// Errors from model backend calls.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ModelError {
    /// The backend could not be reached.
    #[error("network: {0}")]
    Network(String),

    /// The backend returned an error response.
    #[error("backend api: {0}")]
    Api(String),

    /// The backend response could not be parsed.
    #[error("invalid backend response: {0}")]
    InvalidResponse(String),
}
