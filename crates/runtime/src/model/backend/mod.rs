//! Model backends.

mod ollama;

pub use ollama::{DEFAULT_ENDPOINT, DEFAULT_MODEL, OllamaBackend, OllamaBackendBuilder};
