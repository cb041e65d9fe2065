//! Tool registry, validation and execution.

mod capability;
pub mod country;
pub mod errors;
pub mod executor;
pub mod registry;
pub mod schema;
pub mod types;

pub use capability::Capability;
pub use country::CountryInfo;
pub use errors::ToolError;
pub use executor::{ExecutionMode, ExecutorConfig, ToolExecutor};
pub use registry::{RegisteredTool, ToolRegistry};
pub use schema::{ParamType, Parameter, ParameterSchema};
pub use types::{ToolOutcome, ToolResult};
