//! Tool registry.

use super::{Capability, ParameterSchema};
use crate::model::ToolSpec;
use crate::{Error, Result};
use std::collections::HashMap;
use std::sync::Arc;

/// A tool with its parsed schema and bound capability.
#[derive(Clone)]
pub struct RegisteredTool {
    pub schema: ParameterSchema,
    pub capability: Arc<dyn Capability>,
}

impl std::fmt::Debug for RegisteredTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredTool")
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

/// The set of tools offered to the model.
///
/// Specs are kept in registration order so prompts are reproducible.
#[derive(Debug, Default)]
pub struct ToolRegistry {
    specs: Vec<ToolSpec>,
    tools: HashMap<String, RegisteredTool>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool and bind it to a capability.
    ///
    /// Fails if the name is taken or the parameter schema is malformed.
    pub fn register(
        &mut self,
        spec: ToolSpec,
        capability: impl Capability + 'static,
    ) -> Result<()> {
        if self.tools.contains_key(&spec.name) {
            return Err(Error::DuplicateTool(spec.name));
        }

        let schema =
            ParameterSchema::from_value(&spec.parameters).map_err(|reason| Error::InvalidSchema {
                tool: spec.name.clone(),
                reason,
            })?;

        self.tools.insert(
            spec.name.clone(),
            RegisteredTool {
                schema,
                capability: Arc::new(capability),
            },
        );
        self.specs.push(spec);
        Ok(())
    }

    /// Builder-style [`register`](Self::register).
    pub fn with_tool(
        mut self,
        spec: ToolSpec,
        capability: impl Capability + 'static,
    ) -> Result<Self> {
        self.register(spec, capability)?;
        Ok(self)
    }

    /// All specs, in registration order.
    pub fn list_specs(&self) -> &[ToolSpec] {
        &self.specs
    }

    pub fn has(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&RegisteredTool> {
        self.tools.get(name)
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}
