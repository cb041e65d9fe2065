//! Parameter schema parsing and argument validation.

use super::ToolError;
use serde_json::{Map, Value};

/// JSON type a parameter may take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
    Null,
}

impl ParamType {
    fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "string" => Self::String,
            "number" => Self::Number,
            "integer" => Self::Integer,
            "boolean" => Self::Boolean,
            "array" => Self::Array,
            "object" => Self::Object,
            "null" => Self::Null,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Object => "object",
            Self::Null => "null",
        }
    }

    fn matches(&self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Number => value.is_number(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Boolean => value.is_boolean(),
            Self::Array => value.is_array(),
            Self::Object => value.is_object(),
            Self::Null => value.is_null(),
        }
    }
}

/// A single declared parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    /// Accepted types. Empty accepts anything.
    pub types: Vec<ParamType>,
}

/// Parsed form of a tool's JSON Schema parameter object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterSchema {
    pub parameters: Vec<Parameter>,
    pub required: Vec<String>,
}

impl ParameterSchema {
    /// Parse a `{"type": "object", "properties": {..}, "required": [..]}` schema.
    pub fn from_value(schema: &Value) -> Result<Self, String> {
        let schema = match schema {
            Value::Object(map) => map,
            // No parameters at all.
            Value::Null => return Ok(Self::default()),
            other => return Err(format!("schema must be an object, got {}", json_type(other))),
        };

        match schema.get("type") {
            None => {}
            Some(Value::String(t)) if t == "object" => {}
            Some(other) => return Err(format!("top-level type must be \"object\", got {other}")),
        }

        let mut parameters = Vec::new();
        if let Some(properties) = schema.get("properties") {
            let properties = properties
                .as_object()
                .ok_or_else(|| "properties must be an object".to_string())?;
            for (name, property) in properties {
                parameters.push(Parameter {
                    name: name.clone(),
                    types: parse_types(name, property)?,
                });
            }
        }

        let mut required = Vec::new();
        if let Some(list) = schema.get("required") {
            let list = list
                .as_array()
                .ok_or_else(|| "required must be an array".to_string())?;
            for entry in list {
                let name = entry
                    .as_str()
                    .ok_or_else(|| format!("required entries must be strings, got {entry}"))?;
                required.push(name.to_string());
            }
        }

        Ok(Self {
            parameters,
            required,
        })
    }

    /// Check arguments against this schema.
    ///
    /// Required parameters are checked first, then declared types. Extra
    /// arguments are left alone.
    pub fn validate(&self, tool: &str, arguments: &Map<String, Value>) -> Result<(), ToolError> {
        for name in &self.required {
            if arguments.get(name).is_none_or(Value::is_null) {
                return Err(ToolError::MissingArgument {
                    tool: tool.to_string(),
                    argument: name.clone(),
                });
            }
        }

        for param in &self.parameters {
            let Some(value) = arguments.get(&param.name) else {
                continue;
            };
            if param.types.is_empty() || param.types.iter().any(|t| t.matches(value)) {
                continue;
            }
            // An explicit null on an optional parameter counts as absent.
            if value.is_null() && !self.required.contains(&param.name) {
                continue;
            }
            return Err(ToolError::TypeMismatch {
                tool: tool.to_string(),
                argument: param.name.clone(),
                expected: param
                    .types
                    .iter()
                    .map(ParamType::as_str)
                    .collect::<Vec<_>>()
                    .join(" or "),
                found: json_type(value).to_string(),
            });
        }

        Ok(())
    }
}

fn parse_types(name: &str, property: &Value) -> Result<Vec<ParamType>, String> {
    let unknown = |t: &str| format!("parameter {name} has unsupported type {t:?}");
    match property.get("type") {
        None => Ok(Vec::new()),
        Some(Value::String(t)) => ParamType::parse(t).map(|p| vec![p]).ok_or_else(|| unknown(t)),
        Some(Value::Array(list)) => list
            .iter()
            .map(|t| {
                t.as_str()
                    .and_then(ParamType::parse)
                    .ok_or_else(|| unknown(&t.to_string()))
            })
            .collect(),
        Some(other) => Err(unknown(&other.to_string())),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "number",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
