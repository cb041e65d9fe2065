//! Ollama chat API backend.

use crate::model::{
    Backend, Message, ModelError, ModelRequest, ModelResponse, Role, ToolCall, ToolSpec, Usage,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434/api/chat";
pub const DEFAULT_MODEL: &str = "qwen3:4b";
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    messages: Vec<ApiMessage<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ApiTool<'a>>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ApiMessage<'a> {
    role: &'static str,
    content: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<ApiToolCallOut<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct ApiToolCallOut<'a> {
    id: &'a str,
    function: ApiFunctionOut<'a>,
}

#[derive(Debug, Serialize)]
struct ApiFunctionOut<'a> {
    name: &'a str,
    arguments: &'a Map<String, Value>,
}

#[derive(Debug, Serialize)]
struct ApiTool<'a> {
    #[serde(rename = "type")]
    tool_type: &'static str,
    function: &'a ToolSpec,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    message: ApiResponseMessage,
    #[serde(default)]
    prompt_eval_count: u32,
    #[serde(default)]
    eval_count: u32,
}

#[derive(Debug, Deserialize)]
struct ApiResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ApiToolCallIn>>,
}

#[derive(Debug, Deserialize)]
struct ApiToolCallIn {
    #[serde(default)]
    id: Option<String>,
    function: ApiFunctionIn,
}

#[derive(Debug, Deserialize)]
struct ApiFunctionIn {
    name: String,
    #[serde(default)]
    arguments: Value,
}

impl<'a> ApiMessage<'a> {
    fn from_message(message: &'a Message) -> Self {
        Self {
            role: message.role.as_str(),
            content: message.text(),
            tool_calls: message
                .tool_calls
                .iter()
                .map(|call| ApiToolCallOut {
                    id: &call.id,
                    function: ApiFunctionOut {
                        name: &call.name,
                        arguments: &call.arguments,
                    },
                })
                .collect(),
            tool_call_id: message.tool_call_id.as_deref(),
        }
    }
}

impl ApiToolCallIn {
    fn into_tool_call(self) -> Result<ToolCall, ModelError> {
        let arguments = match self.function.arguments {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            // Some models emit arguments as a JSON-encoded string.
            Value::String(raw) => match serde_json::from_str(&raw) {
                Ok(Value::Object(map)) => map,
                _ => {
                    return Err(ModelError::InvalidResponse(format!(
                        "tool call {} has non-object arguments: {raw}",
                        self.function.name
                    )));
                }
            },
            other => {
                return Err(ModelError::InvalidResponse(format!(
                    "tool call {} has non-object arguments: {other}",
                    self.function.name
                )));
            }
        };

        let id = self
            .id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| format!("call_{}", uuid::Uuid::new_v4().simple()));

        Ok(ToolCall {
            id,
            name: self.function.name,
            arguments,
        })
    }
}

/// Builder for creating an Ollama backend.
#[derive(Debug, Clone)]
pub struct OllamaBackendBuilder {
    endpoint: String,
    model: String,
    bypass_proxy: bool,
    request_timeout: Duration,
}

impl OllamaBackendBuilder {
    /// Create a new builder for the given model.
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: model.into(),
            bypass_proxy: true,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Set the chat endpoint URL.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Ignore proxy settings from the environment.
    pub fn bypass_proxy(mut self, bypass: bool) -> Self {
        self.bypass_proxy = bypass;
        self
    }

    /// Bound each request to the backend.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Build the backend.
    pub fn build(self) -> Result<OllamaBackend, ModelError> {
        let mut client = reqwest::Client::builder().timeout(self.request_timeout);
        if self.bypass_proxy {
            client = client.no_proxy();
        }
        let client = client
            .build()
            .map_err(|e| ModelError::Network(format!("failed to build http client: {e}")))?;

        Ok(OllamaBackend {
            client,
            endpoint: self.endpoint,
            model: self.model,
        })
    }
}

/// Ollama chat API backend.
pub struct OllamaBackend {
    client: reqwest::Client,
    endpoint: String,
    model: String,
}

impl OllamaBackend {
    /// Create a builder for the Ollama backend.
    pub fn builder(model: impl Into<String>) -> OllamaBackendBuilder {
        OllamaBackendBuilder::new(model)
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl std::fmt::Display for OllamaBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ollama({}, endpoint={})", self.model, self.endpoint)
    }
}

impl Backend for OllamaBackend {
    async fn call(&self, request: ModelRequest<'_>) -> Result<ModelResponse, ModelError> {
        let api_request = ApiRequest {
            model: &self.model,
            messages: request
                .messages
                .iter()
                .map(ApiMessage::from_message)
                .collect(),
            tools: request
                .tools
                .iter()
                .map(|spec| ApiTool {
                    tool_type: "function",
                    function: spec,
                })
                .collect(),
            stream: false,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("accept", "application/json")
            .json(&api_request)
            .send()
            .await
            .map_err(|e| ModelError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::Api(format!("{status}: {body}")));
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| ModelError::InvalidResponse(e.to_string()))?;

        let tool_calls = api_response
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(ApiToolCallIn::into_tool_call)
            .collect::<Result<Vec<_>, _>>()?;

        let content = api_response.message.content.filter(|c| !c.is_empty());

        Ok(ModelResponse {
            message: Message {
                role: Role::Assistant,
                content,
                tool_calls,
                tool_call_id: None,
            },
            usage: Usage {
                input_tokens: api_response.prompt_eval_count,
                output_tokens: api_response.eval_count,
            },
        })
    }
}
