use async_trait::async_trait;
use log::{ debug, error };
use reqwest::Client as HttpClient;
use serde::{ Deserialize, Serialize };
use serde_json::Value;
use std::time::Duration;
use uuid::Uuid;

use super::{ ChatClient, ChatRequest };
use crate::llm::{ LlmConfig, LlmError, LlmType };
use crate::models::chat::{ ChatMessage, FunctionCall, Role, ToolCallRequest };

/// Native Ollama `/api/chat` client. Ollama hands tool arguments back as JSON
/// objects without call ids, so ids are synthesised here.
#[derive(Debug)]
pub struct OllamaClient {
    http: HttpClient,
    base_url: String,
    completion_model: String,
}

#[derive(Serialize, Deserialize, Debug)]
struct OllamaMessage {
    role: String,
    #[serde(default)]
    content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<OllamaToolCall>,
}

#[derive(Serialize, Deserialize, Debug)]
struct OllamaToolCall {
    function: OllamaFunctionCall,
}

#[derive(Serialize, Deserialize, Debug)]
struct OllamaFunctionCall {
    name: String,
    #[serde(default)]
    arguments: Value,
}

#[derive(Serialize, Debug)]
struct OllamaOptions {
    temperature: f32,
}

#[derive(Serialize, Debug)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<OllamaMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Value>,
    options: OllamaOptions,
}

#[derive(Deserialize, Debug)]
struct OllamaChatResponse {
    message: OllamaMessage,
}

impl OllamaClient {
    pub fn new(
        base_url: Option<String>,
        completion_model: Option<String>,
        timeout_seconds: u64
    ) -> Result<Self, LlmError> {
        let model = completion_model.unwrap_or_else(|| "llama3.1".to_string());
        let url = base_url.unwrap_or_else(|| "http://localhost:11434".into());
        let http = HttpClient::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .map_err(|e| LlmError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: url,
            completion_model: model,
        })
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        if config.llm_type != LlmType::Ollama {
            return Err(LlmError::Config("Invalid config type for OllamaClient".into()));
        }

        Self::new(config.base_url.clone(), config.completion_model.clone(), config.timeout_seconds)
    }

    fn build_request(&self, request: &ChatRequest) -> OllamaChatRequest {
        let tools = request.tools
            .iter()
            .map(|tool| {
                serde_json::json!({
                    "type": "function",
                    "function": {
                        "name": tool.name,
                        "description": tool.description,
                        "parameters": tool.parameters,
                    }
                })
            })
            .collect();
        OllamaChatRequest {
            model: self.completion_model.clone(),
            messages: request.messages.iter().map(to_wire_message).collect(),
            stream: false,
            format: request.json_output.then(|| "json".to_string()),
            tools,
            options: OllamaOptions { temperature: request.temperature },
        }
    }
}

fn to_wire_message(message: &ChatMessage) -> OllamaMessage {
    let role = match message.role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
        Role::Tool => "tool",
    };
    let tool_calls = message.tool_calls
        .iter()
        .map(|call| OllamaToolCall {
            function: OllamaFunctionCall {
                name: call.function.name.clone(),
                arguments: serde_json
                    ::from_str(&call.function.arguments)
                    .unwrap_or_else(|_| Value::String(call.function.arguments.clone())),
            },
        })
        .collect();
    OllamaMessage {
        role: role.to_string(),
        content: message.text().to_string(),
        tool_calls,
    }
}

fn into_message(resp: OllamaChatResponse) -> ChatMessage {
    let tool_calls = resp.message.tool_calls
        .into_iter()
        .map(|call| {
            let arguments = match call.function.arguments {
                Value::String(raw) => raw,
                Value::Null => String::new(),
                other => other.to_string(),
            };
            ToolCallRequest {
                id: format!("call_{}", Uuid::new_v4().simple()),
                function: FunctionCall {
                    name: call.function.name,
                    arguments,
                },
            }
        })
        .collect();
    let content = Some(resp.message.content).filter(|c| !c.is_empty());
    ChatMessage::assistant_tool_calls(content, tool_calls)
}

#[async_trait]
impl ChatClient for OllamaClient {
    async fn complete(&self, request: &ChatRequest) -> Result<ChatMessage, LlmError> {
        let url = format!("{}/api/chat", self.base_url.trim_end_matches('/'));
        let payload = self.build_request(request);
        debug!("Sending Ollama chat request: model={}, messages={}", payload.model, payload.messages.len());

        let resp = self.http.post(&url).json(&payload).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            error!("Ollama request to {} returned HTTP {}", url, status);
            return Err(LlmError::Status { status: status.as_u16(), body });
        }
        let parsed = resp.json::<OllamaChatResponse>().await?;
        Ok(into_message(parsed))
    }

    fn get_model(&self) -> String {
        self.completion_model.clone()
    }

    fn get_base_url(&self) -> Option<String> {
        Some(self.base_url.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_output_sets_format() {
        let client = OllamaClient::new(None, None, 5).unwrap();
        let req = ChatRequest::classification(vec![ChatMessage::user("rate")]);
        let wire = serde_json::to_value(client.build_request(&req)).unwrap();
        assert_eq!(wire["format"], "json");
        assert_eq!(wire["stream"], false);
        assert_eq!(wire["options"]["temperature"], 0.0);
    }

    #[test]
    fn object_arguments_become_strings_with_ids() {
        let resp: OllamaChatResponse = serde_json
            ::from_value(
                json!({
                "message": {
                    "role": "assistant",
                    "content": "",
                    "tool_calls": [{"function": {"name": "recommend_laptops_by_criteria", "arguments": {"budget_max": 50000}}}]
                }
            })
            )
            .unwrap();
        let msg = into_message(resp);
        assert!(msg.content.is_none());
        let call = &msg.tool_calls[0];
        assert!(call.id.starts_with("call_"));
        let args: Value = serde_json::from_str(&call.function.arguments).unwrap();
        assert_eq!(args["budget_max"], 50000);
    }
}
