pub mod ollama;
pub mod openai;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use log::info;
use super::{ LlmConfig, LlmError, LlmType };
use self::ollama::OllamaClient;
use self::openai::OpenAIChatClient;
use crate::models::chat::ChatMessage;

/// A function the model may call, described with a JSON-schema parameter block.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub tools: Vec<ToolDefinition>,
    pub json_output: bool,
}

impl ChatRequest {
    /// Deterministic request that forces a JSON object reply.
    pub fn classification(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            temperature: 0.0,
            tools: Vec::new(),
            json_output: true,
        }
    }

    /// Free-form dialogue request; `tools` may be empty for a plain follow-up.
    pub fn conversation(messages: Vec<ChatMessage>, temperature: f32, tools: Vec<ToolDefinition>) -> Self {
        Self {
            messages,
            temperature,
            tools,
            json_output: false,
        }
    }
}

#[async_trait]
pub trait ChatClient: Send + Sync {
    /// One round-trip. The returned message is always `Role::Assistant` and
    /// carries any tool calls the model requested.
    async fn complete(&self, request: &ChatRequest) -> Result<ChatMessage, LlmError>;

    fn get_model(&self) -> String;
    fn get_base_url(&self) -> Option<String>;
}

pub fn new_client(config: &LlmConfig) -> Result<Arc<dyn ChatClient>, LlmError> {
    let client: Arc<dyn ChatClient> = match config.llm_type {
        LlmType::Ollama => {
            let specific_client = OllamaClient::from_config(config)?;
            Arc::new(specific_client)
        }
        LlmType::OpenAI | LlmType::Groq | LlmType::DeepSeek | LlmType::XAI => {
            let specific_client = OpenAIChatClient::from_config(config)?;
            Arc::new(specific_client)
        }
    };
    info!(
        "Chat client ready: Type={}, Model={}, BaseURL={}",
        config.llm_type,
        client.get_model(),
        client.get_base_url().as_deref().unwrap_or("adapter default")
    );
    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_request_is_deterministic_json() {
        let req = ChatRequest::classification(vec![ChatMessage::user("hi")]);
        assert_eq!(req.temperature, 0.0);
        assert!(req.json_output);
        assert!(req.tools.is_empty());
    }

    #[test]
    fn factory_requires_openai_key() {
        let config = LlmConfig {
            llm_type: LlmType::OpenAI,
            ..LlmConfig::default()
        };
        assert!(matches!(new_client(&config), Err(LlmError::Config(_))));
    }

    #[test]
    fn factory_builds_keyless_ollama() {
        let config = LlmConfig {
            llm_type: LlmType::Ollama,
            ..LlmConfig::default()
        };
        let client = new_client(&config).unwrap();
        assert_eq!(client.get_base_url().as_deref(), Some("http://localhost:11434"));
    }
}
