use log::{ error, info, warn };
use std::sync::Arc;
use thiserror::Error;

use crate::catalog::Catalog;
use crate::config::prompt::{ self, PromptConfig, PromptError };
use crate::llm::chat::{ ChatClient, ChatRequest, ToolDefinition };
use crate::models::chat::{ ChatMessage, Conversation };
use crate::tools::{ self, outcome::ToolOutcome };

pub const EMPTY_REPLY_FALLBACK: &str =
    "I'm not sure how to respond to that. Could you please rephrase?";
pub const RETRY_MESSAGE: &str =
    "I'm sorry, something went wrong while handling that. Please try again.";

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("prompt error: {0}")]
    Prompt(#[from] PromptError),
    #[error("failed to serialize tool result: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// What the console should do after a turn.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    Reply(String),
    Ended(String),
}

pub struct AdvisorAgent {
    chat_client: Arc<dyn ChatClient>,
    catalog: Arc<Catalog>,
    conversation: Conversation,
    tools: Vec<ToolDefinition>,
    temperature: f32,
}

impl AdvisorAgent {
    pub fn new(
        chat_client: Arc<dyn ChatClient>,
        catalog: Arc<Catalog>,
        prompts: &PromptConfig,
        max_messages: usize,
        temperature: f32
    ) -> Result<Self, AgentError> {
        let system_prompt = prompt::get_advisor_system_prompt(prompts)?;
        info!(
            "Advisor agent ready: model={}, catalog={} laptops, history limit={}",
            chat_client.get_model(),
            catalog.len(),
            max_messages
        );
        Ok(Self {
            chat_client,
            catalog,
            conversation: Conversation::new(system_prompt, max_messages),
            tools: tools::tool_definitions(),
            temperature,
        })
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Records the opening line as the assistant's first message.
    pub fn greet(&mut self, greeting: &str) -> String {
        self.conversation.push(ChatMessage::assistant(greeting));
        greeting.to_string()
    }

    /// Runs one user turn. Provider failures are answered in-band as an
    /// assistant reply; only an `AgentError` rolls the turn back.
    pub async fn process_message(&mut self, input: &str) -> TurnOutcome {
        self.conversation.push(ChatMessage::user(input));
        let outcome = match self.try_turn().await {
            Ok(outcome) => outcome,
            Err(e) => self.abandon_turn(e),
        };
        self.conversation.prune();
        outcome
    }

    /// Drops the last user message and everything appended after it, then
    /// asks for a retry.
    fn abandon_turn(&mut self, err: AgentError) -> TurnOutcome {
        error!("Turn failed, discarding user message: {}", err);
        self.conversation.discard_last_user();
        TurnOutcome::Reply(RETRY_MESSAGE.to_string())
    }

    async fn try_turn(&mut self) -> Result<TurnOutcome, AgentError> {
        let request = ChatRequest::conversation(
            self.conversation.messages().to_vec(),
            self.temperature,
            self.tools.clone()
        );
        let result = self.chat_client.complete(&request).await;
        let reply = match result {
            Ok(reply) => reply,
            Err(e) => {
                return Ok(self.reply(format!("Sorry, an error occurred: {}", e)));
            }
        };

        if reply.tool_calls.is_empty() {
            return Ok(self.reply_or_fallback(reply.content));
        }

        let calls = reply.tool_calls.clone();
        self.conversation.push(ChatMessage::assistant_tool_calls(reply.content, reply.tool_calls));

        for call in &calls {
            let outcome = tools::dispatch(call, &self.catalog);
            self.conversation.push(
                ChatMessage::tool(&call.id, &call.function.name, outcome.to_json()?)
            );
            if let ToolOutcome::Ended { message } = outcome {
                info!("Conversation ended by {}", call.function.name);
                return Ok(TurnOutcome::Ended(message));
            }
        }

        let follow_up = ChatRequest::conversation(
            self.conversation.messages().to_vec(),
            self.temperature,
            Vec::new()
        );
        let result = self.chat_client.complete(&follow_up).await;
        match result {
            Ok(summary) => Ok(self.reply_or_fallback(summary.content)),
            Err(e) => Ok(self.reply(format!("Sorry, an error occurred: {}", e))),
        }
    }

    fn reply_or_fallback(&mut self, content: Option<String>) -> TurnOutcome {
        match content {
            Some(text) if !text.trim().is_empty() => self.reply(text),
            _ => {
                warn!("Model returned an empty reply");
                self.reply(EMPTY_REPLY_FALLBACK.to_string())
            }
        }
    }

    fn reply(&mut self, text: String) -> TurnOutcome {
        self.conversation.push(ChatMessage::assistant(text.clone()));
        TurnOutcome::Reply(text)
    }
}
