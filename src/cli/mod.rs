use clap::Parser;
use std::path::PathBuf;

use crate::catalog::CatalogPaths;
use crate::llm::{ parse_llm_type, LlmConfig };

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    // --- Chat LLM Provider Args ---
    /// Type of LLM provider for the conversation (openai, groq, deepseek, xai, ollama)
    #[arg(long, env = "CHAT_LLM_TYPE", default_value = "openai")]
    pub chat_llm_type: String,

    /// Base URL for the Chat LLM provider API (e.g., http://localhost:11434 for Ollama)
    #[arg(long, env = "CHAT_BASE_URL")] // No default, let adapters handle defaults if None
    pub chat_base_url: Option<String>,

    /// API Key for the Chat LLM provider
    #[arg(long, env = "CHAT_API_KEY", default_value = "")]
    pub chat_api_key: String,

    /// Model name for chat completion (e.g., gpt-3.5-turbo, llama3.1)
    #[arg(long, env = "CHAT_MODEL")] // No default, rely on adapter defaults if None
    pub chat_model: Option<String>,

    /// Sampling temperature for the conversation.
    #[arg(long, env = "CHAT_TEMPERATURE", default_value = "0.7")]
    pub chat_temperature: f32,

    // --- Helper LLM Provider Args (Optional) ---
    /// Type of LLM provider for catalog classification. Defaults to CHAT_LLM_TYPE if not set.
    #[arg(long, env = "HELPER_LLM_TYPE")]
    pub helper_llm_type: Option<String>,

    /// Base URL for the helper provider. Defaults to CHAT_BASE_URL if not set.
    #[arg(long, env = "HELPER_BASE_URL")]
    pub helper_base_url: Option<String>,

    /// API Key for the helper provider. Defaults to CHAT_API_KEY if not set.
    #[arg(long, env = "HELPER_API_KEY")]
    pub helper_api_key: Option<String>,

    /// Model name for classification. Defaults to CHAT_MODEL if not set.
    #[arg(long, env = "HELPER_MODEL")]
    pub helper_model: Option<String>,

    /// Request timeout for every provider call, in seconds.
    #[arg(long, env = "LLM_TIMEOUT_SECONDS", default_value = "120")]
    pub llm_timeout_seconds: u64,

    // --- Catalog Args ---
    /// Raw laptop catalog CSV.
    #[arg(long, env = "LAPTOP_DATA_CSV", default_value = "laptop_data.csv")]
    pub laptop_data_csv: PathBuf,

    /// Preprocessed catalog cache CSV, written after the first enrichment run.
    #[arg(long, env = "PREPROCESSED_LAPTOP_DATA_CSV", default_value = "laptops_preprocessed.csv")]
    pub preprocessed_laptop_data_csv: PathBuf,

    /// Ignore the cache and classify the raw catalog again.
    #[arg(long, env = "REPROCESS_DATA", default_value = "false")]
    pub reprocess_data: bool,

    // --- Dialogue Args ---
    /// Maximum number of messages kept in the conversation history (minimum 2).
    #[arg(
        long,
        env = "MAX_HISTORY_MESSAGES",
        default_value = "15",
        value_parser = clap::value_parser!(u64).range(2..)
    )]
    pub max_history_messages: u64,

    /// Path to the prompt configuration file.
    #[arg(long, env = "PROMPTS_PATH", default_value = "json/prompts.json")]
    pub prompts_path: String,
}

fn non_empty(key: &str) -> Option<String> {
    if key.is_empty() { None } else { Some(key.to_string()) }
}

impl Args {
    pub fn chat_config(&self) -> Result<LlmConfig, String> {
        Ok(LlmConfig {
            llm_type: parse_llm_type(&self.chat_llm_type)?,
            base_url: self.chat_base_url.clone(),
            api_key: non_empty(&self.chat_api_key),
            completion_model: self.chat_model.clone(),
            timeout_seconds: self.llm_timeout_seconds,
        })
    }

    /// Classification client settings; every unset field falls back to the
    /// chat provider's.
    pub fn helper_config(&self) -> Result<LlmConfig, String> {
        let llm_type = match &self.helper_llm_type {
            Some(s) if !s.trim().is_empty() => s.as_str(),
            _ => &self.chat_llm_type,
        };
        let api_key = self.helper_api_key.as_deref().unwrap_or(&self.chat_api_key);
        Ok(LlmConfig {
            llm_type: parse_llm_type(llm_type)?,
            base_url: self.helper_base_url.clone().or_else(|| self.chat_base_url.clone()),
            api_key: non_empty(api_key),
            completion_model: self.helper_model.clone().or_else(|| self.chat_model.clone()),
            timeout_seconds: self.llm_timeout_seconds,
        })
    }

    pub fn catalog_paths(&self) -> CatalogPaths {
        CatalogPaths {
            raw: self.laptop_data_csv.clone(),
            cache: self.preprocessed_laptop_data_csv.clone(),
        }
    }

    pub fn max_messages(&self) -> usize {
        self.max_history_messages as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::LlmType;

    fn parse(extra: &[&str]) -> Args {
        let mut argv = vec!["laptop-advisor"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn helper_inherits_chat_settings() {
        let args = parse(&["--chat-llm-type", "groq", "--chat-api-key", "k", "--chat-model", "m"]);
        let helper = args.helper_config().unwrap();
        assert_eq!(helper.llm_type, LlmType::Groq);
        assert_eq!(helper.api_key.as_deref(), Some("k"));
        assert_eq!(helper.completion_model.as_deref(), Some("m"));
    }

    #[test]
    fn helper_overrides_win() {
        let args = parse(&["--chat-api-key", "k", "--helper-llm-type", "ollama", "--helper-api-key", ""]);
        let helper = args.helper_config().unwrap();
        assert_eq!(helper.llm_type, LlmType::Ollama);
        assert_eq!(helper.api_key, None);
        assert_eq!(args.chat_config().unwrap().llm_type, LlmType::OpenAI);
    }

    #[test]
    fn history_limit_has_a_floor() {
        assert_eq!(parse(&[]).max_messages(), 15);
        let err = Args::try_parse_from(["laptop-advisor", "--max-history-messages", "1"]);
        assert!(err.is_err());
    }

    #[test]
    fn unknown_provider_is_reported() {
        let args = parse(&["--chat-llm-type", "anthropic"]);
        assert!(args.chat_config().is_err());
    }
}
