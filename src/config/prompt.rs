use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use log::{ info, warn };
use thiserror::Error;

use crate::models::laptop::{ Persona, SpecRatings, SPEC_KEYS };

const DEFAULT_PROMPTS: &str = include_str!("../../json/prompts.json");

const REQUIRED_TEMPLATES: [&str; 6] = [
    "advisor_system",
    "greeting",
    "spec_classifier_system",
    "spec_classifier_user",
    "persona_classifier_system",
    "persona_classifier_user",
];

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("Prompt template '{0}' not found")]
    TemplateNotFound(String),
    #[error("Prompt file IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Prompt JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),
}

#[derive(Deserialize, Debug, Clone)]
pub struct PromptConfig {
    pub delimiter: String,
    pub templates: HashMap<String, String>,
}

impl PromptConfig {
    fn validate(&self) -> Result<(), PromptError> {
        for key in REQUIRED_TEMPLATES {
            if !self.templates.contains_key(key) {
                return Err(PromptError::TemplateNotFound(key.to_string()));
            }
        }
        Ok(())
    }

    pub fn from_json(text: &str) -> Result<Self, PromptError> {
        let config: PromptConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn builtin() -> Result<Self, PromptError> {
        Self::from_json(DEFAULT_PROMPTS)
    }

    fn template(&self, key: &str) -> Result<&str, PromptError> {
        self.templates
            .get(key)
            .map(|s| s.as_str())
            .ok_or_else(|| PromptError::TemplateNotFound(key.to_string()))
    }
}

/// Loads prompts from `path`, or the built-in set when the file does not exist.
pub fn load_prompts<P: AsRef<Path>>(path: P) -> Result<Arc<PromptConfig>, PromptError> {
    let path = path.as_ref();
    if !path.exists() {
        warn!("Prompts file {} not found, using built-in prompts", path.display());
        return Ok(Arc::new(PromptConfig::builtin()?));
    }
    let text = fs::read_to_string(path)?;
    let config = PromptConfig::from_json(&text)?;
    info!("Loaded prompts from {}", path.display());
    Ok(Arc::new(config))
}

fn persona_list() -> String {
    serde_json::to_string(&Persona::names()).unwrap_or_default()
}

pub fn get_advisor_system_prompt(config: &PromptConfig) -> Result<String, PromptError> {
    Ok(config.template("advisor_system")?.replace("{persona_values}", &persona_list()))
}

pub fn get_greeting(config: &PromptConfig) -> Result<String, PromptError> {
    Ok(config.template("greeting")?.to_string())
}

/// System and user prompt for rating a free-text laptop description.
pub fn get_spec_classifier_prompts(
    config: &PromptConfig,
    description: &str
) -> Result<(String, String), PromptError> {
    let spec_keys = serde_json::to_string(&SPEC_KEYS).unwrap_or_default();
    let expected_format = format!(
        "{{{}}}",
        SPEC_KEYS.iter()
            .map(|k| format!("\"{}\": \"low/medium/high\"", k))
            .collect::<Vec<_>>()
            .join(", ")
    );
    let system = config
        .template("spec_classifier_system")?
        .replace("{spec_keys}", &spec_keys)
        .replace("{rating_values}", r#"["low", "medium", "high"]"#)
        .replace("{expected_format}", &expected_format)
        .replace("{delimiter}", &config.delimiter);
    let user = config.template("spec_classifier_user")?.replace("{description}", description);
    Ok((system, user))
}

/// System and user prompt for mapping a rating set to personas.
pub fn get_persona_classifier_prompts(
    config: &PromptConfig,
    ratings: &SpecRatings
) -> Result<(String, String), PromptError> {
    let specs = serde_json::to_string(ratings)?;
    let system = config
        .template("persona_classifier_system")?
        .replace("{persona_values}", &persona_list())
        .replace("{specs}", &specs)
        .replace("{delimiter}", &config.delimiter);
    let user = config.template("persona_classifier_user")?.replace("{specs}", &specs);
    Ok((system, user))
}
