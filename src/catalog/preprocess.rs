//! Two-stage enrichment of raw catalog rows.
//!
//! Stage one asks the helper model to rate a description on the five
//! feature categories; stage two maps a complete rating set onto persona
//! labels. Both stages are fail-soft: a bad or missing reply degrades to
//! all-`unknown` ratings or an empty persona list and the batch carries on.

use log::{ debug, info, warn };
use serde::Deserialize;
use std::sync::Arc;

use crate::config::prompt::{ self, PromptConfig };
use crate::llm::chat::{ ChatClient, ChatRequest };
use crate::llm::extract;
use crate::models::chat::ChatMessage;
use crate::models::laptop::{ Laptop, Persona, SpecRatings };

#[derive(Deserialize)]
struct PersonaReply {
    persona: Vec<String>,
}

pub struct Preprocessor {
    client: Arc<dyn ChatClient>,
    prompts: Arc<PromptConfig>,
}

impl Preprocessor {
    pub fn new(client: Arc<dyn ChatClient>, prompts: Arc<PromptConfig>) -> Self {
        Self { client, prompts }
    }

    /// Sends one classification request; provider failures are folded into
    /// the same error type as parse failures.
    async fn classify(&self, system: String, user: String) -> Result<String, String> {
        let request = ChatRequest::classification(
            vec![ChatMessage::system(system), ChatMessage::user(user)]
        );
        let reply = self.client.complete(&request).await.map_err(|e| e.to_string())?;
        let text = reply.content.unwrap_or_default();
        debug!("Classifier output: {}", text);
        Ok(text)
    }

    pub async fn classify_specs(&self, description: &str) -> SpecRatings {
        let (system, user) = match prompt::get_spec_classifier_prompts(&self.prompts, description) {
            Ok(prompts) => prompts,
            Err(e) => {
                warn!("Spec classifier prompt unavailable: {}", e);
                return SpecRatings::unknown();
            }
        };

        let text = match self.classify(system, user).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Spec classification request failed: {}", e);
                return SpecRatings::unknown();
            }
        };

        match extract::extract_as::<SpecRatings>(&text) {
            Ok(ratings) => ratings,
            Err(e) => {
                warn!(
                    "Unexpected spec classification {} for description: {}...",
                    e.to_payload(),
                    description.chars().take(50).collect::<String>()
                );
                SpecRatings::unknown()
            }
        }
    }

    /// Returns no personas, without calling the model, unless every rating
    /// is known.
    pub async fn tag_personas(&self, ratings: &SpecRatings) -> Vec<Persona> {
        if ratings.has_unknown() {
            return Vec::new();
        }

        let (system, user) = match prompt::get_persona_classifier_prompts(&self.prompts, ratings) {
            Ok(prompts) => prompts,
            Err(e) => {
                warn!("Persona classifier prompt unavailable: {}", e);
                return Vec::new();
            }
        };

        let text = match self.classify(system, user).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Persona classification request failed: {}", e);
                return Vec::new();
            }
        };

        match extract::extract_as::<PersonaReply>(&text) {
            Ok(reply) => parse_personas(&reply.persona),
            Err(e) => {
                warn!("Unexpected persona classification {} for specs: {:?}", e.to_payload(), ratings);
                Vec::new()
            }
        }
    }

    /// Enriches every laptop in order. Laptops without a description get no
    /// ratings and no personas.
    pub async fn enrich(&self, laptops: Vec<Laptop>) -> Vec<Laptop> {
        let total = laptops.len();
        let mut enriched = Vec::with_capacity(total);
        for (idx, mut laptop) in laptops.into_iter().enumerate() {
            if let Some(description) = laptop.description.clone() {
                let ratings = self.classify_specs(&description).await;
                laptop.persona = self.tag_personas(&ratings).await;
                laptop.specification_ratings = Some(ratings);
            }
            info!(
                "Preprocessed {}/{}: {}",
                idx + 1,
                total,
                laptop.model_name.as_deref().unwrap_or("<unnamed>")
            );
            enriched.push(laptop);
        }
        enriched
    }
}

fn parse_personas(labels: &[String]) -> Vec<Persona> {
    let mut personas = Vec::new();
    for label in labels {
        match label.parse::<Persona>() {
            Ok(persona) if !personas.contains(&persona) => personas.push(persona),
            Ok(_) => {}
            Err(e) => warn!("Ignoring persona label outside the known set: {}", e),
        }
    }
    personas
}
