pub mod outcome;

use log::{ info, warn };
use serde::Deserialize;
use serde_json::{ json, Value };
use thiserror::Error;

use self::outcome::ToolOutcome;
use crate::catalog::query::{ self, Criteria };
use crate::catalog::Catalog;
use crate::llm::chat::ToolDefinition;
use crate::models::chat::ToolCallRequest;
use crate::models::laptop::{ Persona, PERSONA_VALUES };

pub const GET_LAPTOP_INFO: &str = "get_laptop_info";
pub const RECOMMEND_LAPTOPS: &str = "recommend_laptops_by_criteria";
pub const END_CONVERSATION: &str = "end_conversation";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LaptopInfoArgs {
    pub model_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RecommendArgs {
    pub budget_min: Option<f64>,
    pub budget_max: Option<f64>,
    pub personas: Option<Vec<Persona>>,
}

impl From<RecommendArgs> for Criteria {
    fn from(args: RecommendArgs) -> Self {
        Criteria {
            budget_min: args.budget_min,
            budget_max: args.budget_max,
            personas: args.personas.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct NoArgs {}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Unknown function '{0}' requested by model.")]
    UnknownTool(String),
    #[error("Invalid arguments format provided by model for {name}.")]
    MalformedArguments {
        name: String,
        arguments: String,
    },
    #[error("Arguments for {name} do not match its parameters: {reason}")]
    ArgumentMismatch {
        name: String,
        arguments: String,
        reason: String,
    },
}

impl ToolError {
    /// Error outcome echoing the raw arguments back to the model.
    pub fn into_outcome(self, arguments: &str) -> ToolOutcome {
        ToolOutcome::Error {
            message: self.to_string(),
            arguments_received: Some(arguments.to_string()),
        }
    }
}

/// A tool call decoded against its parameter schema.
#[derive(Debug, Clone, PartialEq)]
pub enum AdvisorAction {
    GetLaptopInfo(LaptopInfoArgs),
    RecommendLaptops(RecommendArgs),
    EndConversation,
}

impl AdvisorAction {
    /// Decodes a model-issued call. A blank argument string counts as `{}`.
    pub fn decode(name: &str, arguments: &str) -> Result<Self, ToolError> {
        let raw = if arguments.trim().is_empty() { "{}" } else { arguments };
        let value: Value = serde_json::from_str(raw).map_err(|_| ToolError::MalformedArguments {
            name: name.to_string(),
            arguments: arguments.to_string(),
        })?;

        let mismatch = |e: serde_json::Error| ToolError::ArgumentMismatch {
            name: name.to_string(),
            arguments: arguments.to_string(),
            reason: e.to_string(),
        };

        match name {
            GET_LAPTOP_INFO =>
                serde_json::from_value(value).map(AdvisorAction::GetLaptopInfo).map_err(mismatch),
            RECOMMEND_LAPTOPS =>
                serde_json::from_value(value).map(AdvisorAction::RecommendLaptops).map_err(mismatch),
            END_CONVERSATION =>
                serde_json
                    ::from_value::<NoArgs>(value)
                    .map(|_| AdvisorAction::EndConversation)
                    .map_err(mismatch),
            other => Err(ToolError::UnknownTool(other.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AdvisorAction::GetLaptopInfo(_) => GET_LAPTOP_INFO,
            AdvisorAction::RecommendLaptops(_) => RECOMMEND_LAPTOPS,
            AdvisorAction::EndConversation => END_CONVERSATION,
        }
    }

    pub fn execute(self, catalog: &Catalog) -> ToolOutcome {
        match self {
            AdvisorAction::GetLaptopInfo(args) => query::get_laptop_info(catalog, &args.model_name),
            AdvisorAction::RecommendLaptops(args) =>
                query::recommend_laptops_by_criteria(catalog, &args.into()),
            AdvisorAction::EndConversation => query::end_conversation(),
        }
    }
}

/// Decodes and runs one tool call. Never fails: problems become an `error`
/// outcome the model can read.
pub fn dispatch(call: &ToolCallRequest, catalog: &Catalog) -> ToolOutcome {
    let arguments = &call.function.arguments;
    info!("Tool call {}({})", call.function.name, arguments);
    match AdvisorAction::decode(&call.function.name, arguments) {
        Ok(action) => action.execute(catalog),
        Err(e) => {
            warn!("Rejected tool call {}: {}", call.id, e);
            e.into_outcome(arguments)
        }
    }
}

/// The three advertised functions.
pub fn tool_definitions() -> Vec<ToolDefinition> {
    let personas: Vec<&str> = PERSONA_VALUES.iter()
        .map(|p| p.as_str())
        .collect();
    vec![
        ToolDefinition {
            name: GET_LAPTOP_INFO.into(),
            description: "Get detailed information about a specific laptop model.".into(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "model_name": {
                        "type": "string",
                        "description": "The model name of the laptop, e.g. 'Inspiron 15' or 'ROG Strix G16'."
                    }
                },
                "required": ["model_name"]
            }),
        },
        ToolDefinition {
            name: RECOMMEND_LAPTOPS.into(),
            description: "Recommend laptops based on budget and user personas.".into(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "budget_min": {
                        "type": "integer",
                        "description": "Minimum price the user is willing to pay."
                    },
                    "budget_max": {
                        "type": "integer",
                        "description": "Maximum price the user is willing to pay."
                    },
                    "personas": {
                        "type": "array",
                        "items": { "type": "string", "enum": personas },
                        "description": "User personas the laptop should suit."
                    }
                },
                "required": []
            }),
        },
        ToolDefinition {
            name: END_CONVERSATION.into(),
            description: "Ends the conversation when the user wants to exit or says goodbye.".into(),
            parameters: json!({ "type": "object", "properties": {} }),
        }
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::chat::FunctionCall;

    fn call(name: &str, arguments: &str) -> ToolCallRequest {
        ToolCallRequest {
            id: "call_1".into(),
            function: FunctionCall {
                name: name.into(),
                arguments: arguments.into(),
            },
        }
    }

    #[test]
    fn decodes_each_action() {
        assert_eq!(
            AdvisorAction::decode(GET_LAPTOP_INFO, r#"{"model_name": "ROG"}"#).unwrap(),
            AdvisorAction::GetLaptopInfo(LaptopInfoArgs { model_name: "ROG".into() })
        );
        assert_eq!(
            AdvisorAction::decode(RECOMMEND_LAPTOPS, r#"{"budget_max": 80000, "personas": ["Gamer"]}"#).unwrap(),
            AdvisorAction::RecommendLaptops(RecommendArgs {
                budget_min: None,
                budget_max: Some(80000.0),
                personas: Some(vec![Persona::Gamer]),
            })
        );
        assert_eq!(AdvisorAction::decode(END_CONVERSATION, "").unwrap(), AdvisorAction::EndConversation);
        assert_eq!(AdvisorAction::decode(RECOMMEND_LAPTOPS, "  ").unwrap().name(), RECOMMEND_LAPTOPS);
    }

    #[test]
    fn unknown_tool_is_rejected() {
        let err = AdvisorAction::decode("delete_everything", "{}").unwrap_err();
        assert_eq!(err.to_string(), "Unknown function 'delete_everything' requested by model.");
    }

    #[test]
    fn malformed_arguments_echo_input() {
        let outcome = dispatch(&call(GET_LAPTOP_INFO, "{model_name: ROG"), &Catalog::not_loaded());
        assert_eq!(outcome, ToolOutcome::Error {
            message: "Invalid arguments format provided by model for get_laptop_info.".into(),
            arguments_received: Some("{model_name: ROG".into()),
        });
    }

    #[test]
    fn unexpected_parameters_are_a_mismatch() {
        let err = AdvisorAction::decode(GET_LAPTOP_INFO, r#"{"model": "ROG"}"#).unwrap_err();
        assert!(matches!(err, ToolError::ArgumentMismatch { .. }));

        let err = AdvisorAction::decode(RECOMMEND_LAPTOPS, r#"{"personas": ["astronaut"]}"#).unwrap_err();
        assert!(matches!(err, ToolError::ArgumentMismatch { .. }));
    }

    #[test]
    fn dispatch_runs_against_catalog() {
        let outcome = dispatch(&call(GET_LAPTOP_INFO, r#"{"model_name": "x"}"#), &Catalog::not_loaded());
        assert_eq!(outcome, ToolOutcome::error(query::NOT_LOADED_MESSAGE));
        assert!(dispatch(&call(END_CONVERSATION, "{}"), &Catalog::not_loaded()).is_ended());
    }

    #[test]
    fn definitions_advertise_all_tools() {
        let defs = tool_definitions();
        let names: Vec<&str> = defs.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec![GET_LAPTOP_INFO, RECOMMEND_LAPTOPS, END_CONVERSATION]);
        assert_eq!(defs[0].parameters["required"], json!(["model_name"]));
        assert_eq!(defs[1].parameters["properties"]["personas"]["items"]["enum"].as_array().unwrap().len(), 8);
    }
}
