use serde::Serialize;
use serde_json::Value;

/// Result object handed back to the model as a tool message. Serialises
/// with a `status` discriminator.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ToolOutcome {
    Success {
        #[serde(skip_serializing_if = "Option::is_none")]
        count: Option<usize>,
        data: Value,
    },
    NotFound {
        message: String,
    },
    Error {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        arguments_received: Option<String>,
    },
    Ended {
        message: String,
    },
}

impl ToolOutcome {
    pub fn error(message: impl Into<String>) -> Self {
        ToolOutcome::Error {
            message: message.into(),
            arguments_received: None,
        }
    }

    pub fn is_ended(&self) -> bool {
        matches!(self, ToolOutcome::Ended { .. })
    }

    pub fn status(&self) -> &'static str {
        match self {
            ToolOutcome::Success { .. } => "success",
            ToolOutcome::NotFound { .. } => "not_found",
            ToolOutcome::Error { .. } => "error",
            ToolOutcome::Ended { .. } => "ended",
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            ToolOutcome::Success { .. } => None,
            ToolOutcome::NotFound { message } |
            ToolOutcome::Error { message, .. } |
            ToolOutcome::Ended { message } => Some(message),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_tag_matches_variant() {
        let outcomes = [
            ToolOutcome::Success { count: None, data: json!({}) },
            ToolOutcome::NotFound { message: "nope".into() },
            ToolOutcome::error("boom"),
            ToolOutcome::Ended { message: "bye".into() },
        ];
        for outcome in outcomes {
            let value: Value = serde_json::from_str(&outcome.to_json().unwrap()).unwrap();
            assert_eq!(value["status"], outcome.status());
        }
    }

    #[test]
    fn optional_fields_are_omitted() {
        let value = serde_json::to_value(ToolOutcome::error("boom")).unwrap();
        assert_eq!(value, json!({"status": "error", "message": "boom"}));

        let value = serde_json::to_value(ToolOutcome::Success { count: Some(3), data: json!([]) }).unwrap();
        assert_eq!(value["count"], 3);
    }
}
