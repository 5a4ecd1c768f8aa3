//! Pulls a JSON object out of a model completion and decodes it into a typed
//! shape.
//!
//! Models asked for "only JSON" still wrap it in markdown fences or chatter now
//! and then, so the payload is located first (fenced block, then the outermost
//! brace span, then the raw text) and only then decoded. Decoding is strict:
//! anything that is not valid JSON of the expected shape comes back as an
//! [`ExtractError`] carrying the raw text, never as a panic.

use serde::de::DeserializeOwned;
use serde_json::{ json, Value };
use thiserror::Error;

const FENCE_OPEN: &str = "```json\n";
const FENCE_CLOSE: &str = "\n```";

#[derive(Debug, Error, PartialEq)]
pub enum ExtractError {
    #[error("Failed to parse JSON: {message}")]
    Parse {
        message: String,
        raw_content: String,
    },
    #[error("JSON did not match the expected shape: {message}")]
    Shape {
        message: String,
        raw_content: String,
    },
}

impl ExtractError {
    pub fn raw_content(&self) -> &str {
        match self {
            ExtractError::Parse { raw_content, .. } | ExtractError::Shape { raw_content, .. } =>
                raw_content,
        }
    }

    /// Error payload in the same `{"error": ..., "raw_content": ...}` form the
    /// classifier warnings log.
    pub fn to_payload(&self) -> Value {
        json!({ "error": self.to_string(), "raw_content": self.raw_content() })
    }
}

/// Returns the slice of `text` most likely to hold the JSON payload.
pub fn locate_json(text: &str) -> &str {
    if let Some(start) = text.find(FENCE_OPEN) {
        let body = &text[start + FENCE_OPEN.len()..];
        if let Some(end) = body.find(FENCE_CLOSE) {
            return &body[..end];
        }
    }

    if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) {
        if end > start {
            return &text[start..=end];
        }
    }

    text
}

pub fn extract_value(text: &str) -> Result<Value, ExtractError> {
    serde_json::from_str(locate_json(text)).map_err(|e| ExtractError::Parse {
        message: e.to_string(),
        raw_content: text.to_string(),
    })
}

pub fn extract_as<T: DeserializeOwned>(text: &str) -> Result<T, ExtractError> {
    let value = extract_value(text)?;
    serde_json::from_value(value).map_err(|e| ExtractError::Shape {
        message: e.to_string(),
        raw_content: text.to_string(),
    })
}
