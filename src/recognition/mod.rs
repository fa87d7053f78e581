//! Speech recognition and intent classification over the NLU backend.
//!
//! [`RecognitionClient::recognize`] wraps captured audio in a fresh
//! [`Session`](crate::session::Session), posts it to the detect-intent
//! endpoint with the bearer credential and returns an [`IntentResult`] or a
//! classified [`CommandError`](crate::error::CommandError).

mod client;
pub mod wire;

pub use client::RecognitionClient;

use serde_json::{Map, Value};

/// Parsed outcome of one recognition request.
#[derive(Debug, Clone, PartialEq)]
pub struct IntentResult {
    /// Session the request was issued under.
    pub session_id: String,
    /// Classified intent name. `None` when the backend matched nothing.
    pub intent: Option<String>,
    /// Intent parameters keyed by name (for example `color`).
    pub parameters: Map<String, Value>,
    /// Transcribed query, kept for diagnostics.
    pub query_text: Option<String>,
}

impl IntentResult {
    /// Result with no matched intent.
    pub fn unmatched(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            intent: None,
            parameters: Map::new(),
            query_text: None,
        }
    }

    /// Result for `intent` with no parameters.
    pub fn matched(session_id: impl Into<String>, intent: impl Into<String>) -> Self {
        Self {
            intent: Some(intent.into()),
            ..Self::unmatched(session_id)
        }
    }

    /// Builder-style parameter insertion.
    #[must_use]
    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    /// A string-valued parameter. Non-string values read as absent.
    pub fn parameter_str(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).and_then(Value::as_str)
    }
}
