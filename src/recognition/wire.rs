//! Detect-intent wire format.
//!
//! Request and response bodies are typed so a field-name or value drift is
//! a compile error rather than a silent contract break.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use super::IntentResult;
use crate::error::{CommandError, Result};

/// Audio encoding accepted by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AudioEncoding {
    /// 16-bit signed little-endian linear PCM.
    #[serde(rename = "AUDIO_ENCODING_LINEAR_16")]
    Linear16,
}

/// Audio parameters sent with the query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputAudioConfig {
    pub audio_encoding: AudioEncoding,
    pub language_code: String,
    pub sample_rate_hertz: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryInput {
    pub audio_config: InputAudioConfig,
}

/// Body of a detect-intent request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectIntentRequest {
    pub query_input: QueryInput,
    /// Base64 (standard alphabet) encoding of the captured audio.
    pub input_audio: String,
}

impl DetectIntentRequest {
    /// Build a linear PCM request for `audio`.
    pub fn linear16(audio: &[u8], language_code: &str, sample_rate_hertz: u32) -> Self {
        Self {
            query_input: QueryInput {
                audio_config: InputAudioConfig {
                    audio_encoding: AudioEncoding::Linear16,
                    language_code: language_code.to_owned(),
                    sample_rate_hertz,
                },
            },
            input_audio: STANDARD.encode(audio),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DetectIntentResponse {
    #[serde(default)]
    query_result: Option<QueryResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryResult {
    #[serde(default)]
    query_text: Option<serde_json::Value>,
    #[serde(default)]
    intent: Option<IntentRef>,
    #[serde(default)]
    parameters: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IntentRef {
    #[serde(default)]
    display_name: Option<String>,
}

/// Parse a detect-intent response body.
///
/// Missing `intent`, `displayName`, `parameters` or `queryText` are
/// tolerated (an absent or blank intent name means "unmatched"), as is a
/// `queryText` that is not a string, which is dropped. A body that
/// is not a JSON object or lacks `queryResult` is a parse failure.
///
/// # Errors
///
/// Returns [`CommandError::Parse`] for malformed bodies.
pub fn parse_detect_intent(body: &str, session_id: &str) -> Result<IntentResult> {
    let response: DetectIntentResponse = serde_json::from_str(body)
        .map_err(|e| CommandError::Parse(format!("detect-intent body is not valid JSON: {e}")))?;
    let result = response
        .query_result
        .ok_or_else(|| CommandError::Parse("detect-intent response has no queryResult".into()))?;

    let intent = result
        .intent
        .and_then(|i| i.display_name)
        .filter(|name| !name.trim().is_empty());
    let parameters = match result.parameters {
        Some(serde_json::Value::Object(map)) => map,
        _ => serde_json::Map::new(),
    };

    Ok(IntentResult {
        session_id: session_id.to_owned(),
        intent,
        parameters,
        query_text: result
            .query_text
            .and_then(|text| text.as_str().map(str::to_owned)),
    })
}

/// Pull a human-readable message out of a backend error body.
pub fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(String::from)
        })
        .unwrap_or_else(|| body.to_string())
}
