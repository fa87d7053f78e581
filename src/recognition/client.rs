//! HTTP client for the NLU detect-intent endpoint.

use tracing::{debug, info};

use super::IntentResult;
use super::wire::{DetectIntentRequest, extract_error_message, parse_detect_intent};
use crate::audio::validate_linear16;
use crate::config::{NluConfig, REQUIRED_SAMPLE_RATE_HERTZ};
use crate::credentials::Credential;
use crate::error::{CommandError, Result};
use crate::session::Session;

/// Sends captured audio to the NLU backend and parses the classified intent.
pub struct RecognitionClient {
    config: NluConfig,
    credential: Credential,
    client: reqwest::Client,
}

impl std::fmt::Debug for RecognitionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecognitionClient")
            .field("base_url", &self.config.base_url)
            .field("project_id", &self.config.project_id)
            .field("credential", &self.credential)
            .finish()
    }
}

impl RecognitionClient {
    /// Build a client bound to `credential`.
    ///
    /// # Errors
    ///
    /// Returns a config error when the project is unset or the configured
    /// sample rate differs from what the backend accepts.
    pub fn new(config: &NluConfig, credential: Credential) -> Result<Self> {
        if config.sample_rate_hertz != REQUIRED_SAMPLE_RATE_HERTZ {
            return Err(CommandError::Config(format!(
                "NLU backend requires {REQUIRED_SAMPLE_RATE_HERTZ}Hz linear PCM, configured {}Hz",
                config.sample_rate_hertz
            )));
        }
        if config.project_id.trim().is_empty() {
            return Err(CommandError::Config("NLU project_id is not set".into()));
        }
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| CommandError::Config(format!("cannot build HTTP client: {e}")))?;
        Ok(Self {
            config: config.clone(),
            credential,
            client,
        })
    }

    /// Replace the bearer credential (after a refresh).
    pub fn set_credential(&mut self, credential: Credential) {
        self.credential = credential;
    }

    /// The credential attached to requests.
    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    /// Detect-intent URL for a session.
    pub fn endpoint(&self, session_id: &str) -> String {
        format!(
            "{}/v2/projects/{}/agent/sessions/{session_id}:detectIntent",
            self.config.base_url.trim_end_matches('/'),
            self.config.project_id
        )
    }

    /// Recognize one captured utterance under a fresh session.
    ///
    /// # Errors
    ///
    /// Returns a classified failure: [`CommandError::Audio`] for audio that
    /// breaks the PCM contract, [`CommandError::Timeout`],
    /// [`CommandError::Unauthorized`] (HTTP 401), [`CommandError::Transport`]
    /// (network or other HTTP status) or [`CommandError::Parse`].
    pub async fn recognize(&self, audio: Vec<u8>) -> Result<IntentResult> {
        self.detect_intent(Session::new(audio)).await
    }

    /// Submit a session. The session is consumed whatever the outcome.
    ///
    /// # Errors
    ///
    /// See [`recognize`](Self::recognize).
    pub async fn detect_intent(&self, session: Session) -> Result<IntentResult> {
        validate_linear16(session.audio(), self.config.sample_rate_hertz)?;

        let url = self.endpoint(session.id());
        let body = DetectIntentRequest::linear16(
            session.audio(),
            &self.config.language_code,
            self.config.sample_rate_hertz,
        );
        debug!(session = session.id(), bytes = session.audio().len(), "sending detect-intent request");

        let response = self
            .client
            .post(&url)
            .header("Authorization", self.credential.bearer_header())
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let text = response.text().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_http_error(status, &text));
        }

        let result = parse_detect_intent(&text, session.id())?;
        info!(
            session = session.id(),
            intent = result.intent.as_deref().unwrap_or("<none>"),
            "detect-intent response received"
        );
        Ok(result)
    }
}

fn map_transport_error(e: reqwest::Error) -> CommandError {
    if e.is_timeout() {
        CommandError::Timeout(format!("detect-intent request timed out: {e}"))
    } else {
        CommandError::Transport(format!("detect-intent request failed: {e}"))
    }
}

/// Map a non-success HTTP status to a classified failure.
fn map_http_error(status: reqwest::StatusCode, body: &str) -> CommandError {
    let message = extract_error_message(body);
    match status.as_u16() {
        401 => CommandError::Unauthorized(format!("NLU backend rejected credential: {message}")),
        code => CommandError::Transport(format!("NLU backend HTTP {code}: {message}")),
    }
}
