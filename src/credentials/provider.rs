//! HTTP client for the credential provider.

use super::types::{Credential, TokenResponse};
use crate::config::CredentialConfig;
use crate::error::{CommandError, Result};
use tracing::{debug, info};

/// Acquires bearer credentials from the token endpoint.
pub struct CredentialManager {
    token_url: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for CredentialManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialManager")
            .field("token_url", &self.token_url)
            .finish()
    }
}

impl CredentialManager {
    /// Build a manager for the configured token endpoint.
    ///
    /// # Errors
    ///
    /// Returns a config error if the endpoint is empty or the HTTP client
    /// cannot be built.
    pub fn new(config: &CredentialConfig) -> Result<Self> {
        if config.token_url.trim().is_empty() {
            return Err(CommandError::Config(
                "credential token_url is not set".into(),
            ));
        }
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| CommandError::Config(format!("cannot build HTTP client: {e}")))?;
        Ok(Self {
            token_url: config.token_url.clone(),
            client,
        })
    }

    /// Issue one request to the credential provider.
    ///
    /// # Errors
    ///
    /// Every failure (transport, status, missing or empty `accessToken`) is
    /// reported as [`CommandError::CredentialAcquisition`].
    pub async fn acquire(&self) -> Result<Credential> {
        debug!(url = %self.token_url, "requesting access token");

        let response = self
            .client
            .post(&self.token_url)
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|e| {
                CommandError::CredentialAcquisition(format!("token request failed: {e}"))
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            CommandError::CredentialAcquisition(format!("token response unreadable: {e}"))
        })?;
        if !status.is_success() {
            return Err(CommandError::CredentialAcquisition(format!(
                "token endpoint returned HTTP {}: {body}",
                status.as_u16()
            )));
        }

        let token = parse_token_response(&body)?;
        info!("access token acquired");
        Ok(Credential::new(token))
    }
}

/// Extract the `accessToken` field from a provider response body.
fn parse_token_response(body: &str) -> Result<String> {
    let parsed: TokenResponse = serde_json::from_str(body).map_err(|e| {
        CommandError::CredentialAcquisition(format!("token response is not valid JSON: {e}"))
    })?;
    match parsed.access_token {
        Some(token) if !token.trim().is_empty() => Ok(token),
        _ => Err(CommandError::CredentialAcquisition(
            "token response has no accessToken".into(),
        )),
    }
}
