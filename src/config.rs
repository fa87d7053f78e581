//! Configuration types for the voice command controller.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Sample rate the NLU backend contract requires for linear PCM input.
pub const REQUIRED_SAMPLE_RATE_HERTZ: u32 = 16_000;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandConfig {
    /// Credential provider settings.
    pub credentials: CredentialConfig,
    /// NLU backend settings.
    pub nlu: NluConfig,
    /// Wake-phrase capture settings.
    pub capture: CaptureConfig,
    /// Interaction loop timing.
    pub interaction: InteractionConfig,
    /// Asset names used by the actuation sequences.
    pub cues: CueConfig,
}

/// Credential provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialConfig {
    /// Endpoint that issues bearer tokens (`POST`, JSON `accessToken`).
    pub token_url: String,
    /// Timeout for the token request in seconds.
    pub request_timeout_secs: u64,
}

impl Default for CredentialConfig {
    fn default() -> Self {
        Self {
            token_url: String::new(),
            request_timeout_secs: 10,
        }
    }
}

impl CredentialConfig {
    /// Token request timeout as a [`Duration`].
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// NLU backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NluConfig {
    /// Scheme and host of the detect-intent API.
    pub base_url: String,
    /// Agent project identifier.
    pub project_id: String,
    /// BCP-47 language code sent with every query.
    pub language_code: String,
    /// Sample rate of the captured audio.
    ///
    /// Must equal [`REQUIRED_SAMPLE_RATE_HERTZ`]; anything else is rejected
    /// when the recognition client is built.
    pub sample_rate_hertz: u32,
    /// Timeout for one detect-intent request in seconds.
    pub request_timeout_secs: u64,
}

impl Default for NluConfig {
    fn default() -> Self {
        Self {
            base_url: "https://dialogflow.googleapis.com".to_owned(),
            project_id: String::new(),
            language_code: "en-US".to_owned(),
            sample_rate_hertz: REQUIRED_SAMPLE_RATE_HERTZ,
            request_timeout_secs: 15,
        }
    }
}

impl NluConfig {
    /// Detect-intent request timeout as a [`Duration`].
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Wake-phrase capture configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Platform name of the recording produced after the wake phrase.
    pub audio_file: String,
    /// Whether the platform records speech after detecting the wake phrase.
    pub capture_speech: bool,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            audio_file: "capture_HeyMisty.wav".to_owned(),
            capture_speech: true,
        }
    }
}

/// Interaction loop configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
    /// Pause after a successful command before listening again (ms).
    pub success_pause_ms: u64,
    /// Pause after the confusion cue before listening again (ms).
    pub fallback_pause_ms: u64,
    /// Speaker volume applied once at startup (0-100).
    pub default_volume: u8,
    /// Re-acquire the credential when the backend answers 401.
    pub refresh_on_unauthorized: bool,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            success_pause_ms: 5_000,
            fallback_pause_ms: 2_000,
            default_volume: 20,
            refresh_on_unauthorized: true,
        }
    }
}

impl InteractionConfig {
    /// Pause after a successful dispatch.
    pub fn success_pause(&self) -> Duration {
        Duration::from_millis(self.success_pause_ms)
    }

    /// Pause after entering the fallback path.
    pub fn fallback_pause(&self) -> Duration {
        Duration::from_millis(self.fallback_pause_ms)
    }
}

/// Asset names for the audible and visual cues.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CueConfig {
    /// Played whenever listening is armed.
    pub listening_sound: String,
    /// Played when a command was carried out.
    pub compliance_sound: String,
    /// Played on the fallback path.
    pub confusion_sound: String,
    /// Shown when a command was carried out.
    pub compliance_image: String,
    /// Shown on the fallback path.
    pub confusion_image: String,
}

impl Default for CueConfig {
    fn default() -> Self {
        Self {
            listening_sound: "s_Joy3.wav".to_owned(),
            compliance_sound: "s_Acceptance.wav".to_owned(),
            confusion_sound: "s_DisorientedConfused3.wav".to_owned(),
            compliance_image: "e_Joy2.jpg".to_owned(),
            confusion_image: "e_ApprehensionConcerned.jpg".to_owned(),
        }
    }
}

impl CommandConfig {
    /// Load configuration from a TOML file, falling back to defaults for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| crate::error::CommandError::Config(e.to_string()))
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &std::path::Path) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = self.to_toml()?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Render the configuration as pretty TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> crate::error::Result<String> {
        toml::to_string_pretty(self).map_err(|e| crate::error::CommandError::Config(e.to_string()))
    }

    /// Check the fields the controller cannot start without.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::Config`](crate::error::CommandError::Config)
    /// naming the first missing or contract-incompatible field.
    pub fn validate(&self) -> crate::error::Result<()> {
        use crate::error::CommandError;

        if self.credentials.token_url.trim().is_empty() {
            return Err(CommandError::Config("credentials.token_url is not set".into()));
        }
        if self.nlu.project_id.trim().is_empty() {
            return Err(CommandError::Config("nlu.project_id is not set".into()));
        }
        if self.nlu.sample_rate_hertz != REQUIRED_SAMPLE_RATE_HERTZ {
            return Err(CommandError::Config(format!(
                "nlu.sample_rate_hertz must be {REQUIRED_SAMPLE_RATE_HERTZ}, got {}",
                self.nlu.sample_rate_hertz
            )));
        }
        if self.interaction.default_volume > 100 {
            return Err(CommandError::Config(format!(
                "interaction.default_volume must be 0-100, got {}",
                self.interaction.default_volume
            )));
        }
        Ok(())
    }

    /// Returns the default config file path: `~/.config/voicecmd/config.toml`.
    pub fn default_config_path() -> PathBuf {
        if let Some(config) = std::env::var_os("XDG_CONFIG_HOME") {
            PathBuf::from(config).join("voicecmd").join("config.toml")
        } else if let Some(dir) = dirs::config_dir() {
            dir.join("voicecmd").join("config.toml")
        } else {
            PathBuf::from("/tmp/voicecmd-config/config.toml")
        }
    }
}
