//! Wake-phrase arming and capture retrieval.
//!
//! The coordinator holds at most one [`CaptureSubscription`]. Arming drops
//! the previous one before registering a new listener, so after every arm
//! exactly one capture listener is live on the platform.

use std::sync::Arc;

use tracing::{debug, info};

use crate::animation::Sequence;
use crate::config::{CaptureConfig, CueConfig};
use crate::error::{CommandError, Result};
use crate::platform::{CaptureNotice, CaptureSubscription, DevicePlatform};

/// Arms wake-phrase detection and turns a finished capture into audio.
pub struct CaptureCoordinator {
    platform: Arc<dyn DevicePlatform>,
    config: CaptureConfig,
    listening_cue: Sequence,
    subscription: Option<CaptureSubscription>,
}

impl CaptureCoordinator {
    pub fn new(platform: Arc<dyn DevicePlatform>, config: CaptureConfig, cues: &CueConfig) -> Self {
        Self {
            platform,
            config,
            listening_cue: Sequence::listening(cues),
            subscription: None,
        }
    }

    /// Start wake-phrase detection, register a one-shot capture listener and
    /// play the listening cue.
    ///
    /// # Errors
    ///
    /// Returns a platform error if detection cannot be started or the
    /// listener cannot be registered. The coordinator is left unarmed.
    pub async fn arm_listening(&mut self) -> Result<()> {
        self.subscription = None;
        self.platform
            .start_key_phrase_recognition(self.config.capture_speech)
            .await?;
        self.subscription = Some(self.platform.register_capture_listener().await?);
        info!(platform = self.platform.id(), "listening");
        self.listening_cue.perform(self.platform.as_ref()).await;
        Ok(())
    }

    /// Whether a capture listener is registered and not yet consumed.
    pub fn is_armed(&self) -> bool {
        self.subscription.is_some()
    }

    /// Cancel the pending listener, if any.
    pub fn disarm(&mut self) {
        self.subscription = None;
    }

    /// Wait for the armed listener to fire. Consumes the subscription.
    ///
    /// # Errors
    ///
    /// Returns a platform error when not armed or when the platform drops
    /// the listener without firing it, and [`CommandError::CaptureClosed`]
    /// once the capture source has ended.
    pub async fn wait_for_capture(&mut self) -> Result<CaptureNotice> {
        let subscription = self
            .subscription
            .take()
            .ok_or_else(|| CommandError::Platform("no capture listener armed".into()))?;
        subscription.wait().await
    }

    /// Retrieve the recording named by `notice`, falling back to the
    /// configured capture file.
    ///
    /// # Errors
    ///
    /// Propagates the platform retrieval failure.
    pub async fn on_capture_complete(&self, notice: &CaptureNotice) -> Result<Vec<u8>> {
        let name = notice
            .file_name
            .as_deref()
            .unwrap_or(&self.config.audio_file);
        debug!(file = name, "capture complete, retrieving audio");
        self.platform.fetch_audio(name).await
    }
}

impl std::fmt::Debug for CaptureCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureCoordinator")
            .field("platform", &self.platform.id())
            .field("audio_file", &self.config.audio_file)
            .field("armed", &self.is_armed())
            .finish()
    }
}
