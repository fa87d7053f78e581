//! Device platform abstraction.
//!
//! The controller never talks to robot hardware directly. Wake-phrase
//! detection, audio retrieval and every actuation (LED, sound, display,
//! head and arm motion) go through [`DevicePlatform`], so the interaction
//! loop runs unchanged against real hardware, the console, or the
//! in-memory [`RecordingPlatform`] used by tests.

use crate::error::{CommandError, Result};
use async_trait::async_trait;
use tokio::sync::oneshot;

mod console;
mod recording;

pub use console::ConsolePlatform;
pub use recording::{PlatformCall, RecordingPlatform};

/// An RGB colour for the chest LED.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl Rgb {
    /// Build a colour from its components.
    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }
}

impl std::fmt::Display for Rgb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.red, self.green, self.blue)
    }
}

/// Target head orientation in degrees, with movement velocity (0-100).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadPose {
    pub pitch: f32,
    pub roll: f32,
    pub yaw: f32,
    pub velocity: f32,
}

/// Target arm positions in degrees, with movement velocities (0-100).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArmPose {
    pub left_degrees: f32,
    pub right_degrees: f32,
    pub left_velocity: f32,
    pub right_velocity: f32,
}

/// Notification that a wake-phrase-triggered recording has finished.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureNotice {
    /// Platform name of the recording, when the platform reports one.
    pub file_name: Option<String>,
}

/// Platform side of a one-shot capture listener.
#[derive(Debug)]
pub struct CaptureTrigger {
    tx: oneshot::Sender<Option<CaptureNotice>>,
}

impl CaptureTrigger {
    /// Deliver the notice. Returns `false` if the listener was dropped.
    pub fn fire(self, notice: CaptureNotice) -> bool {
        self.tx.send(Some(notice)).is_ok()
    }

    /// Tell the listener no capture will ever arrive because the source
    /// has ended.
    pub fn close_source(self) -> bool {
        self.tx.send(None).is_ok()
    }

    /// Whether the controller still holds the matching subscription.
    pub fn is_active(&self) -> bool {
        !self.tx.is_closed()
    }

    /// Resolve when the controller drops the matching subscription.
    pub async fn closed(&mut self) {
        self.tx.closed().await;
    }
}

/// Controller side of a one-shot capture listener.
///
/// Fires at most once. Dropping it cancels the listener.
#[derive(Debug)]
pub struct CaptureSubscription {
    rx: oneshot::Receiver<Option<CaptureNotice>>,
}

impl CaptureSubscription {
    /// Create a connected trigger/subscription pair.
    pub fn channel() -> (CaptureTrigger, CaptureSubscription) {
        let (tx, rx) = oneshot::channel();
        (CaptureTrigger { tx }, CaptureSubscription { rx })
    }

    /// Wait for the capture-complete notification.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::CaptureClosed`] if the capture source has
    /// ended, or a platform error if the platform dropped the listener
    /// without firing it.
    pub async fn wait(self) -> Result<CaptureNotice> {
        match self.rx.await {
            Ok(Some(notice)) => Ok(notice),
            Ok(None) => Err(CommandError::CaptureClosed(
                "capture source has no further recordings".into(),
            )),
            Err(_) => Err(CommandError::Platform(
                "capture listener dropped by platform".into(),
            )),
        }
    }
}

/// Device services the interaction loop depends on.
#[async_trait]
pub trait DevicePlatform: Send + Sync {
    /// Stable identifier for logs (e.g. `console`, `recording`).
    fn id(&self) -> &'static str;

    /// Set the speaker volume (0-100).
    async fn set_default_volume(&self, level: u8) -> Result<()>;

    /// Begin wake-phrase detection, recording the following speech when
    /// `capture_speech` is set.
    async fn start_key_phrase_recognition(&self, capture_speech: bool) -> Result<()>;

    /// Register a one-shot listener for the next finished capture.
    async fn register_capture_listener(&self) -> Result<CaptureSubscription>;

    /// Retrieve the raw bytes of a captured recording.
    async fn fetch_audio(&self, name: &str) -> Result<Vec<u8>>;

    /// Change the chest LED colour.
    async fn change_led(&self, color: Rgb) -> Result<()>;

    /// Play an audio asset.
    async fn play_audio(&self, name: &str) -> Result<()>;

    /// Show an image asset on the display.
    async fn display_image(&self, name: &str) -> Result<()>;

    /// Move the head.
    async fn move_head(&self, pose: HeadPose) -> Result<()>;

    /// Move both arms.
    async fn move_arms(&self, pose: ArmPose) -> Result<()>;
}
