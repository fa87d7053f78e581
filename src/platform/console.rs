//! Console-driven platform for running the controller without a device.
//!
//! Each line read from stdin is the path of a WAV recording and counts as a
//! finished wake-phrase capture. Actuation calls are written to the log.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, info};

use super::{ArmPose, CaptureNotice, CaptureSubscription, DevicePlatform, HeadPose, Rgb};
use crate::error::{CommandError, Result};

/// Platform that reads capture paths from stdin.
pub struct ConsolePlatform {
    paths: Arc<Mutex<mpsc::UnboundedReceiver<PathBuf>>>,
}

impl ConsolePlatform {
    /// Start reading stdin on a background task.
    pub fn spawn() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                if tx.send(PathBuf::from(trimmed)).is_err() {
                    break;
                }
            }
            debug!("stdin closed, no further captures");
        });
        Self::from_receiver(rx)
    }

    /// Build a platform fed from an existing channel of capture paths.
    pub fn from_receiver(rx: mpsc::UnboundedReceiver<PathBuf>) -> Self {
        Self {
            paths: Arc::new(Mutex::new(rx)),
        }
    }
}

#[async_trait]
impl DevicePlatform for ConsolePlatform {
    fn id(&self) -> &'static str {
        "console"
    }

    async fn set_default_volume(&self, level: u8) -> Result<()> {
        info!(level, "volume set");
        Ok(())
    }

    async fn start_key_phrase_recognition(&self, capture_speech: bool) -> Result<()> {
        info!(capture_speech, "waiting for wake phrase (enter a WAV path)");
        Ok(())
    }

    async fn register_capture_listener(&self) -> Result<CaptureSubscription> {
        let (mut trigger, subscription) = CaptureSubscription::channel();
        let paths = Arc::clone(&self.paths);
        tokio::spawn(async move {
            let mut rx = paths.lock().await;
            let next = tokio::select! {
                biased;
                () = trigger.closed() => return,
                path = rx.recv() => path,
            };
            match next {
                Some(path) => {
                    let _ = trigger.fire(CaptureNotice {
                        file_name: Some(path.display().to_string()),
                    });
                }
                None => {
                    debug!("capture source closed");
                    let _ = trigger.close_source();
                }
            }
        });
        Ok(subscription)
    }

    async fn fetch_audio(&self, name: &str) -> Result<Vec<u8>> {
        tokio::fs::read(name)
            .await
            .map_err(|e| CommandError::Platform(format!("cannot read recording {name}: {e}")))
    }

    async fn change_led(&self, color: Rgb) -> Result<()> {
        info!(%color, "LED changed");
        Ok(())
    }

    async fn play_audio(&self, name: &str) -> Result<()> {
        info!(asset = name, "playing audio");
        Ok(())
    }

    async fn display_image(&self, name: &str) -> Result<()> {
        info!(asset = name, "displaying image");
        Ok(())
    }

    async fn move_head(&self, pose: HeadPose) -> Result<()> {
        debug!(?pose, "moving head");
        Ok(())
    }

    async fn move_arms(&self, pose: ArmPose) -> Result<()> {
        debug!(?pose, "moving arms");
        Ok(())
    }
}
