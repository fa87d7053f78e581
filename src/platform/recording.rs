//! In-memory platform that records every call.
//!
//! Used by tests and dry runs to drive the interaction loop without a
//! device. Captures are simulated with [`RecordingPlatform::complete_capture`]
//! and recordings are staged with [`RecordingPlatform::stage_audio`].

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use super::{
    ArmPose, CaptureNotice, CaptureSubscription, CaptureTrigger, DevicePlatform, HeadPose, Rgb,
};
use crate::error::{CommandError, Result};

/// A single recorded platform call.
#[derive(Debug, Clone, PartialEq)]
pub enum PlatformCall {
    SetVolume(u8),
    StartKeyPhrase { capture_speech: bool },
    RegisterCaptureListener,
    FetchAudio(String),
    ChangeLed(Rgb),
    PlayAudio(String),
    DisplayImage(String),
    MoveHead(HeadPose),
    MoveArms(ArmPose),
}

#[derive(Default)]
struct State {
    calls: Vec<PlatformCall>,
    triggers: Vec<CaptureTrigger>,
    pending_captures: VecDeque<CaptureNotice>,
    staged_audio: VecDeque<std::result::Result<Vec<u8>, String>>,
    fail_actuation: bool,
    fail_arming: usize,
}

/// Platform double that records calls and simulates captures.
#[derive(Default)]
pub struct RecordingPlatform {
    state: Mutex<State>,
}

impl RecordingPlatform {
    /// Create an empty platform.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Queue a recording returned by the next `fetch_audio` call.
    pub fn stage_audio(&self, audio: impl Into<Vec<u8>>) {
        self.lock().staged_audio.push_back(Ok(audio.into()));
    }

    /// Make the next `fetch_audio` call fail.
    pub fn fail_next_fetch(&self, message: impl Into<String>) {
        self.lock().staged_audio.push_back(Err(message.into()));
    }

    /// Make every actuation call (LED, sound, image, motion) fail.
    pub fn set_fail_actuation(&self, fail: bool) {
        self.lock().fail_actuation = fail;
    }

    /// Make the next `count` wake-phrase arm attempts fail.
    pub fn fail_next_arms(&self, count: usize) {
        self.lock().fail_arming = count;
    }

    /// Simulate a finished wake-phrase recording.
    ///
    /// Fires the active listener if there is one; otherwise the notice is
    /// queued and delivered to the next listener that registers.
    pub fn complete_capture(&self) {
        self.complete_capture_with(CaptureNotice::default());
    }

    /// Like [`complete_capture`](Self::complete_capture) with an explicit notice.
    pub fn complete_capture_with(&self, notice: CaptureNotice) {
        let mut state = self.lock();
        state.triggers.retain(CaptureTrigger::is_active);
        match state.triggers.pop() {
            Some(trigger) => {
                if !trigger.fire(notice.clone()) {
                    state.pending_captures.push_back(notice);
                }
            }
            None => state.pending_captures.push_back(notice),
        }
    }

    /// Number of capture listeners the controller currently holds.
    pub fn active_listeners(&self) -> usize {
        let mut state = self.lock();
        state.triggers.retain(CaptureTrigger::is_active);
        state.triggers.len()
    }

    /// Snapshot of every call so far.
    pub fn calls(&self) -> Vec<PlatformCall> {
        self.lock().calls.clone()
    }

    /// LED colours set so far, in order.
    pub fn led_colors(&self) -> Vec<Rgb> {
        self.lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                PlatformCall::ChangeLed(rgb) => Some(*rgb),
                _ => None,
            })
            .collect()
    }

    /// Audio assets played so far, in order.
    pub fn played_audio(&self) -> Vec<String> {
        self.lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                PlatformCall::PlayAudio(name) => Some(name.clone()),
                _ => None,
            })
            .collect()
    }

    /// How many times wake-phrase detection has been started.
    pub fn arm_count(&self) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|call| matches!(call, PlatformCall::StartKeyPhrase { .. }))
            .count()
    }

    fn actuate(&self, call: PlatformCall) -> Result<()> {
        let mut state = self.lock();
        state.calls.push(call);
        if state.fail_actuation {
            return Err(CommandError::Platform("actuation unavailable".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl DevicePlatform for RecordingPlatform {
    fn id(&self) -> &'static str {
        "recording"
    }

    async fn set_default_volume(&self, level: u8) -> Result<()> {
        self.lock().calls.push(PlatformCall::SetVolume(level));
        Ok(())
    }

    async fn start_key_phrase_recognition(&self, capture_speech: bool) -> Result<()> {
        let mut state = self.lock();
        state
            .calls
            .push(PlatformCall::StartKeyPhrase { capture_speech });
        if state.fail_arming > 0 {
            state.fail_arming -= 1;
            return Err(CommandError::Platform(
                "key phrase recognition unavailable".into(),
            ));
        }
        Ok(())
    }

    async fn register_capture_listener(&self) -> Result<CaptureSubscription> {
        let mut state = self.lock();
        state.calls.push(PlatformCall::RegisterCaptureListener);
        let (trigger, subscription) = CaptureSubscription::channel();
        match state.pending_captures.pop_front() {
            Some(notice) => {
                let _ = trigger.fire(notice);
            }
            None => state.triggers.push(trigger),
        }
        Ok(subscription)
    }

    async fn fetch_audio(&self, name: &str) -> Result<Vec<u8>> {
        let mut state = self.lock();
        state.calls.push(PlatformCall::FetchAudio(name.to_owned()));
        match state.staged_audio.pop_front() {
            Some(Ok(audio)) => Ok(audio),
            Some(Err(message)) => Err(CommandError::Platform(message)),
            None => Err(CommandError::Platform(format!(
                "no recording available for {name}"
            ))),
        }
    }

    async fn change_led(&self, color: Rgb) -> Result<()> {
        self.actuate(PlatformCall::ChangeLed(color))
    }

    async fn play_audio(&self, name: &str) -> Result<()> {
        self.actuate(PlatformCall::PlayAudio(name.to_owned()))
    }

    async fn display_image(&self, name: &str) -> Result<()> {
        self.actuate(PlatformCall::DisplayImage(name.to_owned()))
    }

    async fn move_head(&self, pose: HeadPose) -> Result<()> {
        self.actuate(PlatformCall::MoveHead(pose))
    }

    async fn move_arms(&self, pose: ArmPose) -> Result<()> {
        self.actuate(PlatformCall::MoveArms(pose))
    }
}
