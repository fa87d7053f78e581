//! Fixed actuation sequences: default pose, compliance, confusion.
//!
//! A sequence is an ordered list of platform steps. Steps are played in
//! order; a failing step is logged and the rest still run, so a broken
//! speaker never stops the arms from moving.

use crate::config::CueConfig;
use crate::platform::{ArmPose, DevicePlatform, HeadPose};
use tracing::warn;

/// One actuation step.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    MoveHead(HeadPose),
    PlayAudio(String),
    DisplayImage(String),
    MoveArms(ArmPose),
}

/// An ordered actuation sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct Sequence {
    name: &'static str,
    steps: Vec<Step>,
}

const fn head(pitch: f32, roll: f32, yaw: f32) -> HeadPose {
    HeadPose {
        pitch,
        roll,
        yaw,
        velocity: 100.0,
    }
}

const fn arms(left_degrees: f32, right_degrees: f32) -> ArmPose {
    ArmPose {
        left_degrees,
        right_degrees,
        left_velocity: 100.0,
        right_velocity: 100.0,
    }
}

impl Sequence {
    /// Neutral pose: head level, arms down.
    pub fn default_pose() -> Self {
        Self {
            name: "default",
            steps: vec![
                Step::MoveHead(head(0.0, 0.0, 0.0)),
                Step::MoveArms(arms(90.0, 90.0)),
            ],
        }
    }

    /// Cue played whenever listening is armed.
    pub fn listening(cues: &CueConfig) -> Self {
        let mut steps = vec![Step::PlayAudio(cues.listening_sound.clone())];
        steps.extend(Self::default_pose().steps);
        Self {
            name: "listening",
            steps,
        }
    }

    /// Played after a command was carried out.
    pub fn compliance(cues: &CueConfig) -> Self {
        Self {
            name: "compliance",
            steps: vec![
                Step::MoveHead(head(-15.0, 0.0, 0.0)),
                Step::PlayAudio(cues.compliance_sound.clone()),
                Step::DisplayImage(cues.compliance_image.clone()),
                Step::MoveArms(arms(0.0, -25.0)),
            ],
        }
    }

    /// Played on the fallback path.
    pub fn confusion(cues: &CueConfig) -> Self {
        Self {
            name: "confusion",
            steps: vec![
                Step::MoveHead(head(-10.0, 30.0, 0.0)),
                Step::PlayAudio(cues.confusion_sound.clone()),
                Step::DisplayImage(cues.confusion_image.clone()),
                Step::MoveArms(arms(-25.0, 90.0)),
            ],
        }
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Play every step. Returns the number of steps that failed.
    pub async fn perform(&self, platform: &dyn DevicePlatform) -> usize {
        let mut failed = 0;
        for step in &self.steps {
            let result = match step {
                Step::MoveHead(pose) => platform.move_head(*pose).await,
                Step::PlayAudio(name) => platform.play_audio(name).await,
                Step::DisplayImage(name) => platform.display_image(name).await,
                Step::MoveArms(pose) => platform.move_arms(*pose).await,
            };
            if let Err(e) = result {
                failed += 1;
                warn!(sequence = self.name, ?step, "actuation step failed: {e}");
            }
        }
        failed
    }
}
