//! voicecmd: wake-phrase voice command controller.
//!
//! The controller listens for a wake phrase, captures the following
//! utterance, sends it to a remote NLU service for intent classification
//! and drives the device accordingly, then re-arms listening:
//! Wake phrase → Capture → Detect intent → Dispatch → Listen again
//!
//! # Architecture
//!
//! - **Credentials**: acquires the bearer token from the credential provider
//! - **Capture**: arms wake-phrase detection and retrieves the recording
//! - **Recognition**: posts audio to the detect-intent endpoint via `reqwest`
//! - **Dispatch**: maps `(intent, parameter)` pairs to device actions
//! - **Controller**: the state machine tying the stages together
//!
//! Device access goes through the [`platform::DevicePlatform`] trait.

pub mod animation;
pub mod audio;
pub mod capture;
pub mod config;
pub mod controller;
pub mod credentials;
pub mod dispatch;
pub mod error;
pub mod platform;
pub mod recognition;
pub mod runtime;
pub mod session;

pub use config::CommandConfig;
pub use controller::{ControllerState, InteractionController};
pub use dispatch::{Action, DispatchOutcome, IntentDispatcher};
pub use error::{CommandError, Result};
pub use recognition::{IntentResult, RecognitionClient};
pub use runtime::InteractionEvent;
