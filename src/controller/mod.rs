//! Interaction loop controller.
//!
//! Sequences the credential manager, capture coordinator, recognition
//! client and intent dispatcher as one task:
//!
//! ```text
//! Idle -> Authenticating -> Listening -> Capturing -> Recognizing -> Dispatching -> Listening
//!               |               |            |             |              |
//!             Halted            +------------+------> Fallback <----------+
//!                                                        |
//!                                                        +--(pause)--> Listening
//! ```
//!
//! Only one capture cycle is ever in flight. Every per-cycle failure is
//! absorbed into the fallback path so the device always returns to
//! listening; only a failed credential acquisition stops the loop with an
//! error. A capture source that has ended stops it cleanly.

mod state;

pub use state::{ControllerEvent, ControllerState, next_state};

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::animation::Sequence;
use crate::capture::CaptureCoordinator;
use crate::config::CommandConfig;
use crate::credentials::CredentialManager;
use crate::dispatch::{COLOR_PARAMETER, DispatchOutcome, IntentDispatcher};
use crate::error::{CommandError, Result};
use crate::platform::DevicePlatform;
use crate::recognition::RecognitionClient;
use crate::runtime::InteractionEvent;

/// Top-level state machine for the voice command loop.
pub struct InteractionController {
    config: CommandConfig,
    platform: Arc<dyn DevicePlatform>,
    state: ControllerState,
    confusion: Sequence,
    cancel: CancellationToken,
    runtime_tx: Option<broadcast::Sender<InteractionEvent>>,
}

impl InteractionController {
    /// Create a controller in the `Idle` state.
    pub fn new(config: CommandConfig, platform: Arc<dyn DevicePlatform>) -> Self {
        let confusion = Sequence::confusion(&config.cues);
        Self {
            config,
            platform,
            state: ControllerState::Idle,
            confusion,
            cancel: CancellationToken::new(),
            runtime_tx: None,
        }
    }

    /// Attach an interaction event broadcaster for observability.
    pub fn with_runtime_events(mut self, tx: broadcast::Sender<InteractionEvent>) -> Self {
        self.runtime_tx = Some(tx);
        self
    }

    /// Current machine state.
    pub fn state(&self) -> ControllerState {
        self.state
    }

    /// Run the interaction loop until cancelled or the platform's capture
    /// source ends.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the credential
    /// cannot be acquired. Per-cycle failures never surface here.
    pub async fn run(mut self) -> Result<()> {
        self.config.validate()?;
        let cancel = self.cancel.clone();
        info!(platform = self.platform.id(), "starting voice command controller");

        let volume = self.config.interaction.default_volume;
        if let Err(e) = self.platform.set_default_volume(volume).await {
            warn!("could not set default volume: {e}");
        }

        self.apply(ControllerEvent::Startup);
        let credentials = CredentialManager::new(&self.config.credentials)?;
        let acquired = tokio::select! {
            () = cancel.cancelled() => {
                info!("shutdown requested during authentication");
                return Ok(());
            }
            result = credentials.acquire() => result,
        };
        let credential = match acquired {
            Ok(credential) => credential,
            Err(e) => {
                error!("cannot acquire credential, halting: {e}");
                self.report_failure(&e);
                self.apply(ControllerEvent::CredentialFailed);
                return Err(e);
            }
        };
        let mut client = RecognitionClient::new(&self.config.nlu, credential)?;
        self.apply(ControllerEvent::CredentialAcquired);

        let mut capture = CaptureCoordinator::new(
            Arc::clone(&self.platform),
            self.config.capture.clone(),
            &self.config.cues,
        );
        let dispatcher = IntentDispatcher::new(&self.config.cues);
        let default_pose = Sequence::default_pose();
        let success_pause = self.config.interaction.success_pause();

        loop {
            if let Err(e) = capture.arm_listening().await {
                if !self.fail_cycle(ControllerEvent::ArmFailed, &e, &cancel).await {
                    break;
                }
                continue;
            }
            self.emit(InteractionEvent::ListeningArmed);

            let notice = tokio::select! {
                () = cancel.cancelled() => break,
                notice = capture.wait_for_capture() => notice,
            };
            let notice = match notice {
                Ok(notice) => notice,
                Err(CommandError::CaptureClosed(reason)) => {
                    info!("{reason}, stopping");
                    break;
                }
                Err(e) => {
                    if !self.fail_cycle(ControllerEvent::ArmFailed, &e, &cancel).await {
                        break;
                    }
                    continue;
                }
            };
            self.apply(ControllerEvent::CaptureComplete);

            let audio = tokio::select! {
                () = cancel.cancelled() => break,
                audio = capture.on_capture_complete(&notice) => audio,
            };
            let audio = match audio {
                Ok(audio) => audio,
                Err(e) => {
                    if !self.fail_cycle(ControllerEvent::RetrievalFailed, &e, &cancel).await {
                        break;
                    }
                    continue;
                }
            };
            self.apply(ControllerEvent::AudioRetrieved);

            let recognized = tokio::select! {
                () = cancel.cancelled() => break,
                result = client.recognize(audio) => result,
            };
            let result = match recognized {
                Ok(result) => result,
                Err(e) => {
                    self.record_failure(ControllerEvent::RecognitionFailed, &e);
                    let refresh = (matches!(e, CommandError::Unauthorized(_))
                        && self.config.interaction.refresh_on_unauthorized)
                        .then_some((&credentials, &mut client));
                    if !self.fallback(&cancel, refresh).await {
                        break;
                    }
                    continue;
                }
            };

            let color = result.parameter_str(COLOR_PARAMETER).map(str::to_owned);
            debug!(
                session = %result.session_id,
                intent = result.intent.as_deref().unwrap_or(""),
                query_text = result.query_text.as_deref().unwrap_or(""),
                color = color.as_deref().unwrap_or(""),
                "intent recognized"
            );
            self.emit(InteractionEvent::IntentRecognized {
                session_id: result.session_id.clone(),
                intent: result.intent.clone(),
                query_text: result.query_text.clone(),
                color,
            });
            self.apply(ControllerEvent::IntentReady);

            let dispatched = dispatcher.dispatch(self.platform.as_ref(), &result).await;
            match dispatched {
                Ok(outcome @ DispatchOutcome::Success(_)) => {
                    self.emit(InteractionEvent::Dispatched(outcome));
                    self.apply(ControllerEvent::DispatchSucceeded);
                    if !pause(success_pause, &cancel).await {
                        break;
                    }
                    default_pose.perform(self.platform.as_ref()).await;
                }
                Ok(outcome) => {
                    info!("didn't catch that");
                    self.emit(InteractionEvent::Dispatched(outcome));
                    self.apply(ControllerEvent::DispatchUnrecognized);
                    if !self.fallback(&cancel, None).await {
                        break;
                    }
                }
                Err(e) => {
                    if !self.fail_cycle(ControllerEvent::DispatchFailed, &e, &cancel).await {
                        break;
                    }
                }
            }
        }

        capture.disarm();
        info!("voice command controller stopped");
        Ok(())
    }

    /// Request graceful shutdown of the loop.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// Get a clone of the cancellation token for external use.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    fn apply(&mut self, event: ControllerEvent) {
        match next_state(self.state, event) {
            Some(next) => {
                debug!(from = %self.state, to = %next, ?event, "state transition");
                let from = std::mem::replace(&mut self.state, next);
                self.emit(InteractionEvent::StateChanged { from, to: next });
            }
            None => warn!(state = %self.state, ?event, "ignoring event not valid in this state"),
        }
    }

    fn emit(&self, event: InteractionEvent) {
        if let Some(tx) = &self.runtime_tx {
            let _ = tx.send(event);
        }
    }

    fn report_failure(&self, e: &CommandError) {
        self.emit(InteractionEvent::CycleFailed {
            code: e.code(),
            message: e.to_string(),
        });
    }

    /// Log a per-cycle failure and move into `Fallback`.
    fn record_failure(&mut self, event: ControllerEvent, e: &CommandError) {
        warn!(state = %self.state, code = e.code(), "cycle failed: {e}");
        self.report_failure(e);
        self.apply(event);
    }

    /// Record a per-cycle failure and take the fallback path.
    /// Returns `false` if shutdown was requested meanwhile.
    async fn fail_cycle(
        &mut self,
        event: ControllerEvent,
        e: &CommandError,
        cancel: &CancellationToken,
    ) -> bool {
        self.record_failure(event, e);
        self.fallback(cancel, None).await
    }

    /// Confusion cue, fallback pause, back to listening.
    ///
    /// With `refresh` set, a new credential is acquired while the pause runs.
    /// Re-arming waits for both.
    async fn fallback(
        &mut self,
        cancel: &CancellationToken,
        refresh: Option<(&CredentialManager, &mut RecognitionClient)>,
    ) -> bool {
        self.confusion.perform(self.platform.as_ref()).await;
        let wait = self.config.interaction.fallback_pause();
        let resumed = match refresh {
            Some((credentials, client)) => {
                let (resumed, ()) = tokio::join!(
                    pause(wait, cancel),
                    self.refresh_credential(credentials, client, cancel)
                );
                resumed
            }
            None => pause(wait, cancel).await,
        };
        if !resumed {
            return false;
        }
        self.apply(ControllerEvent::PauseElapsed);
        true
    }

    async fn refresh_credential(
        &self,
        credentials: &CredentialManager,
        client: &mut RecognitionClient,
        cancel: &CancellationToken,
    ) {
        info!("backend rejected credential, refreshing");
        let refreshed = tokio::select! {
            () = cancel.cancelled() => return,
            result = credentials.acquire() => result,
        };
        match refreshed {
            Ok(credential) => {
                client.set_credential(credential);
                self.emit(InteractionEvent::CredentialRefreshed);
            }
            Err(e) => warn!("credential refresh failed, keeping previous credential: {e}"),
        }
    }
}

impl std::fmt::Debug for InteractionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InteractionController")
            .field("platform", &self.platform.id())
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

/// Sleep for `duration`. Returns `false` if cancelled first.
async fn pause(duration: Duration, cancel: &CancellationToken) -> bool {
    tokio::select! {
        () = cancel.cancelled() => false,
        () = tokio::time::sleep(duration) => true,
    }
}
