//! Controller states and the pure transition function.

/// The single process-wide machine state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControllerState {
    /// Not started.
    Idle,
    /// Acquiring the bearer credential.
    Authenticating,
    /// Wake-phrase detection armed, waiting for a capture.
    Listening,
    /// Retrieving the captured recording.
    Capturing,
    /// Waiting on the NLU backend.
    Recognizing,
    /// Carrying out the matched action.
    Dispatching,
    /// Confusion cue and pause before re-arming.
    Fallback,
    /// Credential acquisition failed. Terminal.
    Halted,
}

impl std::fmt::Display for ControllerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Authenticating => "authenticating",
            Self::Listening => "listening",
            Self::Capturing => "capturing",
            Self::Recognizing => "recognizing",
            Self::Dispatching => "dispatching",
            Self::Fallback => "fallback",
            Self::Halted => "halted",
        };
        f.write_str(name)
    }
}

/// Inputs that drive the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControllerEvent {
    Startup,
    CredentialAcquired,
    CredentialFailed,
    /// Arming failed, or the platform dropped the listener unfired.
    ArmFailed,
    CaptureComplete,
    AudioRetrieved,
    RetrievalFailed,
    IntentReady,
    /// Transport, parse, timeout, unauthorized or audio-format failure.
    RecognitionFailed,
    DispatchSucceeded,
    DispatchUnrecognized,
    /// The matched action could not be carried out on the device.
    DispatchFailed,
    PauseElapsed,
}

/// Next state for `event` in `state`, or `None` if the event is not valid
/// there.
pub fn next_state(state: ControllerState, event: ControllerEvent) -> Option<ControllerState> {
    use ControllerEvent as E;
    use ControllerState as S;

    let next = match (state, event) {
        (S::Idle, E::Startup) => S::Authenticating,
        (S::Authenticating, E::CredentialAcquired) => S::Listening,
        (S::Authenticating, E::CredentialFailed) => S::Halted,
        (S::Listening, E::CaptureComplete) => S::Capturing,
        (S::Listening, E::ArmFailed) => S::Fallback,
        (S::Capturing, E::AudioRetrieved) => S::Recognizing,
        (S::Capturing, E::RetrievalFailed) => S::Fallback,
        (S::Recognizing, E::IntentReady) => S::Dispatching,
        (S::Recognizing, E::RecognitionFailed) => S::Fallback,
        (S::Dispatching, E::DispatchSucceeded) => S::Listening,
        (S::Dispatching, E::DispatchUnrecognized | E::DispatchFailed) => S::Fallback,
        (S::Fallback, E::PauseElapsed) => S::Listening,
        _ => return None,
    };
    Some(next)
}
