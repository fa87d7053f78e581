//! Interaction events emitted by the controller for observability.
//!
//! Payloads are small and cloneable so the loop can publish without
//! blocking; a lagging or absent subscriber never stalls a cycle.

use crate::controller::ControllerState;
use crate::dispatch::DispatchOutcome;

/// Events that describe what the controller is doing "right now".
#[derive(Debug, Clone, PartialEq)]
pub enum InteractionEvent {
    /// The controller moved between states.
    StateChanged {
        from: ControllerState,
        to: ControllerState,
    },
    /// A capture listener was armed and the listening cue played.
    ListeningArmed,
    /// The backend classified an utterance.
    IntentRecognized {
        session_id: String,
        /// `None` when nothing matched.
        intent: Option<String>,
        query_text: Option<String>,
        color: Option<String>,
    },
    /// The dispatcher routed a result.
    Dispatched(DispatchOutcome),
    /// A cycle took the fallback path because of a failure.
    CycleFailed { code: &'static str, message: String },
    /// The credential was re-acquired after the backend rejected it.
    CredentialRefreshed,
}
