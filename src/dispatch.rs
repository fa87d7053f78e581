//! Intent dispatch: a closed allow-list from classified intents to device
//! actions.
//!
//! Routing is a pure table lookup keyed by `(intent, parameter value)`.
//! Anything not in the table is [`DispatchOutcome::Unrecognized`] and takes
//! the same fallback path as a backend-level mismatch.

use crate::animation::Sequence;
use crate::config::CueConfig;
use crate::error::Result;
use crate::platform::{DevicePlatform, Rgb};
use crate::recognition::IntentResult;
use tracing::{debug, info};

/// Intent that changes the chest LED colour.
pub const CHANGE_LED_INTENT: &str = "ChangeLED";

/// Parameter naming the requested colour.
pub const COLOR_PARAMETER: &str = "color";

/// A device action produced by a matched rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    ChangeLed(Rgb),
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ChangeLed(rgb) => write!(f, "change LED to {rgb}"),
        }
    }
}

/// Why a result did not match any rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnrecognizedReason {
    /// The backend matched no intent.
    NoIntent,
    /// The intent is not on the allow-list.
    UnknownIntent(String),
    /// The intent is known but the parameter value is absent or unsupported.
    UnsupportedParameter {
        intent: String,
        parameter: &'static str,
        value: Option<String>,
    },
}

impl std::fmt::Display for UnrecognizedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoIntent => write!(f, "no intent matched"),
            Self::UnknownIntent(name) => write!(f, "unknown intent {name:?}"),
            Self::UnsupportedParameter {
                intent,
                parameter,
                value: Some(value),
            } => write!(f, "{intent}: unsupported {parameter} {value:?}"),
            Self::UnsupportedParameter {
                intent,
                parameter,
                value: None,
            } => write!(f, "{intent}: missing {parameter}"),
        }
    }
}

/// Result of dispatching one [`IntentResult`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Success(Action),
    Unrecognized(UnrecognizedReason),
}

impl DispatchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

/// One `(intent, parameter value) -> action` row.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Rule {
    intent: String,
    parameter: &'static str,
    value: String,
    action: Action,
}

/// Maps intents to actions and performs them on the device.
#[derive(Debug, Clone)]
pub struct IntentDispatcher {
    rules: Vec<Rule>,
    compliance: Sequence,
}

impl IntentDispatcher {
    /// Dispatcher with the built-in LED colour table.
    pub fn new(cues: &CueConfig) -> Self {
        Self {
            rules: Vec::new(),
            compliance: Sequence::compliance(cues),
        }
        .with_rule(CHANGE_LED_INTENT, COLOR_PARAMETER, "red", Action::ChangeLed(Rgb::new(255, 0, 0)))
        .with_rule(CHANGE_LED_INTENT, COLOR_PARAMETER, "green", Action::ChangeLed(Rgb::new(0, 255, 0)))
        .with_rule(CHANGE_LED_INTENT, COLOR_PARAMETER, "blue", Action::ChangeLed(Rgb::new(0, 0, 255)))
    }

    /// Add a row to the table. Values match exactly (case-sensitive).
    #[must_use]
    pub fn with_rule(
        mut self,
        intent: impl Into<String>,
        parameter: &'static str,
        value: impl Into<String>,
        action: Action,
    ) -> Self {
        self.rules.push(Rule {
            intent: intent.into(),
            parameter,
            value: value.into(),
            action,
        });
        self
    }

    /// Look up the action for `result` without touching the device.
    pub fn route(&self, result: &IntentResult) -> DispatchOutcome {
        let Some(intent) = result.intent.as_deref() else {
            return DispatchOutcome::Unrecognized(UnrecognizedReason::NoIntent);
        };

        let mut known_parameter = None;
        for rule in self.rules.iter().filter(|r| r.intent == intent) {
            let value = result.parameter_str(rule.parameter);
            if value == Some(rule.value.as_str()) {
                return DispatchOutcome::Success(rule.action);
            }
            if known_parameter.is_none() {
                known_parameter = Some((rule.parameter, value));
            }
        }

        match known_parameter {
            Some((parameter, value)) => {
                DispatchOutcome::Unrecognized(UnrecognizedReason::UnsupportedParameter {
                    intent: intent.to_owned(),
                    parameter,
                    value: value.map(str::to_owned),
                })
            }
            None => DispatchOutcome::Unrecognized(UnrecognizedReason::UnknownIntent(
                intent.to_owned(),
            )),
        }
    }

    /// Route `result` and carry out the matched action.
    ///
    /// On success the action runs followed by the compliance sequence. An
    /// unrecognized result performs no actuation; the caller owns the
    /// confusion cue so it plays once per fallback regardless of cause.
    ///
    /// # Errors
    ///
    /// Returns a platform error if the action itself fails. Compliance
    /// sequence failures are logged only.
    pub async fn dispatch(
        &self,
        platform: &dyn DevicePlatform,
        result: &IntentResult,
    ) -> Result<DispatchOutcome> {
        let outcome = self.route(result);
        match &outcome {
            DispatchOutcome::Success(action) => {
                info!(session = %result.session_id, %action, "dispatching intent");
                match action {
                    Action::ChangeLed(rgb) => platform.change_led(*rgb).await?,
                }
                self.compliance.perform(platform).await;
            }
            DispatchOutcome::Unrecognized(reason) => {
                debug!(session = %result.session_id, %reason, "intent not recognized");
            }
        }
        Ok(outcome)
    }
}
