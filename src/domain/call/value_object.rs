//! Call value objects

use serde::{Deserialize, Serialize};

/// Call direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallDirection {
    /// Surfaced from a voice push
    Incoming,
    /// Placed locally through the native telephony subsystem
    Outgoing,
}

/// Call lifecycle state
///
/// `New -> Connecting -> Active -> Ended`, with `Failed` reachable from
/// `New` and `Connecting`. `Ended` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallState {
    New,
    Connecting,
    Active,
    Ended,
    Failed,
}

impl CallState {
    /// Check if state transition is valid
    pub fn can_transition_to(&self, new_state: &CallState) -> bool {
        use CallState::*;

        match (self, new_state) {
            // From New
            (New, Connecting) => true,
            (New, Active) => true,
            (New, Ended) => true,
            (New, Failed) => true,

            // From Connecting
            (Connecting, Active) => true,
            (Connecting, Ended) => true,
            (Connecting, Failed) => true,

            // From Active
            (Active, Ended) => true,

            // Terminal states
            (Ended, _) | (Failed, _) => false,

            _ => false,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, CallState::Ended | CallState::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CallState::New => "new",
            CallState::Connecting => "connecting",
            CallState::Active => "active",
            CallState::Ended => "ended",
            CallState::Failed => "failed",
        }
    }
}

/// Reason reported to the native telephony subsystem when a call concludes
/// outside of a provider action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// An error occurred while trying to service the call
    Failed,
    /// The remote party explicitly ended the call
    RemoteEnded,
    /// The call was answered on another device
    AnsweredElsewhere,
    /// The call was declined on another device
    DeclinedElsewhere,
}

impl EndReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            EndReason::Failed => "failed",
            EndReason::RemoteEnded => "remote_ended",
            EndReason::AnsweredElsewhere => "answered_elsewhere",
            EndReason::DeclinedElsewhere => "declined_elsewhere",
        }
    }

    /// Lifecycle state a call settles in when concluded for this reason
    pub fn terminal_state(&self) -> CallState {
        match self {
            EndReason::Failed => CallState::Failed,
            _ => CallState::Ended,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_state_transitions() {
        let new = CallState::New;
        assert!(new.can_transition_to(&CallState::Connecting));
        assert!(new.can_transition_to(&CallState::Active));
        assert!(new.can_transition_to(&CallState::Failed));

        let connecting = CallState::Connecting;
        assert!(connecting.can_transition_to(&CallState::Active));
        assert!(connecting.can_transition_to(&CallState::Ended));
        assert!(connecting.can_transition_to(&CallState::Failed));

        assert!(CallState::Active.can_transition_to(&CallState::Ended));
    }

    #[test]
    fn test_invalid_state_transitions() {
        assert!(!CallState::Active.can_transition_to(&CallState::Failed));
        assert!(!CallState::Active.can_transition_to(&CallState::Connecting));
        assert!(!CallState::Connecting.can_transition_to(&CallState::New));

        for terminal in [CallState::Ended, CallState::Failed] {
            assert!(terminal.is_terminal());
            for target in [
                CallState::New,
                CallState::Connecting,
                CallState::Active,
                CallState::Ended,
                CallState::Failed,
            ] {
                assert!(!terminal.can_transition_to(&target));
            }
        }
    }

    #[test]
    fn test_end_reason_terminal_state() {
        assert_eq!(EndReason::Failed.terminal_state(), CallState::Failed);
        assert_eq!(EndReason::RemoteEnded.terminal_state(), CallState::Ended);
        assert_eq!(EndReason::DeclinedElsewhere.terminal_state(), CallState::Ended);
    }
}
