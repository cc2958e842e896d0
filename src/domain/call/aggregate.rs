//! Call aggregate root

use crate::domain::call::value_object::{CallDirection, CallState};
use crate::domain::shared::error::DomainError;
use crate::domain::shared::result::Result;
use crate::domain::shared::value_objects::CallId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Call aggregate root
///
/// Identity is fixed at construction. Every other field changes only through
/// the crate-private transition methods, which the coordinator invokes from
/// its single mutation path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Call {
    /// Aggregate root ID
    id: CallId,
    /// Display name of the calling party
    caller: String,
    /// Room the call leads into
    room_alias: String,
    direction: CallDirection,
    state: CallState,
    is_muted: bool,
    /// When the call entered the active-call table
    created_at: DateTime<Utc>,
}

impl Call {
    /// Create a call in the `New` state
    pub fn new(
        id: CallId,
        caller: impl Into<String>,
        room_alias: impl Into<String>,
        direction: CallDirection,
    ) -> Self {
        Self {
            id,
            caller: caller.into(),
            room_alias: room_alias.into(),
            direction,
            state: CallState::New,
            is_muted: false,
            created_at: Utc::now(),
        }
    }

    /// An incoming call waiting for the user to answer
    pub(crate) fn incoming(id: CallId, caller: String, room_alias: String) -> Self {
        let mut call = Self::new(id, caller, room_alias, CallDirection::Incoming);
        call.state = CallState::Connecting;
        call
    }

    /// An outgoing call accepted by the native subsystem. The handle value
    /// doubles as caller name and room alias.
    pub(crate) fn outgoing(id: CallId, handle: &str) -> Self {
        let mut call = Self::new(id, handle, handle, CallDirection::Outgoing);
        call.state = CallState::Active;
        call
    }

    /// Move a new call to `Connecting`
    pub fn connect(&mut self) -> Result<()> {
        self.transition_to(CallState::Connecting)
    }

    /// Answer the call. Answering an already active call is a no-op.
    pub(crate) fn answer(&mut self) -> Result<()> {
        if self.state == CallState::Active {
            return Ok(());
        }
        self.transition_to(CallState::Active)
    }

    /// Settle in a terminal state, keeping whichever terminal state the call
    /// already reached
    pub(crate) fn conclude(&mut self, terminal: CallState) {
        if self.state.is_terminal() {
            return;
        }
        if self.transition_to(terminal).is_err() {
            // Failed is unreachable from Active
            self.state = CallState::Ended;
        }
    }

    pub(crate) fn set_muted(&mut self, muted: bool) {
        self.is_muted = muted;
    }

    /// Transition to a new state
    fn transition_to(&mut self, new_state: CallState) -> Result<()> {
        if !self.state.can_transition_to(&new_state) {
            return Err(DomainError::InvalidStateTransition(format!(
                "Cannot transition call {} from {:?} to {:?}",
                self.id, self.state, new_state
            )));
        }

        self.state = new_state;
        Ok(())
    }

    // Getters
    pub fn id(&self) -> &CallId {
        &self.id
    }

    pub fn caller(&self) -> &str {
        &self.caller
    }

    pub fn room_alias(&self) -> &str {
        &self.room_alias
    }

    pub fn direction(&self) -> CallDirection {
        self.direction
    }

    pub fn state(&self) -> CallState {
        self.state
    }

    pub fn is_muted(&self) -> bool {
        self.is_muted
    }

    pub fn created_at(&self) -> &DateTime<Utc> {
        &self.created_at
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_incoming_call_lifecycle() {
        let mut call = Call::incoming(CallId::new(), "Alice".into(), "room-42".into());
        assert_eq!(call.state(), CallState::Connecting);
        assert_eq!(call.direction(), CallDirection::Incoming);
        assert!(!call.is_muted());

        call.answer().unwrap();
        assert_eq!(call.state(), CallState::Active);

        call.set_muted(true);
        assert!(call.is_muted());
        assert_eq!(call.state(), CallState::Active);

        call.conclude(CallState::Ended);
        assert!(call.is_terminal());
    }

    #[test]
    fn test_outgoing_call_starts_active() {
        let call = Call::outgoing(CallId::new(), "room-7");
        assert_eq!(call.state(), CallState::Active);
        assert_eq!(call.direction(), CallDirection::Outgoing);
        assert_eq!(call.caller(), "room-7");
        assert_eq!(call.room_alias(), "room-7");
    }

    #[test]
    fn test_answer_is_idempotent_while_active() {
        let mut call = Call::outgoing(CallId::new(), "room-7");
        assert!(call.answer().is_ok());
        assert_eq!(call.state(), CallState::Active);
    }

    #[test]
    fn test_cannot_leave_terminal_state() {
        let mut call = Call::new(CallId::new(), "Bob", "room-1", CallDirection::Incoming);
        call.connect().unwrap();
        call.conclude(CallState::Failed);

        assert!(call.answer().is_err());
        assert!(call.connect().is_err());
        assert_eq!(call.state(), CallState::Failed);
    }

    #[test]
    fn test_conclude_never_fails() {
        let mut active = Call::outgoing(CallId::new(), "room-7");
        active.conclude(CallState::Failed);
        assert_eq!(active.state(), CallState::Ended);

        let mut connecting = Call::incoming(CallId::new(), "Alice".into(), "room-42".into());
        connecting.conclude(CallState::Failed);
        assert_eq!(connecting.state(), CallState::Failed);

        connecting.conclude(CallState::Ended);
        assert_eq!(connecting.state(), CallState::Failed);
    }
}
