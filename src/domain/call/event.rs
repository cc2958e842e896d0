//! Call lifecycle events fanned out to observers

use crate::domain::call::aggregate::Call;
use crate::domain::call::observer::CallObserver;
use crate::domain::shared::value_objects::CallId;

/// Union of all lifecycle notifications
#[derive(Debug, Clone, PartialEq)]
pub enum CallEvent {
    Received(Call),
    Initiated(Call),
    Ended(Call),
    MuteStateChanged(Call),
    AudioSessionChanged { active: bool },
}

impl CallEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            CallEvent::Received(_) => "call.received",
            CallEvent::Initiated(_) => "call.initiated",
            CallEvent::Ended(_) => "call.ended",
            CallEvent::MuteStateChanged(_) => "call.mute_state_changed",
            CallEvent::AudioSessionChanged { .. } => "audio_session.changed",
        }
    }

    pub fn call_id(&self) -> Option<&CallId> {
        match self {
            CallEvent::Received(call)
            | CallEvent::Initiated(call)
            | CallEvent::Ended(call)
            | CallEvent::MuteStateChanged(call) => Some(call.id()),
            CallEvent::AudioSessionChanged { .. } => None,
        }
    }

    /// Invoke the matching observer callback
    pub fn deliver_to(&self, observer: &dyn CallObserver) {
        match self {
            CallEvent::Received(call) => observer.on_call_received(call),
            CallEvent::Initiated(call) => observer.on_call_initiated(call),
            CallEvent::Ended(call) => observer.on_call_ended(call),
            CallEvent::MuteStateChanged(call) => observer.on_mute_state_changed(call),
            CallEvent::AudioSessionChanged { active } => observer.on_audio_session_changed(*active),
        }
    }
}
