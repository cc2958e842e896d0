//! Observer that writes every call event to the log

use crate::domain::call::{Call, CallObserver};
use tracing::info;

#[derive(Debug, Default)]
pub struct TracingObserver;

impl TracingObserver {
    pub fn new() -> Self {
        Self
    }
}

impl CallObserver for TracingObserver {
    fn on_call_received(&self, call: &Call) {
        info!(
            call_id = %call.id(),
            caller = call.caller(),
            room = call.room_alias(),
            "Call received"
        );
    }

    fn on_call_initiated(&self, call: &Call) {
        info!(call_id = %call.id(), room = call.room_alias(), "Call initiated");
    }

    fn on_call_ended(&self, call: &Call) {
        info!(call_id = %call.id(), state = call.state().as_str(), "Call ended");
    }

    fn on_mute_state_changed(&self, call: &Call) {
        info!(call_id = %call.id(), muted = call.is_muted(), "Mute state changed");
    }

    fn on_audio_session_changed(&self, active: bool) {
        info!(active, "Audio session changed");
    }
}
