//! Provider action handling, the call state machine driven by the native
//! telephony subsystem
//!
//! | Action    | Needs call | Effect                          | Notifies       |
//! |-----------|------------|---------------------------------|----------------|
//! | Start     | no         | insert outgoing call, `Active`  | initiated      |
//! | Answer    | yes        | state becomes `Active`          | received       |
//! | End       | yes        | removed from table, `Ended`     | ended          |
//! | SetMuted  | yes        | mute flag set, state unchanged  | mute changed   |
//!
//! An action naming a call missing from the table is failed back to the
//! subsystem. Every action is fulfilled or failed exactly once.

use crate::application::coordinator::engine::CoordinatorCore;
use crate::domain::call::{Call, CallEvent, CallState};
use crate::domain::shared::value_objects::CallId;
use crate::domain::telephony::{CallHandle, ProviderAction, ProviderActionKind, ProviderEvent};
use crate::infrastructure::metrics;
use tracing::{debug, info, warn};

impl CoordinatorCore {
    pub(super) fn handle_provider_event(&mut self, event: ProviderEvent) {
        match event {
            ProviderEvent::Perform(action) => self.perform(action),
            ProviderEvent::Reset => self.reset_provider(),
            ProviderEvent::TimedOut { call_id, action } => {
                warn!("Provider timed out performing {} for call {}", action, call_id);
            }
            ProviderEvent::AudioSessionActivated => {
                info!("Provider activated the audio session");
                self.notify(CallEvent::AudioSessionChanged { active: true });
            }
            ProviderEvent::AudioSessionDeactivated => {
                info!("Provider deactivated the audio session");
                self.notify(CallEvent::AudioSessionChanged { active: false });
            }
        }
    }

    fn perform(&mut self, action: ProviderAction) {
        let ProviderAction {
            call_id,
            kind,
            responder,
        } = action;
        let name = kind.name();
        info!("Provider requested {} for call {}", name, call_id);

        let event = match kind {
            ProviderActionKind::Start { handle, is_video } => {
                Some(self.perform_start(call_id, &handle, is_video))
            }
            ProviderActionKind::Answer => self.perform_answer(call_id),
            ProviderActionKind::End => self.perform_end(call_id),
            ProviderActionKind::SetMuted { muted } => self.perform_set_muted(call_id, muted),
        };

        match event {
            Some(event) => {
                self.notify(event);
                responder.fulfill();
                metrics::record_provider_action(name, "fulfilled");
            }
            None => {
                warn!("Failing {} action for unknown call {}", name, call_id);
                responder.fail();
                metrics::record_provider_action(name, "failed");
            }
        }
    }

    fn perform_start(&mut self, call_id: CallId, handle: &CallHandle, is_video: bool) -> CallEvent {
        let call = Call::outgoing(call_id, &handle.value);
        debug!(is_video, "Starting outgoing call {} to {}", call_id, handle.value);

        if self.calls.insert(call_id, call.clone()).is_some() {
            warn!("Start action replaced existing call {}", call_id);
        }
        self.calls_changed();
        CallEvent::Initiated(call)
    }

    fn perform_answer(&mut self, call_id: CallId) -> Option<CallEvent> {
        let call = self.calls.get_mut(&call_id)?;
        if let Err(e) = call.answer() {
            warn!("Cannot answer call {}: {}", call_id, e);
            return None;
        }
        Some(CallEvent::Received(call.clone()))
    }

    fn perform_end(&mut self, call_id: CallId) -> Option<CallEvent> {
        let mut call = self.calls.remove(&call_id)?;
        call.conclude(CallState::Ended);
        self.calls_changed();
        Some(CallEvent::Ended(call))
    }

    fn perform_set_muted(&mut self, call_id: CallId, muted: bool) -> Option<CallEvent> {
        let call = self.calls.get_mut(&call_id)?;
        call.set_muted(muted);
        debug!("Call {} muted: {}", call_id, muted);
        Some(CallEvent::MuteStateChanged(call.clone()))
    }

    /// Every call in the table ends; observers hear about each one, then the
    /// table is cleared
    fn reset_provider(&mut self) {
        let mut ended = self.active_calls();
        info!("Provider reset, ending {} call(s)", ended.len());

        for call in &mut ended {
            call.conclude(CallState::Ended);
        }
        for call in ended {
            self.notify(CallEvent::Ended(call));
        }

        self.calls.clear();
        self.calls_changed();
    }
}
