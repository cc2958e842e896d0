//! Entry points for the push and telephony subsystems
//!
//! Both sinks only forward into the coordinator queue, so they are cheap to
//! clone and safe to call from any thread. They hold the queue weakly: a
//! provider keeping its sink does not keep the coordinator alive.

use crate::application::coordinator::command::Command;
use crate::domain::push::{PushCompletion, PushEvent, PushPayload, PushType};
use crate::domain::shared::value_objects::CallId;
use crate::domain::telephony::{ProviderAction, ProviderEvent};
use tokio::sync::mpsc;
use tracing::warn;

/// Receives callbacks from the push subsystem
#[derive(Clone)]
pub struct PushSink {
    commands: mpsc::WeakUnboundedSender<Command>,
}

impl PushSink {
    pub(crate) fn new(commands: mpsc::WeakUnboundedSender<Command>) -> Self {
        Self { commands }
    }

    /// A (new) token was issued for `push_type`
    pub fn did_update_credentials(&self, push_type: PushType, token: &[u8]) {
        self.forward(PushEvent::CredentialsUpdated {
            push_type,
            token: token.to_vec(),
        });
    }

    pub fn did_invalidate_token(&self, push_type: PushType) {
        self.forward(PushEvent::TokenInvalidated { push_type });
    }

    /// A push arrived. `completion` is signalled once the push has been
    /// handled, whether or not it produced a call.
    pub fn did_receive_incoming_push(
        &self,
        push_type: PushType,
        payload: PushPayload,
        completion: PushCompletion,
    ) {
        self.forward(PushEvent::IncomingPush {
            push_type,
            payload,
            completion,
        });
    }

    fn forward(&self, event: PushEvent) {
        // A dropped event completes its push on the way out
        if !send(&self.commands, Command::Push(event)) {
            warn!("Call coordinator is gone, push event dropped");
        }
    }
}

/// Receives callbacks from the native telephony subsystem
#[derive(Clone)]
pub struct ProviderSink {
    commands: mpsc::WeakUnboundedSender<Command>,
}

impl ProviderSink {
    pub(crate) fn new(commands: mpsc::WeakUnboundedSender<Command>) -> Self {
        Self { commands }
    }

    /// The subsystem asks the application to carry out `action`
    pub fn perform(&self, action: ProviderAction) {
        self.forward(ProviderEvent::Perform(action));
    }

    pub fn did_reset(&self) {
        self.forward(ProviderEvent::Reset);
    }

    pub fn timed_out(&self, call_id: CallId, action: impl Into<String>) {
        self.forward(ProviderEvent::TimedOut {
            call_id,
            action: action.into(),
        });
    }

    pub fn did_activate_audio_session(&self) {
        self.forward(ProviderEvent::AudioSessionActivated);
    }

    pub fn did_deactivate_audio_session(&self) {
        self.forward(ProviderEvent::AudioSessionDeactivated);
    }

    fn forward(&self, event: ProviderEvent) {
        if !send(&self.commands, Command::Provider(event)) {
            warn!("Call coordinator is gone, provider event dropped");
        }
    }
}

fn send(commands: &mpsc::WeakUnboundedSender<Command>, command: Command) -> bool {
    match commands.upgrade() {
        Some(commands) => commands.send(command).is_ok(),
        None => false,
    }
}
