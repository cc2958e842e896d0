//! Provider actions requested by the native telephony subsystem

use crate::domain::shared::value_objects::CallId;
use crate::domain::telephony::port::CallHandle;
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use tracing::warn;

/// How an action was acknowledged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionOutcome {
    Fulfilled,
    Failed,
}

/// One-shot acknowledgement channel back to the native subsystem.
///
/// `fulfill` and `fail` consume the responder, so an action can be
/// acknowledged at most once. A responder dropped without an answer fails
/// the action, so no path leaves the subsystem waiting.
#[derive(Debug)]
pub struct ActionResponder {
    tx: Option<oneshot::Sender<ActionOutcome>>,
}

impl ActionResponder {
    pub fn new() -> (Self, oneshot::Receiver<ActionOutcome>) {
        let (tx, rx) = oneshot::channel();
        (Self { tx: Some(tx) }, rx)
    }

    pub fn fulfill(mut self) {
        self.respond(ActionOutcome::Fulfilled);
    }

    pub fn fail(mut self) {
        self.respond(ActionOutcome::Failed);
    }

    fn respond(&mut self, outcome: ActionOutcome) {
        if let Some(tx) = self.tx.take() {
            let _ = tx.send(outcome);
        }
    }
}

impl Drop for ActionResponder {
    fn drop(&mut self) {
        if self.tx.is_some() {
            warn!("Provider action dropped without acknowledgement, failing it");
            self.respond(ActionOutcome::Failed);
        }
    }
}

/// What the native subsystem asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderActionKind {
    Start { handle: CallHandle, is_video: bool },
    Answer,
    End,
    SetMuted { muted: bool },
}

impl ProviderActionKind {
    pub fn name(&self) -> &'static str {
        match self {
            ProviderActionKind::Start { .. } => "start",
            ProviderActionKind::Answer => "answer",
            ProviderActionKind::End => "end",
            ProviderActionKind::SetMuted { .. } => "set_muted",
        }
    }
}

/// A call action awaiting acknowledgement
#[derive(Debug)]
pub struct ProviderAction {
    pub call_id: CallId,
    pub kind: ProviderActionKind,
    pub responder: ActionResponder,
}

impl ProviderAction {
    pub fn new(
        call_id: CallId,
        kind: ProviderActionKind,
    ) -> (Self, oneshot::Receiver<ActionOutcome>) {
        let (responder, rx) = ActionResponder::new();
        (
            Self {
                call_id,
                kind,
                responder,
            },
            rx,
        )
    }

    pub fn start(
        call_id: CallId,
        handle: CallHandle,
        is_video: bool,
    ) -> (Self, oneshot::Receiver<ActionOutcome>) {
        Self::new(call_id, ProviderActionKind::Start { handle, is_video })
    }

    pub fn answer(call_id: CallId) -> (Self, oneshot::Receiver<ActionOutcome>) {
        Self::new(call_id, ProviderActionKind::Answer)
    }

    pub fn end(call_id: CallId) -> (Self, oneshot::Receiver<ActionOutcome>) {
        Self::new(call_id, ProviderActionKind::End)
    }

    pub fn set_muted(call_id: CallId, muted: bool) -> (Self, oneshot::Receiver<ActionOutcome>) {
        Self::new(call_id, ProviderActionKind::SetMuted { muted })
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }
}

/// Everything the native subsystem pushes at the coordinator
#[derive(Debug)]
pub enum ProviderEvent {
    Perform(ProviderAction),
    /// Full provider reset; every known call is gone
    Reset,
    /// An action was not acknowledged in time
    TimedOut { call_id: CallId, action: String },
    AudioSessionActivated,
    AudioSessionDeactivated,
}
