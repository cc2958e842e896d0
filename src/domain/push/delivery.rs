//! Events arriving from the push-delivery collaborator

use crate::domain::push::payload::{PushPayload, PushType};
use tokio::sync::oneshot;
use tracing::debug;

/// Acknowledgement owed to the push-delivery mechanism for one push.
///
/// Completion happens exactly once: explicitly through [`complete`], or
/// implicitly when the value is dropped on any other path.
///
/// [`complete`]: PushCompletion::complete
#[derive(Debug)]
pub struct PushCompletion {
    tx: Option<oneshot::Sender<()>>,
}

impl PushCompletion {
    /// Create a completion and the receiver the delivery mechanism waits on
    pub fn new() -> (Self, oneshot::Receiver<()>) {
        let (tx, rx) = oneshot::channel();
        (Self { tx: Some(tx) }, rx)
    }

    pub fn complete(mut self) {
        self.signal();
    }

    fn signal(&mut self) {
        if let Some(tx) = self.tx.take() {
            if tx.send(()).is_err() {
                debug!("Push delivery no longer waiting for completion");
            }
        }
    }
}

impl Drop for PushCompletion {
    fn drop(&mut self) {
        self.signal();
    }
}

/// Notifications from the push subsystem
#[derive(Debug)]
pub enum PushEvent {
    /// A new token was issued for `push_type`
    CredentialsUpdated { push_type: PushType, token: Vec<u8> },
    /// The token for `push_type` is no longer valid
    TokenInvalidated { push_type: PushType },
    /// A push arrived and must be acknowledged through `completion`
    IncomingPush {
        push_type: PushType,
        payload: PushPayload,
        completion: PushCompletion,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_explicit_completion_signals_once() {
        let (completion, rx) = PushCompletion::new();
        completion.complete();
        assert!(rx.await.is_ok());
    }

    #[tokio::test]
    async fn test_dropping_completion_still_signals() {
        let (completion, rx) = PushCompletion::new();
        drop(completion);
        assert!(rx.await.is_ok());
    }
}
