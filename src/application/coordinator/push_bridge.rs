//! Push ingestion: tokens and incoming voice pushes

use crate::application::coordinator::command::Command;
use crate::application::coordinator::engine::CoordinatorCore;
use crate::domain::call::{Call, CallState};
use crate::domain::push::{PushEvent, PushPayload, PushType};
use crate::domain::shared::value_objects::{CallId, DeviceToken};
use crate::domain::telephony::{IncomingCallUpdate, TelephonyError};
use crate::infrastructure::metrics;
use tracing::{debug, error, info, warn};

impl CoordinatorCore {
    pub(super) fn handle_push_event(&mut self, event: PushEvent) {
        match event {
            PushEvent::CredentialsUpdated { push_type, token } => {
                if push_type != self.config.push.desired_push_type {
                    debug!("Ignoring {} token update", push_type);
                    return;
                }
                let token = DeviceToken::from_bytes(&token);
                if self.device_registration.update(token.clone()) {
                    info!("Device token updated: {}", token);
                }
            }
            PushEvent::TokenInvalidated { push_type } => {
                if push_type != self.config.push.desired_push_type {
                    debug!("Ignoring {} token invalidation", push_type);
                    return;
                }
                if self.device_registration.invalidate() {
                    info!("Device token invalidated");
                }
            }
            PushEvent::IncomingPush {
                push_type,
                payload,
                completion,
            } => {
                let outcome = self.ingest_push(push_type, &payload);
                metrics::record_push(outcome);
                completion.complete();
            }
        }
    }

    /// Turn a voice push into a connecting incoming call and ask the native
    /// subsystem to surface it. Returns the outcome label.
    fn ingest_push(&mut self, push_type: PushType, payload: &PushPayload) -> &'static str {
        debug!("Received {} push: {:?}", push_type, payload.fields());

        if push_type != self.config.push.desired_push_type {
            debug!(
                "Dropping {} push, only {} pushes carry calls",
                push_type, self.config.push.desired_push_type
            );
            return "ignored";
        }

        let request = match payload.incoming_call() {
            Ok(request) => request,
            Err(e) => {
                warn!("Dropping malformed call push: {}", e);
                return "malformed";
            }
        };

        let call = Call::incoming(CallId::new(), request.caller, request.room_alias);
        let call_id = *call.id();
        let update = IncomingCallUpdate::for_room(
            call.room_alias(),
            call.caller(),
            self.config.provider.supports_video,
        );

        info!(
            "Reporting incoming call {} from {} to room {}",
            call_id,
            call.caller(),
            call.room_alias()
        );
        self.calls.insert(call_id, call);
        self.calls_changed();

        let telephony = self.telephony.clone();
        self.spawn_native(async move {
            let result = telephony.report_new_incoming_call(call_id, update).await;
            Command::IncomingCallReported { call_id, result }
        });

        "accepted"
    }

    pub(super) fn on_incoming_call_reported(
        &mut self,
        call_id: CallId,
        result: Result<(), TelephonyError>,
    ) {
        match result {
            Ok(()) => info!("Incoming call {} surfaced", call_id),
            Err(e) => {
                error!("Native subsystem rejected incoming call {}: {}", call_id, e);
                if let Some(mut call) = self.calls.remove(&call_id) {
                    call.conclude(CallState::Failed);
                    self.calls_changed();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::application::coordinator::command::Command;
    use crate::application::coordinator::engine::tests::Harness;
    use crate::application::coordinator::observer_registry::tests::RecordingObserver;
    use crate::domain::call::{CallDirection, CallState};
    use crate::domain::push::payload::ROOM_ALIAS_KEY;
    use crate::domain::push::{PushCompletion, PushEvent, PushPayload, PushType};
    use crate::domain::telephony::{MockTelephonyProvider, TelephonyError};
    use std::sync::Arc;

    fn push(
        harness: &mut Harness,
        push_type: PushType,
        payload: PushPayload,
    ) -> tokio::sync::oneshot::Receiver<()> {
        let (completion, rx) = PushCompletion::new();
        harness.core.handle(Command::Push(PushEvent::IncomingPush {
            push_type,
            payload,
            completion,
        }));
        rx
    }

    #[tokio::test]
    async fn test_voip_push_creates_connecting_incoming_call() {
        let mut telephony = MockTelephonyProvider::new();
        telephony
            .expect_report_new_incoming_call()
            .withf(|_, update| {
                update.localized_caller_name == "Alice"
                    && update.remote_handle.value == "room-42"
                    && update.has_video
                    && !update.supports_holding
                    && !update.supports_dtmf
            })
            .times(1)
            .returning(|_, _| Ok(()));
        let mut harness = Harness::new(telephony);
        let observer = Arc::new(RecordingObserver::default());
        harness.observe(&observer);

        let done = push(&mut harness, PushType::Voip, PushPayload::voip("Alice", "room-42"));
        assert!(done.await.is_ok());

        let calls = harness.core.active_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].state(), CallState::Connecting);
        assert_eq!(calls[0].direction(), CallDirection::Incoming);

        harness.pump().await;
        assert_eq!(harness.core.calls.len(), 1);
        assert!(observer.events().is_empty());
    }

    #[tokio::test]
    async fn test_registration_failure_evicts_call() {
        let mut telephony = MockTelephonyProvider::new();
        telephony
            .expect_report_new_incoming_call()
            .returning(|call_id, _| Err(TelephonyError::DuplicateCall(call_id)));
        let mut harness = Harness::new(telephony);
        let observer = Arc::new(RecordingObserver::default());
        harness.observe(&observer);

        let done = push(&mut harness, PushType::Voip, PushPayload::voip("Alice", "room-42"));
        assert!(done.await.is_ok());
        assert_eq!(harness.core.calls.len(), 1);

        harness.pump().await;
        assert!(harness.core.calls.is_empty());
        assert!(observer.events().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_push_is_acknowledged_and_dropped() {
        let mut harness = Harness::new(MockTelephonyProvider::new());
        let mut payload = PushPayload::voip("Alice", "room-42");
        payload.remove(ROOM_ALIAS_KEY);

        let done = push(&mut harness, PushType::Voip, payload);
        assert!(done.await.is_ok());
        assert!(harness.core.calls.is_empty());
    }

    #[tokio::test]
    async fn test_wrong_push_type_is_acknowledged_and_ignored() {
        let mut harness = Harness::new(MockTelephonyProvider::new());

        let done = push(&mut harness, PushType::Alert, PushPayload::voip("Alice", "room-42"));
        assert!(done.await.is_ok());
        assert!(harness.core.calls.is_empty());
    }

    #[test]
    fn test_token_updates_only_for_desired_type() {
        let mut harness = Harness::new(MockTelephonyProvider::new());

        harness.core.handle(Command::Push(PushEvent::CredentialsUpdated {
            push_type: PushType::Alert,
            token: vec![0x01],
        }));
        assert_eq!(harness.core.device_registration.current(), None);

        harness.core.handle(Command::Push(PushEvent::CredentialsUpdated {
            push_type: PushType::Voip,
            token: vec![0xde, 0xad, 0xbe, 0xef],
        }));
        assert_eq!(
            harness.core.device_registration.current().unwrap().as_str(),
            "deadbeef"
        );

        harness.core.handle(Command::Push(PushEvent::TokenInvalidated {
            push_type: PushType::Background,
        }));
        assert!(harness.core.device_registration.current().is_some());

        harness.core.handle(Command::Push(PushEvent::TokenInvalidated {
            push_type: PushType::Voip,
        }));
        assert_eq!(harness.core.device_registration.current(), None);
    }
}
