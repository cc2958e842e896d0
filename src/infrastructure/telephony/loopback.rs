//! In-process telephony provider
//!
//! Stands in for the platform call UI: it enforces the provider limits from
//! [`ProviderConfig`], turns start requests into start actions, and exposes
//! the user gestures (answer, end, mute) the system UI would produce.

use crate::application::ProviderSink;
use crate::config::ProviderConfig;
use crate::domain::call::EndReason;
use crate::domain::shared::value_objects::CallId;
use crate::domain::telephony::{
    ActionOutcome, CallHandle, IncomingCallUpdate, ProviderAction, StartCallRequest,
    TelephonyError, TelephonyProvider,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
struct LoopbackCall {
    handle: CallHandle,
    caller: Option<String>,
}

#[derive(Default)]
struct LoopbackState {
    calls: HashMap<CallId, LoopbackCall>,
    recents: Vec<CallId>,
    rejected: usize,
    invalidated: bool,
}

pub struct LoopbackTelephony {
    config: ProviderConfig,
    sink: ProviderSink,
    state: Mutex<LoopbackState>,
}

impl LoopbackTelephony {
    pub fn new(config: ProviderConfig, sink: ProviderSink) -> Self {
        debug!(
            recents = config.includes_calls_in_recents,
            video = config.supports_video,
            call_groups = config.maximum_call_groups,
            calls_per_group = config.maximum_calls_per_call_group,
            "Configuring loopback telephony provider"
        );
        Self {
            config,
            sink,
            state: Mutex::new(LoopbackState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, LoopbackState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Admit a new call into the provider's table
    fn admit(&self, call_id: CallId, call: LoopbackCall) -> Result<(), TelephonyError> {
        let mut state = self.state();
        let result = self.check_admission(&state, call_id, &call);
        match &result {
            Ok(()) => {
                state.calls.insert(call_id, call);
            }
            Err(e) => {
                state.rejected += 1;
                debug!("Provider refused call {}: {}", call_id, e);
            }
        }
        result
    }

    fn check_admission(
        &self,
        state: &LoopbackState,
        call_id: CallId,
        call: &LoopbackCall,
    ) -> Result<(), TelephonyError> {
        if !self.config.supported_handle_types.contains(&call.handle.kind) {
            return Err(TelephonyError::Rejected(format!(
                "unsupported handle type {:?}",
                call.handle.kind
            )));
        }
        if state.invalidated {
            return Err(TelephonyError::Invalidated);
        }
        if state.calls.contains_key(&call_id) {
            return Err(TelephonyError::DuplicateCall(call_id));
        }
        // Grouping is unsupported, so every call is its own group of one
        if self.config.maximum_calls_per_call_group == 0
            || state.calls.len() >= self.config.maximum_call_groups
        {
            return Err(TelephonyError::MaximumCallGroupsReached);
        }
        Ok(())
    }

    /// Drop `call_id` from the table, keeping it in recents when configured
    fn forget(&self, call_id: CallId) -> Option<LoopbackCall> {
        let mut state = self.state();
        let call = state.calls.remove(&call_id)?;
        if self.config.includes_calls_in_recents {
            state.recents.push(call_id);
        }
        Some(call)
    }

    /// Calls the provider currently knows about
    pub fn call_count(&self) -> usize {
        self.state().calls.len()
    }

    pub fn is_invalidated(&self) -> bool {
        self.state().invalidated
    }

    /// Calls the provider refused to admit
    pub fn rejected_count(&self) -> usize {
        self.state().rejected
    }

    /// Concluded calls shown in the system call history, oldest first
    pub fn recents(&self) -> Vec<CallId> {
        self.state().recents.clone()
    }

    /// The user answered `call_id` from the system UI
    pub fn answer(&self, call_id: CallId) -> oneshot::Receiver<ActionOutcome> {
        let (action, outcome) = ProviderAction::answer(call_id);
        self.sink.perform(action);
        outcome
    }

    /// The user hung up `call_id` from the system UI
    pub fn end(&self, call_id: CallId) -> oneshot::Receiver<ActionOutcome> {
        if self.forget(call_id).is_none() {
            debug!("Ending call {} unknown to the provider", call_id);
        }
        let (action, outcome) = ProviderAction::end(call_id);
        self.sink.perform(action);
        outcome
    }

    /// The user toggled mute for `call_id` from the system UI
    pub fn set_muted(&self, call_id: CallId, muted: bool) -> oneshot::Receiver<ActionOutcome> {
        let (action, outcome) = ProviderAction::set_muted(call_id, muted);
        self.sink.perform(action);
        outcome
    }

    /// Drop every call, as the platform does when its daemon restarts
    pub fn reset(&self) {
        let dropped = std::mem::take(&mut self.state().calls);
        info!("Provider reset, dropping {} call(s)", dropped.len());
        self.sink.did_reset();
    }

    pub fn activate_audio_session(&self) {
        self.sink.did_activate_audio_session();
    }

    pub fn deactivate_audio_session(&self) {
        self.sink.did_deactivate_audio_session();
    }
}

#[async_trait]
impl TelephonyProvider for LoopbackTelephony {
    async fn report_new_incoming_call(
        &self,
        call_id: CallId,
        update: IncomingCallUpdate,
    ) -> Result<(), TelephonyError> {
        self.admit(
            call_id,
            LoopbackCall {
                handle: update.remote_handle,
                caller: Some(update.localized_caller_name),
            },
        )?;
        info!("Showing incoming call {} (video: {})", call_id, update.has_video);
        Ok(())
    }

    async fn request_start_call(&self, request: StartCallRequest) -> Result<(), TelephonyError> {
        let call_id = request.call_id;
        self.admit(
            call_id,
            LoopbackCall {
                handle: request.handle.clone(),
                caller: None,
            },
        )?;

        let (action, outcome) = ProviderAction::start(call_id, request.handle, request.is_video);
        self.sink.perform(action);

        match outcome.await {
            Ok(ActionOutcome::Fulfilled) => {
                debug!("Start action for call {} fulfilled", call_id);
                Ok(())
            }
            Ok(ActionOutcome::Failed) | Err(_) => {
                self.state().calls.remove(&call_id);
                Err(TelephonyError::Rejected(format!(
                    "start action for call {} failed",
                    call_id
                )))
            }
        }
    }

    fn report_call_ended(&self, call_id: CallId, reason: EndReason) -> Result<(), TelephonyError> {
        match self.forget(call_id) {
            Some(call) => {
                info!(
                    "Call {} to {} ended ({}), caller: {}",
                    call_id,
                    call.handle.value,
                    reason.as_str(),
                    call.caller.as_deref().unwrap_or("-")
                );
                Ok(())
            }
            None => Err(TelephonyError::UnknownCall(call_id)),
        }
    }

    fn invalidate(&self) {
        let mut state = self.state();
        if !state.calls.is_empty() {
            warn!("Provider invalidated with {} call(s)", state.calls.len());
        }
        state.calls.clear();
        state.invalidated = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::CoordinatorBuilder;
    use crate::config::Config;
    use crate::domain::telephony::HandleType;

    /// Provider whose sink leads nowhere
    fn detached(config: ProviderConfig) -> LoopbackTelephony {
        let sink = CoordinatorBuilder::new(Config::default()).provider_sink();
        LoopbackTelephony::new(config, sink)
    }

    fn update(room: &str) -> IncomingCallUpdate {
        IncomingCallUpdate::for_room(room, "Alice", true)
    }

    #[tokio::test]
    async fn test_rejects_duplicate_call() {
        let provider = detached(ProviderConfig::default());
        let call_id = CallId::new();

        provider.report_new_incoming_call(call_id, update("room-1")).await.unwrap();
        assert_eq!(
            provider.report_new_incoming_call(call_id, update("room-1")).await,
            Err(TelephonyError::DuplicateCall(call_id))
        );
    }

    #[tokio::test]
    async fn test_enforces_maximum_call_groups() {
        let provider = detached(ProviderConfig {
            maximum_call_groups: 1,
            ..ProviderConfig::default()
        });

        provider.report_new_incoming_call(CallId::new(), update("room-1")).await.unwrap();
        assert_eq!(
            provider.report_new_incoming_call(CallId::new(), update("room-2")).await,
            Err(TelephonyError::MaximumCallGroupsReached)
        );
        assert_eq!(provider.call_count(), 1);
        assert_eq!(provider.rejected_count(), 1);
    }

    #[tokio::test]
    async fn test_zero_calls_per_group_admits_nothing() {
        let provider = detached(ProviderConfig {
            maximum_calls_per_call_group: 0,
            ..ProviderConfig::default()
        });

        assert_eq!(
            provider.report_new_incoming_call(CallId::new(), update("room-1")).await,
            Err(TelephonyError::MaximumCallGroupsReached)
        );
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_concluded_calls_join_recents_when_enabled() {
        let provider = detached(ProviderConfig {
            includes_calls_in_recents: true,
            ..ProviderConfig::default()
        });
        let first = CallId::new();
        let second = CallId::new();
        provider.report_new_incoming_call(first, update("room-1")).await.unwrap();
        provider.report_new_incoming_call(second, update("room-2")).await.unwrap();

        provider.report_call_ended(second, EndReason::Failed).unwrap();
        drop(provider.end(first));
        // Unknown calls never reach recents
        drop(provider.end(CallId::new()));

        assert_eq!(provider.recents(), vec![second, first]);
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_recents_stay_empty_when_disabled() {
        let provider = detached(ProviderConfig {
            includes_calls_in_recents: false,
            ..ProviderConfig::default()
        });
        let call_id = CallId::new();
        provider.report_new_incoming_call(call_id, update("room-1")).await.unwrap();

        provider.report_call_ended(call_id, EndReason::RemoteEnded).unwrap();
        assert!(provider.recents().is_empty());
    }

    #[tokio::test]
    async fn test_rejects_unsupported_handle_type() {
        let provider = detached(ProviderConfig::default());
        let mut update = update("room-1");
        update.remote_handle.kind = HandleType::PhoneNumber;

        let result = provider.report_new_incoming_call(CallId::new(), update).await;
        assert!(matches!(result, Err(TelephonyError::Rejected(_))));
    }

    #[tokio::test]
    async fn test_report_call_ended_and_invalidate() {
        let provider = detached(ProviderConfig::default());
        let call_id = CallId::new();
        provider.report_new_incoming_call(call_id, update("room-1")).await.unwrap();

        assert!(provider.report_call_ended(call_id, EndReason::RemoteEnded).is_ok());
        assert_eq!(
            provider.report_call_ended(call_id, EndReason::RemoteEnded),
            Err(TelephonyError::UnknownCall(call_id))
        );

        provider.invalidate();
        assert!(provider.is_invalidated());
        assert_eq!(
            provider.report_new_incoming_call(CallId::new(), update("room-2")).await,
            Err(TelephonyError::Invalidated)
        );
    }

    #[tokio::test]
    async fn test_start_request_fails_without_coordinator() {
        let provider = detached(ProviderConfig::default());
        let request = StartCallRequest {
            call_id: CallId::new(),
            handle: CallHandle::generic("room-7"),
            is_video: false,
        };

        let result = provider.request_start_call(request).await;
        assert!(matches!(result, Err(TelephonyError::Rejected(_))));
        assert_eq!(provider.call_count(), 0);
    }
}
