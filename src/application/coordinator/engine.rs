//! Coordinator state and its single mutation path
//!
//! `CoordinatorCore` owns the active-call table, the observer registry and
//! the writable side of both trackers. It runs as one task; everything else
//! reaches it through [`Command`]s, so mutations never interleave. Native
//! requests are awaited on spawned tasks whose results come back as
//! commands as well.

use crate::application::coordinator::command::Command;
use crate::application::coordinator::observer_registry::{ObserverKey, ObserverRegistry};
use crate::config::Config;
use crate::domain::call::{Call, CallDirection, CallEvent, CallObserver, CallState, EndReason};
use crate::domain::push::{
    DeviceRegistration, NotificationAuthorizer, PermissionState, PermissionTracker,
};
use crate::domain::shared::value_objects::CallId;
use crate::domain::telephony::{CallHandle, StartCallRequest, TelephonyError, TelephonyProvider};
use crate::infrastructure::metrics;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Weak};
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

pub(crate) struct CoordinatorCore {
    pub(super) config: Config,
    /// Active-call table, the single source of truth for call state
    pub(super) calls: HashMap<CallId, Call>,
    pub(super) observers: ObserverRegistry,
    pub(super) device_registration: DeviceRegistration,
    pub(super) permissions: PermissionTracker,
    pub(super) telephony: Arc<dyn TelephonyProvider>,
    authorizer: Arc<dyn NotificationAuthorizer>,
    /// Weak so that the queue closes once every handle is gone
    commands: mpsc::WeakUnboundedSender<Command>,
}

impl CoordinatorCore {
    pub(crate) fn new(
        config: Config,
        telephony: Arc<dyn TelephonyProvider>,
        authorizer: Arc<dyn NotificationAuthorizer>,
        device_registration: DeviceRegistration,
        permissions: PermissionTracker,
        commands: mpsc::WeakUnboundedSender<Command>,
    ) -> Self {
        Self {
            config,
            calls: HashMap::new(),
            observers: ObserverRegistry::new(),
            device_registration,
            permissions,
            telephony,
            authorizer,
            commands,
        }
    }

    /// Process commands until shutdown or until every handle is dropped
    pub(crate) async fn run(mut self, mut rx: mpsc::UnboundedReceiver<Command>) {
        info!("Call coordinator started");

        while let Some(command) = rx.recv().await {
            trace!(command = command.name(), "Processing command");
            if let Command::Shutdown(done) = command {
                self.shutdown();
                let _ = done.send(());
                return;
            }
            self.handle(command);
        }

        self.shutdown();
    }

    pub(crate) fn handle(&mut self, command: Command) {
        match command {
            Command::AddObserver { key, observer } => self.add_observer(key, observer),
            Command::RemoveObserver { key } => {
                if !self.observers.remove(key) {
                    debug!("Observer was not registered");
                }
            }
            Command::StartCall { destination } => self.start_call(destination),
            Command::ReportCallConcluded { call_id, reason } => {
                self.report_call_concluded(call_id, reason)
            }
            Command::RequestPermission => self.request_permission(),
            Command::RefreshPermission => self.refresh_permission(),
            Command::Push(event) => self.handle_push_event(event),
            Command::Provider(event) => self.handle_provider_event(event),
            Command::IncomingCallReported { call_id, result } => {
                self.on_incoming_call_reported(call_id, result)
            }
            Command::StartCallRequested {
                call_id,
                destination,
                result,
            } => self.on_start_call_requested(call_id, &destination, result),
            Command::PermissionResolved(state) => self.on_permission_resolved(state),
            Command::ActiveCalls(reply) => {
                let _ = reply.send(self.active_calls());
            }
            Command::GetCall { call_id, reply } => {
                let _ = reply.send(self.calls.get(&call_id).cloned());
            }
            Command::Shutdown(done) => {
                self.shutdown();
                let _ = done.send(());
            }
        }
    }

    fn shutdown(&mut self) {
        info!(
            "Call coordinator stopping with {} active call(s)",
            self.calls.len()
        );
        self.telephony.invalidate();
    }

    /// Await a native request off the coordinator task and feed its outcome
    /// back through the queue
    pub(super) fn spawn_native<F>(&self, request: F)
    where
        F: Future<Output = Command> + Send + 'static,
    {
        let Some(commands) = self.commands.upgrade() else {
            debug!("Coordinator is stopping, native request not issued");
            return;
        };
        tokio::spawn(async move {
            let completion = request.await;
            if commands.send(completion).is_err() {
                debug!("Coordinator stopped before native request completed");
            }
        });
    }

    pub(super) fn notify(&mut self, event: CallEvent) {
        let delivered = self.observers.notify(&event);
        debug!(
            event = event.event_type(),
            call_id = ?event.call_id(),
            delivered,
            "Notified call observers"
        );
    }

    pub(super) fn calls_changed(&self) {
        metrics::update_active_calls(self.calls.len());
    }

    /// Snapshot of the active-call table, oldest first
    pub(crate) fn active_calls(&self) -> Vec<Call> {
        let mut calls: Vec<Call> = self.calls.values().cloned().collect();
        calls.sort_by_key(|call| *call.created_at());
        calls
    }

    fn add_observer(&mut self, key: ObserverKey, observer: Weak<dyn CallObserver>) {
        let Some(strong) = observer.upgrade() else {
            debug!("Observer dropped before it could be registered");
            return;
        };
        if !self.observers.insert(key, observer) {
            debug!("Observer already registered");
            return;
        }
        debug!("Observer registered ({} slot(s))", self.observers.len());

        // Catch up on outgoing calls whose "initiated" already fired
        let pending: Vec<Call> = self
            .active_calls()
            .into_iter()
            .filter(|call| {
                call.direction() == CallDirection::Outgoing
                    && call.state() == CallState::Connecting
            })
            .collect();
        for call in &pending {
            debug!("Replaying initiated call {} to new observer", call.id());
            strong.on_call_initiated(call);
        }
    }

    fn start_call(&mut self, destination: String) {
        let call_id = CallId::new();
        let request = StartCallRequest {
            call_id,
            handle: CallHandle::generic(destination.clone()),
            is_video: self.config.provider.supports_video,
        };
        info!("Requesting outgoing call {} to {}", call_id, destination);

        let telephony = self.telephony.clone();
        self.spawn_native(async move {
            let result = telephony.request_start_call(request).await;
            Command::StartCallRequested {
                call_id,
                destination,
                result,
            }
        });
    }

    fn on_start_call_requested(
        &mut self,
        call_id: CallId,
        destination: &str,
        result: Result<(), TelephonyError>,
    ) {
        match result {
            Ok(()) => debug!("Native subsystem accepted outgoing call {}", call_id),
            Err(e) => {
                warn!(
                    "Native subsystem rejected outgoing call {} to {}: {}",
                    call_id, destination, e
                );
                if let Some(mut call) = self.calls.remove(&call_id) {
                    call.conclude(CallState::Failed);
                    self.calls_changed();
                }
            }
        }
    }

    fn report_call_concluded(&mut self, call_id: CallId, reason: EndReason) {
        if let Err(e) = self.telephony.report_call_ended(call_id, reason) {
            warn!(
                "Failed to report call {} as {}: {}",
                call_id,
                reason.as_str(),
                e
            );
        }

        match self.calls.remove(&call_id) {
            Some(mut call) => {
                call.conclude(reason.terminal_state());
                info!(
                    "Call {} concluded ({}), now {}",
                    call_id,
                    reason.as_str(),
                    call.state().as_str()
                );
                metrics::record_call_concluded(reason.as_str());
                self.calls_changed();
            }
            None => debug!("Concluded call {} was not in the active-call table", call_id),
        }
    }

    fn request_permission(&self) {
        let authorizer = self.authorizer.clone();
        let options = self.config.permissions.options.clone();
        self.spawn_native(async move {
            match authorizer.request_authorization(options).await {
                Ok(granted) => debug!(granted, "Push authorization request finished"),
                Err(e) => warn!("Failed to request push authorization: {}", e),
            }
            Command::PermissionResolved(authorizer.authorization_status().await.into())
        });
    }

    fn refresh_permission(&self) {
        let authorizer = self.authorizer.clone();
        self.spawn_native(async move {
            Command::PermissionResolved(authorizer.authorization_status().await.into())
        });
    }

    fn on_permission_resolved(&mut self, state: PermissionState) {
        if self.permissions.update(state) {
            info!("Push permission is now {}", state);
        }
    }
}
