//! Call coordinator
//!
//! Bridges three external collaborators (push delivery, the native
//! telephony subsystem and the OS notification center) to application
//! observers. All state lives in one task; [`CallCoordinator`] handles and
//! the [`PushSink`]/[`ProviderSink`] entry points only post commands to it.

mod command;
mod engine;
mod observer_registry;
mod provider_actions;
mod push_bridge;
mod sinks;

pub use sinks::{ProviderSink, PushSink};

use crate::config::Config;
use crate::domain::call::{Call, CallObserver, EndReason};
use crate::domain::invocation::ExternalInvocation;
use crate::domain::push::{
    DeviceRegistration, NotificationAuthorizer, PermissionState, PermissionTracker, PushRegistry,
};
use crate::domain::shared::observable::ValueWatcher;
use crate::domain::shared::value_objects::{CallId, DeviceToken};
use crate::domain::telephony::TelephonyProvider;
use crate::infrastructure::push::{InMemoryAuthorizer, InMemoryPushRegistry};
use command::Command;
use engine::CoordinatorCore;
use observer_registry::ObserverKey;
use std::sync::{Arc, Weak};
use tokio::sync::{mpsc, oneshot};
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, info, warn};

/// Assembles a coordinator. The sinks are available before [`spawn`], so a
/// telephony provider that needs its [`ProviderSink`] can be built first.
///
/// [`spawn`]: CoordinatorBuilder::spawn
pub struct CoordinatorBuilder {
    config: Config,
    tx: mpsc::UnboundedSender<Command>,
    rx: mpsc::UnboundedReceiver<Command>,
    push_registry: Option<Arc<dyn PushRegistry>>,
    authorizer: Option<Arc<dyn NotificationAuthorizer>>,
}

impl CoordinatorBuilder {
    pub fn new(config: Config) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            config,
            tx,
            rx,
            push_registry: None,
            authorizer: None,
        }
    }

    pub fn provider_sink(&self) -> ProviderSink {
        ProviderSink::new(self.tx.downgrade())
    }

    pub fn push_sink(&self) -> PushSink {
        PushSink::new(self.tx.downgrade())
    }

    pub fn with_push_registry(mut self, registry: Arc<dyn PushRegistry>) -> Self {
        self.push_registry = Some(registry);
        self
    }

    pub fn with_authorizer(mut self, authorizer: Arc<dyn NotificationAuthorizer>) -> Self {
        self.authorizer = Some(authorizer);
        self
    }

    /// Start the coordinator task. Must be called within a tokio runtime.
    pub fn spawn(self, telephony: Arc<dyn TelephonyProvider>) -> CallCoordinator {
        let push_registry = self
            .push_registry
            .unwrap_or_else(|| Arc::new(InMemoryPushRegistry::new()));
        let authorizer = self
            .authorizer
            .unwrap_or_else(|| Arc::new(InMemoryAuthorizer::new()));

        let desired = self.config.push.desired_push_type;
        let initial_token = push_registry
            .push_token(desired)
            .map(|bytes| DeviceToken::from_bytes(&bytes));
        if let Some(token) = &initial_token {
            info!("Push registry already holds a {} token: {}", desired, token);
        }

        let device_registration = DeviceRegistration::new(initial_token);
        let permissions = PermissionTracker::new();
        let coordinator = CallCoordinator {
            commands: self.tx.clone(),
            device_token: device_registration.watcher(),
            permission: permissions.watcher(),
        };

        let initial_permission = if self.config.permissions.request_on_start {
            Command::RequestPermission
        } else {
            Command::RefreshPermission
        };

        let core = CoordinatorCore::new(
            self.config,
            telephony,
            authorizer,
            device_registration,
            permissions,
            self.tx.downgrade(),
        );
        coordinator.send(initial_permission);
        tokio::spawn(core.run(self.rx));

        coordinator
    }
}

/// Handle onto a running coordinator. Cloning is cheap; the coordinator
/// stops once every handle is dropped or [`shutdown`] is called.
///
/// [`shutdown`]: CallCoordinator::shutdown
#[derive(Clone)]
pub struct CallCoordinator {
    commands: mpsc::UnboundedSender<Command>,
    device_token: ValueWatcher<Option<DeviceToken>>,
    permission: ValueWatcher<PermissionState>,
}

impl CallCoordinator {
    /// Register an observer. The coordinator keeps only a weak reference;
    /// registering the same observer twice has no further effect.
    pub fn add_observer<O: CallObserver + 'static>(&self, observer: &Arc<O>) {
        let weak = Arc::downgrade(observer) as Weak<dyn CallObserver>;
        self.send(Command::AddObserver {
            key: ObserverKey::of(observer),
            observer: weak,
        });
    }

    pub fn remove_observer<O: ?Sized>(&self, observer: &Arc<O>) {
        self.send(Command::RemoveObserver {
            key: ObserverKey::of(observer),
        });
    }

    /// Place a call to the first contact of `invocation`. Invocations
    /// without a usable handle are ignored.
    pub fn start_call_from_external_invocation(&self, invocation: &ExternalInvocation) {
        match invocation.destination() {
            Some(destination) => self.start_call_manually(destination),
            None => debug!("Ignoring invocation without a destination: {:?}", invocation),
        }
    }

    /// Ask the native subsystem to start a call to `destination`. The call
    /// joins the table only once the subsystem performs the start action.
    pub fn start_call_manually(&self, destination: impl Into<String>) {
        self.send(Command::StartCall {
            destination: destination.into(),
        });
    }

    pub fn report_call_failed(&self, call: &Call) {
        self.report_concluded(call, EndReason::Failed);
    }

    pub fn report_call_ended(&self, call: &Call) {
        self.report_concluded(call, EndReason::RemoteEnded);
    }

    pub fn report_call_answered_elsewhere(&self, call: &Call) {
        self.report_concluded(call, EndReason::AnsweredElsewhere);
    }

    pub fn report_call_declined(&self, call: &Call) {
        self.report_concluded(call, EndReason::DeclinedElsewhere);
    }

    fn report_concluded(&self, call: &Call, reason: EndReason) {
        self.send(Command::ReportCallConcluded {
            call_id: *call.id(),
            reason,
        });
    }

    /// Latest push token, hex encoded
    pub fn device_token(&self) -> Option<DeviceToken> {
        self.device_token.current()
    }

    /// Stream of token changes, starting with the current value
    pub fn subscribe_device_token(&self) -> WatchStream<Option<DeviceToken>> {
        self.device_token.subscribe()
    }

    pub fn permission_state(&self) -> PermissionState {
        self.permission.current()
    }

    pub fn subscribe_permission_state(&self) -> WatchStream<PermissionState> {
        self.permission.subscribe()
    }

    /// Prompt for push authorization, then re-read the resulting status
    pub fn request_permission(&self) {
        self.send(Command::RequestPermission);
    }

    pub fn refresh_permission(&self) {
        self.send(Command::RefreshPermission);
    }

    /// Snapshot of the active-call table, oldest first
    pub async fn active_calls(&self) -> Vec<Call> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::ActiveCalls(reply));
        rx.await.unwrap_or_default()
    }

    pub async fn call(&self, call_id: CallId) -> Option<Call> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::GetCall { call_id, reply });
        rx.await.ok().flatten()
    }

    pub fn push_sink(&self) -> PushSink {
        PushSink::new(self.commands.downgrade())
    }

    pub fn provider_sink(&self) -> ProviderSink {
        ProviderSink::new(self.commands.downgrade())
    }

    /// Stop the coordinator and invalidate the telephony provider
    pub async fn shutdown(&self) {
        let (done, rx) = oneshot::channel();
        self.send(Command::Shutdown(done));
        if rx.await.is_err() {
            debug!("Call coordinator was already stopped");
        }
    }

    fn send(&self, command: Command) {
        let name = command.name();
        if self.commands.send(command).is_err() {
            warn!("Call coordinator is stopped, {} dropped", name);
        }
    }
}
