//! Messages processed by the coordinator task

use crate::application::coordinator::observer_registry::ObserverKey;
use crate::domain::call::{Call, CallObserver, EndReason};
use crate::domain::push::{PermissionState, PushEvent};
use crate::domain::shared::value_objects::CallId;
use crate::domain::telephony::{ProviderEvent, TelephonyError};
use std::sync::Weak;
use tokio::sync::oneshot;

/// Every mutation and query goes through one of these, in arrival order
pub(crate) enum Command {
    AddObserver {
        key: ObserverKey,
        observer: Weak<dyn CallObserver>,
    },
    RemoveObserver {
        key: ObserverKey,
    },
    StartCall {
        destination: String,
    },
    ReportCallConcluded {
        call_id: CallId,
        reason: EndReason,
    },
    RequestPermission,
    RefreshPermission,
    Push(PushEvent),
    Provider(ProviderEvent),

    // Completions of native requests, re-posted from their tasks
    IncomingCallReported {
        call_id: CallId,
        result: Result<(), TelephonyError>,
    },
    StartCallRequested {
        call_id: CallId,
        destination: String,
        result: Result<(), TelephonyError>,
    },
    PermissionResolved(PermissionState),

    // Queries
    ActiveCalls(oneshot::Sender<Vec<Call>>),
    GetCall {
        call_id: CallId,
        reply: oneshot::Sender<Option<Call>>,
    },
    Shutdown(oneshot::Sender<()>),
}

impl Command {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            Command::AddObserver { .. } => "add_observer",
            Command::RemoveObserver { .. } => "remove_observer",
            Command::StartCall { .. } => "start_call",
            Command::ReportCallConcluded { .. } => "report_call_concluded",
            Command::RequestPermission => "request_permission",
            Command::RefreshPermission => "refresh_permission",
            Command::Push(_) => "push",
            Command::Provider(_) => "provider",
            Command::IncomingCallReported { .. } => "incoming_call_reported",
            Command::StartCallRequested { .. } => "start_call_requested",
            Command::PermissionResolved(_) => "permission_resolved",
            Command::ActiveCalls(_) => "active_calls",
            Command::GetCall { .. } => "get_call",
            Command::Shutdown(_) => "shutdown",
        }
    }
}
