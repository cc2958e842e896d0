//! Port onto the native telephony subsystem

use crate::domain::call::value_object::EndReason;
use crate::domain::shared::value_objects::CallId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Kind of value carried by a [`CallHandle`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandleType {
    Generic,
    PhoneNumber,
    EmailAddress,
}

/// Address the native subsystem shows for a call
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallHandle {
    pub kind: HandleType,
    pub value: String,
}

impl CallHandle {
    pub fn generic(value: impl Into<String>) -> Self {
        Self {
            kind: HandleType::Generic,
            value: value.into(),
        }
    }
}

/// Metadata used to surface an incoming call in the system UI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomingCallUpdate {
    pub remote_handle: CallHandle,
    pub localized_caller_name: String,
    pub has_video: bool,
    pub supports_holding: bool,
    pub supports_dtmf: bool,
    pub supports_grouping: bool,
    pub supports_ungrouping: bool,
}

impl IncomingCallUpdate {
    /// Update for a room call: generic handle, no holding, DTMF or grouping
    pub fn for_room(room_alias: &str, caller: &str, has_video: bool) -> Self {
        Self {
            remote_handle: CallHandle::generic(room_alias),
            localized_caller_name: caller.to_string(),
            has_video,
            supports_holding: false,
            supports_dtmf: false,
            supports_grouping: false,
            supports_ungrouping: false,
        }
    }
}

/// Request to place an outgoing call through the native subsystem
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartCallRequest {
    pub call_id: CallId,
    pub handle: CallHandle,
    pub is_video: bool,
}

/// Rejections reported by the native subsystem
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TelephonyError {
    #[error("Unknown call: {0}")]
    UnknownCall(CallId),

    #[error("Call already reported: {0}")]
    DuplicateCall(CallId),

    #[error("Maximum number of call groups reached")]
    MaximumCallGroupsReached,

    #[error("Provider has been invalidated")]
    Invalidated,

    #[error("Request rejected: {0}")]
    Rejected(String),
}

/// Native telephony subsystem, as consumed by the coordinator.
///
/// The async methods resolve when the subsystem has decided; the coordinator
/// never blocks on them.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TelephonyProvider: Send + Sync {
    /// Ask the subsystem to surface an incoming call
    async fn report_new_incoming_call(
        &self,
        call_id: CallId,
        update: IncomingCallUpdate,
    ) -> Result<(), TelephonyError>;

    /// Ask the subsystem to start an outgoing call. On success the subsystem
    /// follows up with a start action for the same identity.
    async fn request_start_call(&self, request: StartCallRequest) -> Result<(), TelephonyError>;

    /// Tell the subsystem a call concluded outside of a provider action
    fn report_call_ended(&self, call_id: CallId, reason: EndReason) -> Result<(), TelephonyError>;

    /// Tear the provider down; no further actions will be delivered
    fn invalidate(&self);
}
