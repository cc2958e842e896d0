//! Telephony bounded context - the native call subsystem boundary

pub mod action;
pub mod port;

pub use action::{ActionOutcome, ActionResponder, ProviderAction, ProviderActionKind, ProviderEvent};
pub use port::{
    CallHandle, HandleType, IncomingCallUpdate, StartCallRequest, TelephonyError,
    TelephonyProvider,
};

#[cfg(test)]
pub use port::MockTelephonyProvider;
