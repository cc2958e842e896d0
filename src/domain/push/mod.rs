//! Push bounded context - push payloads, device registration and permissions

pub mod delivery;
pub mod payload;
pub mod permission;
pub mod port;
pub mod registration;

pub use delivery::{PushCompletion, PushEvent};
pub use payload::{IncomingCallRequest, PushError, PushPayload, PushType};
pub use permission::{AuthorizationOption, AuthorizationStatus, PermissionState, PermissionTracker};
pub use port::{AuthorizationError, NotificationAuthorizer, PushRegistry};
pub use registration::DeviceRegistration;

#[cfg(test)]
pub use port::{MockNotificationAuthorizer, MockPushRegistry};
