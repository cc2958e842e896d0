//! Ports onto the push subsystem and the OS notification center

use crate::domain::push::payload::PushType;
use crate::domain::push::permission::{AuthorizationOption, AuthorizationStatus};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthorizationError {
    #[error("Authorization request failed: {0}")]
    RequestFailed(String),

    #[error("Notification center unavailable")]
    Unavailable,
}

/// Source of the token the push subsystem already holds at startup
#[cfg_attr(test, mockall::automock)]
pub trait PushRegistry: Send + Sync {
    /// Raw token bytes for `push_type`, if one was issued
    fn push_token(&self, push_type: PushType) -> Option<Vec<u8>>;
}

/// OS notification authorization
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationAuthorizer: Send + Sync {
    /// Prompt for authorization; resolves to whether it was granted
    async fn request_authorization(
        &self,
        options: Vec<AuthorizationOption>,
    ) -> Result<bool, AuthorizationError>;

    /// Current authorization status without prompting
    async fn authorization_status(&self) -> AuthorizationStatus;
}
