//! In-process push registry and notification authorizer

use crate::domain::push::{
    AuthorizationError, AuthorizationOption, AuthorizationStatus, NotificationAuthorizer,
    PushRegistry, PushType,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::{debug, info};

/// Registry holding whatever tokens were issued before the coordinator
/// started
#[derive(Debug, Default)]
pub struct InMemoryPushRegistry {
    tokens: RwLock<HashMap<PushType, Vec<u8>>>,
}

impl InMemoryPushRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(push_type: PushType, token: impl Into<Vec<u8>>) -> Self {
        let registry = Self::new();
        registry.set_token(push_type, token);
        registry
    }

    pub fn set_token(&self, push_type: PushType, token: impl Into<Vec<u8>>) {
        let mut tokens = self.tokens.write().unwrap_or_else(|e| e.into_inner());
        tokens.insert(push_type, token.into());
    }
}

impl PushRegistry for InMemoryPushRegistry {
    fn push_token(&self, push_type: PushType) -> Option<Vec<u8>> {
        let tokens = self.tokens.read().unwrap_or_else(|e| e.into_inner());
        tokens.get(&push_type).cloned()
    }
}

/// Authorizer that answers prompts with a fixed decision
#[derive(Debug)]
pub struct InMemoryAuthorizer {
    status: RwLock<AuthorizationStatus>,
    grant: bool,
}

impl InMemoryAuthorizer {
    /// Undecided authorizer that grants when prompted
    pub fn new() -> Self {
        Self::with_status(AuthorizationStatus::NotDetermined, true)
    }

    pub fn with_status(status: AuthorizationStatus, grant: bool) -> Self {
        Self {
            status: RwLock::new(status),
            grant,
        }
    }

    pub fn set_status(&self, status: AuthorizationStatus) {
        *self.status.write().unwrap_or_else(|e| e.into_inner()) = status;
    }
}

impl Default for InMemoryAuthorizer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NotificationAuthorizer for InMemoryAuthorizer {
    async fn request_authorization(
        &self,
        options: Vec<AuthorizationOption>,
    ) -> Result<bool, AuthorizationError> {
        let mut status = self.status.write().unwrap_or_else(|e| e.into_inner());
        if *status == AuthorizationStatus::NotDetermined {
            *status = if self.grant {
                AuthorizationStatus::Authorized
            } else {
                AuthorizationStatus::Denied
            };
            info!(?options, "Push authorization prompt answered: {:?}", *status);
        } else {
            debug!("Push authorization already decided: {:?}", *status);
        }
        Ok(*status == AuthorizationStatus::Authorized)
    }

    async fn authorization_status(&self) -> AuthorizationStatus {
        *self.status.read().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_returns_token_per_type() {
        let registry = InMemoryPushRegistry::with_token(PushType::Voip, vec![0xab]);
        assert_eq!(registry.push_token(PushType::Voip), Some(vec![0xab]));
        assert_eq!(registry.push_token(PushType::Alert), None);
    }

    #[tokio::test]
    async fn test_prompt_decides_once() {
        let authorizer = InMemoryAuthorizer::with_status(AuthorizationStatus::NotDetermined, false);
        assert!(!authorizer
            .request_authorization(vec![AuthorizationOption::Alert])
            .await
            .unwrap());
        assert_eq!(authorizer.authorization_status().await, AuthorizationStatus::Denied);

        authorizer.set_status(AuthorizationStatus::Authorized);
        assert!(authorizer.request_authorization(vec![]).await.unwrap());
    }
}
