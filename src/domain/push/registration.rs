//! Device registration tracking

use crate::domain::shared::observable::{ObservableValue, ValueWatcher};
use crate::domain::shared::value_objects::DeviceToken;

/// Latest push-routing token. `None` means no token has been issued or the
/// last one was invalidated.
#[derive(Debug)]
pub struct DeviceRegistration {
    token: ObservableValue<Option<DeviceToken>>,
}

impl DeviceRegistration {
    pub fn new(initial: Option<DeviceToken>) -> Self {
        Self {
            token: ObservableValue::new(initial),
        }
    }

    pub fn current(&self) -> Option<DeviceToken> {
        self.token.current()
    }

    /// Record a freshly issued token; returns `true` if it differs from the
    /// previous one
    pub(crate) fn update(&self, token: DeviceToken) -> bool {
        self.token.set(Some(token))
    }

    pub(crate) fn invalidate(&self) -> bool {
        self.token.set(None)
    }

    pub fn watcher(&self) -> ValueWatcher<Option<DeviceToken>> {
        self.token.watcher()
    }
}

impl Default for DeviceRegistration {
    fn default() -> Self {
        Self::new(None)
    }
}
