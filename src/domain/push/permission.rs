//! Push authorization state

use crate::domain::shared::observable::{ObservableValue, ValueWatcher};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Push permission as seen by the application
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionState {
    /// Status has not been read yet, or the OS reported something unrecognized
    #[default]
    Unknown,
    /// The user has not been asked yet
    Undecided,
    Allowed,
    Disabled,
}

impl fmt::Display for PermissionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PermissionState::Unknown => "unknown",
            PermissionState::Undecided => "undecided",
            PermissionState::Allowed => "allowed",
            PermissionState::Disabled => "disabled",
        };
        f.write_str(name)
    }
}

/// Authorization status as reported by the OS notification center
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorizationStatus {
    NotDetermined,
    Denied,
    Authorized,
    Provisional,
    Ephemeral,
    /// A status this build does not know about
    #[serde(other)]
    Unrecognized,
}

impl From<AuthorizationStatus> for PermissionState {
    fn from(status: AuthorizationStatus) -> Self {
        match status {
            AuthorizationStatus::Authorized
            | AuthorizationStatus::Provisional
            | AuthorizationStatus::Ephemeral => PermissionState::Allowed,
            AuthorizationStatus::Denied => PermissionState::Disabled,
            AuthorizationStatus::NotDetermined => PermissionState::Undecided,
            AuthorizationStatus::Unrecognized => PermissionState::Unknown,
        }
    }
}

/// Presentation options requested together with authorization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthorizationOption {
    Badge,
    Alert,
    Sound,
}

/// Current push permission, observable
#[derive(Debug, Default)]
pub struct PermissionTracker {
    state: ObservableValue<PermissionState>,
}

impl PermissionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> PermissionState {
        self.state.current()
    }

    pub(crate) fn update(&self, state: PermissionState) -> bool {
        self.state.set(state)
    }

    pub fn watcher(&self) -> ValueWatcher<PermissionState> {
        self.state.watcher()
    }
}
