//! Platform-level "call this contact" requests
//!
//! Tapping a record in the system's recent-calls list, or asking a voice
//! assistant to place a call, reaches the application as an invocation that
//! names one or more contacts. Legacy video/audio variants still show up
//! even on current platforms, so all three are accepted.

use serde::{Deserialize, Serialize};

/// Contact named by an invocation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationContact {
    #[serde(default)]
    pub display_name: Option<String>,
    /// Handle value, the room alias for calls placed by this application
    #[serde(default)]
    pub handle: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum ExternalInvocation {
    StartCall {
        #[serde(default)]
        contacts: Vec<InvocationContact>,
    },
    StartVideoCall {
        #[serde(default)]
        contacts: Vec<InvocationContact>,
    },
    StartAudioCall {
        #[serde(default)]
        contacts: Vec<InvocationContact>,
    },
    /// Any invocation that cannot start a call
    #[serde(other)]
    Unsupported,
}

impl ExternalInvocation {
    pub fn contacts(&self) -> &[InvocationContact] {
        match self {
            ExternalInvocation::StartCall { contacts }
            | ExternalInvocation::StartVideoCall { contacts }
            | ExternalInvocation::StartAudioCall { contacts } => contacts,
            ExternalInvocation::Unsupported => &[],
        }
    }

    /// Handle of the first contact, if it has one
    pub fn destination(&self) -> Option<&str> {
        self.contacts()
            .first()
            .and_then(|contact| contact.handle.as_deref())
    }
}
