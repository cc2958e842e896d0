//! Push payloads delivered by the push subsystem

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;
use thiserror::Error;

/// Key carrying the caller display name
pub const CALLER_KEY: &str = "caller";
/// Key carrying the room/destination alias
pub const ROOM_ALIAS_KEY: &str = "roomAlias";

/// Push class as reported by the push subsystem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PushType {
    /// Voice-over-IP wake push, the only class that can surface a call
    Voip,
    Alert,
    Background,
    Complication,
    FileProvider,
}

impl fmt::Display for PushType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PushType::Voip => "voip",
            PushType::Alert => "alert",
            PushType::Background => "background",
            PushType::Complication => "complication",
            PushType::FileProvider => "fileprovider",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PushError {
    #[error("Payload is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("Payload is not a JSON object")]
    NotAnObject,

    #[error("Payload is missing string field '{0}'")]
    MissingField(&'static str),
}

/// Flat string-keyed push body
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PushPayload {
    fields: Map<String, Value>,
}

/// Caller and destination extracted from a voice push
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingCallRequest {
    pub caller: String,
    pub room_alias: String,
}

impl PushPayload {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Parse a raw push body
    pub fn from_json(raw: impl AsRef<[u8]>) -> Result<Self, PushError> {
        let value: Value = serde_json::from_slice(raw.as_ref())
            .map_err(|e| PushError::InvalidJson(e.to_string()))?;
        match value {
            Value::Object(fields) => Ok(Self { fields }),
            _ => Err(PushError::NotAnObject),
        }
    }

    /// Canonical voice push body
    pub fn voip(caller: &str, room_alias: &str) -> Self {
        let mut fields = Map::new();
        fields.insert("aps".to_string(), json!({ "content-available": 1 }));
        fields.insert(CALLER_KEY.to_string(), Value::String(caller.to_string()));
        fields.insert(ROOM_ALIAS_KEY.to_string(), Value::String(room_alias.to_string()));
        Self { fields }
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.fields.insert(key.into(), value);
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.fields.remove(key)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Extract the call request; both keys must be present as strings
    pub fn incoming_call(&self) -> Result<IncomingCallRequest, PushError> {
        let caller = self
            .get_str(CALLER_KEY)
            .ok_or(PushError::MissingField(CALLER_KEY))?;
        let room_alias = self
            .get_str(ROOM_ALIAS_KEY)
            .ok_or(PushError::MissingField(ROOM_ALIAS_KEY))?;

        Ok(IncomingCallRequest {
            caller: caller.to_string(),
            room_alias: room_alias.to_string(),
        })
    }
}
