//! Line-oriented JSON console
//!
//! Each input line is one [`ConsoleCommand`]; each produces one JSON line
//! of output. Push and provider commands drive the coordinator through the
//! same sinks a platform integration would use.

use crate::application::CallCoordinator;
use crate::domain::call::EndReason;
use crate::domain::invocation::ExternalInvocation;
use crate::domain::push::{PushCompletion, PushPayload, PushType};
use crate::domain::shared::value_objects::CallId;
use crate::domain::telephony::ActionOutcome;
use crate::infrastructure::telephony::LoopbackTelephony;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::oneshot;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum ConsoleError {
    #[error("Console I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode console output: {0}")]
    Encode(#[from] serde_json::Error),
}

fn default_push_type() -> PushType {
    PushType::Voip
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum ConsoleCommand {
    /// Deliver a push with `payload` as its dictionary
    Push {
        #[serde(default = "default_push_type")]
        push_type: PushType,
        payload: PushPayload,
    },
    /// Issue a new hex-encoded token for `push_type`
    Credentials {
        #[serde(default = "default_push_type")]
        push_type: PushType,
        token: String,
    },
    InvalidateToken {
        #[serde(default = "default_push_type")]
        push_type: PushType,
    },
    /// Start a call to `destination`
    Call { destination: String },
    Invoke { invocation: ExternalInvocation },
    Answer { call_id: CallId },
    End { call_id: CallId },
    Mute {
        call_id: CallId,
        #[serde(default = "default_muted")]
        muted: bool,
    },
    Reset,
    Audio { active: bool },
    /// Report how a call concluded outside the system UI
    Report { call_id: CallId, reason: EndReason },
    Calls,
    Token,
    Permission,
    RequestPermission,
}

fn default_muted() -> bool {
    true
}

pub struct Console {
    coordinator: CallCoordinator,
    provider: Arc<LoopbackTelephony>,
}

impl Console {
    pub fn new(coordinator: CallCoordinator, provider: Arc<LoopbackTelephony>) -> Self {
        Self {
            coordinator,
            provider,
        }
    }

    /// Process `input` line by line until EOF
    pub async fn run<R, W>(&self, input: R, mut output: W) -> Result<(), ConsoleError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = input.lines();
        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let reply = match serde_json::from_str::<ConsoleCommand>(line) {
                Ok(command) => {
                    debug!(?command, "Console command");
                    self.execute(command)
                        .await
                        .unwrap_or_else(|e| json!({ "error": e }))
                }
                Err(e) => {
                    warn!("Invalid console command: {}", e);
                    json!({ "error": format!("invalid command: {}", e) })
                }
            };

            let mut encoded = serde_json::to_vec(&reply)?;
            encoded.push(b'\n');
            output.write_all(&encoded).await?;
            output.flush().await?;
        }
        Ok(())
    }

    pub async fn execute(&self, command: ConsoleCommand) -> Result<Value, String> {
        match command {
            ConsoleCommand::Push { push_type, payload } => {
                let (completion, done) = PushCompletion::new();
                self.coordinator
                    .push_sink()
                    .did_receive_incoming_push(push_type, payload, completion);
                done.await
                    .map_err(|_| "push was never completed".to_string())?;
                Ok(json!({ "completed": true }))
            }
            ConsoleCommand::Credentials { push_type, token } => {
                let bytes = hex::decode(&token).map_err(|e| format!("invalid token: {}", e))?;
                self.coordinator
                    .push_sink()
                    .did_update_credentials(push_type, &bytes);
                Ok(json!({ "accepted": true }))
            }
            ConsoleCommand::InvalidateToken { push_type } => {
                self.coordinator.push_sink().did_invalidate_token(push_type);
                Ok(json!({ "accepted": true }))
            }
            ConsoleCommand::Call { destination } => {
                self.coordinator.start_call_manually(destination);
                Ok(json!({ "requested": true }))
            }
            ConsoleCommand::Invoke { invocation } => {
                let destination = invocation.destination().map(str::to_string);
                self.coordinator
                    .start_call_from_external_invocation(&invocation);
                Ok(json!({ "requested": destination.is_some(), "destination": destination }))
            }
            ConsoleCommand::Answer { call_id } => outcome(self.provider.answer(call_id)).await,
            ConsoleCommand::End { call_id } => outcome(self.provider.end(call_id)).await,
            ConsoleCommand::Mute { call_id, muted } => {
                outcome(self.provider.set_muted(call_id, muted)).await
            }
            ConsoleCommand::Reset => {
                self.provider.reset();
                Ok(json!({ "reset": true }))
            }
            ConsoleCommand::Audio { active } => {
                if active {
                    self.provider.activate_audio_session();
                } else {
                    self.provider.deactivate_audio_session();
                }
                Ok(json!({ "audioActive": active }))
            }
            ConsoleCommand::Report { call_id, reason } => {
                let call = self
                    .coordinator
                    .call(call_id)
                    .await
                    .ok_or_else(|| format!("unknown call {}", call_id))?;
                match reason {
                    EndReason::Failed => self.coordinator.report_call_failed(&call),
                    EndReason::RemoteEnded => self.coordinator.report_call_ended(&call),
                    EndReason::AnsweredElsewhere => {
                        self.coordinator.report_call_answered_elsewhere(&call)
                    }
                    EndReason::DeclinedElsewhere => self.coordinator.report_call_declined(&call),
                }
                Ok(json!({ "reported": reason }))
            }
            ConsoleCommand::Calls => {
                let calls = self.coordinator.active_calls().await;
                serde_json::to_value(calls).map_err(|e| e.to_string())
            }
            ConsoleCommand::Token => Ok(json!({ "token": self.coordinator.device_token() })),
            ConsoleCommand::Permission => {
                Ok(json!({ "permission": self.coordinator.permission_state() }))
            }
            ConsoleCommand::RequestPermission => {
                self.coordinator.request_permission();
                Ok(json!({ "requested": true }))
            }
        }
    }
}

async fn outcome(rx: oneshot::Receiver<ActionOutcome>) -> Result<Value, String> {
    let outcome = rx
        .await
        .map_err(|_| "action was never acknowledged".to_string())?;
    Ok(json!({ "outcome": outcome }))
}
