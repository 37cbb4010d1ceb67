//! Push channel: server-initiated `log`, `progress` and `stage` notifications
//! for the joined task.

mod packet;
mod polling;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::sink::EventSink;

pub use packet::{decode_packet, decode_payload, encode_event, Handshake, Packet};
pub use polling::{PollingTransport, PushSettings, SessionEnd};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PushError {
    #[error("invalid push url: {0}")]
    InvalidUrl(String),
    #[error("handshake failed: {0}")]
    Handshake(String),
    #[error("push request failed: {0}")]
    Http(String),
    #[error("undecodable packet: {0}")]
    Decode(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LogPayload {
    pub message: String,
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub update_last: bool,
}

fn default_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProgressPayload {
    #[serde(default)]
    pub overall: f64,
    #[serde(default)]
    pub chunk: f64,
    #[serde(default)]
    pub current_chunk: u32,
    #[serde(default)]
    pub total_chunks: u32,
}

/// Structured job state: `"completed"` or `"failed"`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StagePayload {
    pub stage: String,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PushEvent {
    Connected,
    Disconnected,
    Log(LogPayload),
    Progress(ProgressPayload),
    Stage(StagePayload),
}

impl PushEvent {
    /// Decode a named event. Unknown names yield `Ok(None)`.
    pub fn from_event(name: &str, payload: Value) -> Result<Option<Self>, PushError> {
        let decode_err = |err: serde_json::Error| PushError::Decode(format!("{name}: {err}"));
        let event = match name {
            "log" => PushEvent::Log(serde_json::from_value(payload).map_err(decode_err)?),
            "progress" => PushEvent::Progress(serde_json::from_value(payload).map_err(decode_err)?),
            "stage" => PushEvent::Stage(serde_json::from_value(payload).map_err(decode_err)?),
            _ => return Ok(None),
        };
        Ok(Some(event))
    }
}

/// Keeps a push session alive until cancelled. The task id to join is read
/// from `joins`; every change is sent as a `join` event, and the latest one
/// is re-sent after a reconnect.
#[async_trait::async_trait]
pub trait PushTransport: Send + Sync {
    async fn run(
        &self,
        joins: watch::Receiver<Option<String>>,
        cancel: CancellationToken,
        sink: &dyn EventSink,
    );
}
