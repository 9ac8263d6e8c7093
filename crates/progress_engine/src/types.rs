use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Identifier of the backend view that displays a job's owning record.
pub type ViewId = i64;

/// One row of `web.progress.get_all_progress` as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub code: String,
    #[serde(default)]
    pub state: String,
    #[serde(default, deserialize_with = "falsy_as_default")]
    pub cancellable: bool,
    #[serde(default, deserialize_with = "falsy_as_default")]
    pub model: String,
    #[serde(default, deserialize_with = "falsy_as_default")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "falsy_as_default")]
    pub progress: Option<f64>,
}

/// The backend writes `false` for empty fields; treat it like a missing value.
fn falsy_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + serde::de::DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    match value {
        Value::Null | Value::Bool(false) => Ok(T::default()),
        other => serde_json::from_value(other).map_err(serde::de::Error::custom),
    }
}

/// One `[topic, payload]` push message.
#[derive(Debug, Clone, PartialEq)]
pub struct PushMessage {
    pub topic: String,
    pub payload: Value,
}

/// Messages from one long-poll round plus the cursor for the next round.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PushBatch {
    pub last: u64,
    pub messages: Vec<PushMessage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct TransportError {
    pub kind: FailureKind,
    pub message: String,
}

impl TransportError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FailureKind {
    #[error("invalid url")]
    InvalidUrl,
    #[error("http status {0}")]
    HttpStatus(u16),
    #[error("timeout")]
    Timeout,
    #[error("rpc error {code}")]
    Rpc { code: i64 },
    #[error("malformed response")]
    Decode,
    #[error("network error")]
    Network,
}

/// Results and timer expiries produced by the engine runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    TimerFired {
        timer: u64,
    },
    SnapshotFetched {
        seq: u64,
        result: Result<Vec<ProgressRecord>, TransportError>,
    },
    ViewResolved {
        model: String,
        result: Result<ViewId, TransportError>,
    },
    CancelSent {
        code: String,
        result: Result<(), TransportError>,
    },
    Push(Vec<PushMessage>),
    FallbackTick,
}
