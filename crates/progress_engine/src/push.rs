use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::rpc::JsonRpcTransport;
use crate::{PushBatch, PushMessage, TransportError};

#[derive(Debug, Clone)]
pub struct PushSettings {
    pub base_url: String,
    /// Channels to subscribe to; the indicator uses one.
    pub channels: Vec<String>,
    pub connect_timeout: Duration,
    /// Must exceed the server's long-poll hold time.
    pub poll_timeout: Duration,
    pub session_id: Option<String>,
}

impl Default for PushSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8069".to_string(),
            channels: vec!["web_progress".to_string()],
            connect_timeout: Duration::from_secs(10),
            poll_timeout: Duration::from_secs(60),
            session_id: None,
        }
    }
}

/// Source of server-initiated messages.
#[async_trait::async_trait]
pub trait PushChannel: Send + Sync {
    /// Waits for messages newer than `last`.
    async fn poll(&self, last: u64) -> Result<PushBatch, TransportError>;
}

#[derive(Serialize)]
struct PollParams<'a> {
    channels: &'a [String],
    last: u64,
    options: Map<String, Value>,
}

#[derive(Deserialize)]
struct PollEntry {
    id: u64,
    channel: Value,
    message: Value,
}

/// Long-polling client for the backend's `/longpolling/poll` endpoint.
#[derive(Debug)]
pub struct LongPollChannel {
    transport: JsonRpcTransport,
    channels: Vec<String>,
}

impl LongPollChannel {
    pub fn new(settings: PushSettings) -> Result<Self, TransportError> {
        let transport = JsonRpcTransport::new(
            &settings.base_url,
            settings.connect_timeout,
            settings.poll_timeout,
            settings.session_id.as_deref(),
        )?;
        Ok(Self {
            transport,
            channels: settings.channels,
        })
    }
}

#[async_trait::async_trait]
impl PushChannel for LongPollChannel {
    async fn poll(&self, last: u64) -> Result<PushBatch, TransportError> {
        let params = PollParams {
            channels: &self.channels,
            last,
            options: Map::new(),
        };
        let entries: Vec<PollEntry> = self.transport.call("/longpolling/poll", params).await?;

        let mut batch = PushBatch {
            last,
            messages: Vec::with_capacity(entries.len()),
        };
        for entry in entries {
            batch.last = batch.last.max(entry.id);
            batch.messages.push(PushMessage {
                topic: topic_name(&entry.channel),
                payload: entry.message,
            });
        }
        Ok(batch)
    }
}

/// Channels arrive either as a plain name or as a `[db, name, ...]` tuple.
fn topic_name(channel: &Value) -> String {
    match channel {
        Value::String(name) => name.clone(),
        Value::Array(parts) => parts
            .get(1)
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| channel.to_string()),
        other => other.to_string(),
    }
}
