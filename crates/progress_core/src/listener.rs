use serde_json::Value;
use thiserror::Error;

use crate::ProgressState;

/// Push channel the systray indicator subscribes to by default.
pub const DEFAULT_CHANNEL: &str = "web_progress";

/// One `[topic, payload]` message received from the push channel.
#[derive(Debug, Clone, PartialEq)]
pub struct RawNotification {
    pub topic: String,
    pub payload: Value,
}

impl RawNotification {
    pub fn new(topic: impl Into<String>, payload: Value) -> Self {
        Self {
            topic: topic.into(),
            payload,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedNotification {
    #[error("payload is not a non-empty list")]
    NotAList,
    #[error("payload[0] has no string field `{0}`")]
    MissingField(&'static str),
}

/// Outcome of looking at one raw message.
#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    /// Another feature's topic on the shared bus.
    Foreign,
    /// Our topic. Always schedules a refresh, whatever the payload holds.
    Accepted {
        /// Job handle when `payload[0].code` is a string.
        code: Option<String>,
        /// Wire state, or why it could not be read.
        state: Result<ProgressState, MalformedNotification>,
        /// The raw payload when its state is on the forwarding allow-list.
        forward: Option<Value>,
    },
}

/// Filters push traffic for one channel and decides what is re-published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationListener {
    channel: String,
    forward_states: Vec<ProgressState>,
}

impl NotificationListener {
    pub fn new(channel: impl Into<String>, forward_states: Vec<ProgressState>) -> Self {
        Self {
            channel: channel.into(),
            forward_states,
        }
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn forwards(&self, state: &ProgressState) -> bool {
        self.forward_states.contains(state)
    }

    /// A topic match is enough to be accepted. The payload only decides
    /// whether the message is forwarded.
    pub fn classify(&self, raw: &RawNotification) -> Classification {
        if raw.topic != self.channel {
            return Classification::Foreign;
        }

        let head = raw.payload.as_array().and_then(|items| items.first());
        let code = head
            .and_then(|head| head.get("code"))
            .and_then(Value::as_str)
            .map(str::to_string);
        let state = match head {
            None => Err(MalformedNotification::NotAList),
            Some(head) => head
                .get("state")
                .and_then(Value::as_str)
                .map(ProgressState::from_wire)
                .ok_or(MalformedNotification::MissingField("state")),
        };

        let forward = match &state {
            Ok(state) if self.forwards(state) => Some(raw.payload.clone()),
            _ => None,
        };
        Classification::Accepted {
            code,
            state,
            forward,
        }
    }
}

impl Default for NotificationListener {
    fn default() -> Self {
        Self::new(
            DEFAULT_CHANNEL,
            vec![ProgressState::Ongoing, ProgressState::Done],
        )
    }
}
