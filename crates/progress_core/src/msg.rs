use std::fmt;
use std::time::Instant;

use crate::{FetchSeq, ProgressSnapshot, RawNotification, TimerToken, ViewId};

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// Component started; load the current state once.
    Started,
    /// A batch of raw push messages arrived at `at`.
    PushReceived {
        notifications: Vec<RawNotification>,
        at: Instant,
    },
    /// Periodic fallback poll, treated like any other notification.
    FallbackTick { at: Instant },
    TimerFired { timer: TimerToken },
    FetchCompleted {
        seq: FetchSeq,
        result: Result<ProgressSnapshot, TransportFailure>,
    },
    /// The systray menu was opened or closed.
    MenuToggled { open: bool },
    /// User clicked the cancel affordance of a row.
    CancelClicked { code: String },
    /// User clicked a row to jump to the owning record.
    JobSelected { code: String },
    ViewResolved {
        model: String,
        result: Result<ViewId, TransportFailure>,
    },
    Teardown,
}

/// A failed backend round-trip, reduced to what the core needs to log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportFailure {
    pub message: String,
}

impl TransportFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for TransportFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}
