use std::time::Instant;

use serde_json::Value;

use crate::{FetchSeq, TimerToken, ViewId};

/// Side effects requested by [`crate::update`]; executed by the shell.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Deliver `Msg::TimerFired { timer }` at `deadline`.
    ArmTimer { timer: TimerToken, deadline: Instant },
    CancelTimer { timer: TimerToken },
    /// Fetch a snapshot and answer with `Msg::FetchCompleted { seq, .. }`.
    FetchSnapshot { seq: FetchSeq },
    /// Re-publish a push payload for per-job progress consumers.
    ForwardProgress { payload: Value },
    /// Publish a cancel request for one job.
    RequestCancel { code: String },
    ResolveView { model: String },
    OpenView { model: String, view_id: ViewId },
}
