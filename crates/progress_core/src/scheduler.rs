//! Debounced refresh scheduling.
//!
//! A single timer handle coalesces any burst of notifications into one fetch
//! per debounce window. Every fetch carries a sequence number so that a slow
//! response can never overwrite a newer one.

use std::time::{Duration, Instant};

use progress_logging::{progress_debug, progress_warn};

use crate::{Effect, ProgressSnapshot, TransportFailure};

/// Default debounce window between a notification and the fetch it triggers.
pub const DEFAULT_DEBOUNCE_WINDOW: Duration = Duration::from_millis(10_000);

pub type TimerToken = u64;
pub type FetchSeq = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefreshPhase {
    #[default]
    Idle,
    /// A debounce timer is pending. A fetch may still be in flight.
    Armed {
        timer: TimerToken,
        deadline: Instant,
    },
    /// A fetch is in flight and no timer is pending.
    Fetching { seq: FetchSeq },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RefreshScheduler {
    window: Duration,
    phase: RefreshPhase,
    next_timer: TimerToken,
    next_seq: FetchSeq,
    last_applied: Option<FetchSeq>,
    last_snapshot: Option<ProgressSnapshot>,
    stopped: bool,
}

impl RefreshScheduler {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            phase: RefreshPhase::Idle,
            next_timer: 1,
            next_seq: 1,
            last_applied: None,
            last_snapshot: None,
            stopped: false,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn phase(&self) -> RefreshPhase {
        self.phase
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub fn last_snapshot(&self) -> Option<&ProgressSnapshot> {
        self.last_snapshot.as_ref()
    }

    /// Something may have changed: make sure a fetch happens within one window.
    pub fn notify(&mut self, now: Instant) -> Option<Effect> {
        if self.stopped {
            return None;
        }
        match self.phase {
            RefreshPhase::Armed { .. } => None,
            RefreshPhase::Idle | RefreshPhase::Fetching { .. } => {
                let timer = self.next_timer;
                self.next_timer += 1;
                let deadline = now + self.window;
                self.phase = RefreshPhase::Armed { timer, deadline };
                progress_debug!("refresh timer {} armed", timer);
                Some(Effect::ArmTimer { timer, deadline })
            }
        }
    }

    /// The armed timer elapsed. The phase leaves `Armed` before the fetch is
    /// issued so that notifications during the fetch arm a fresh timer.
    pub fn timer_fired(&mut self, timer: TimerToken) -> Option<Effect> {
        if self.stopped {
            return None;
        }
        match self.phase {
            RefreshPhase::Armed { timer: armed, .. } if armed == timer => Some(self.begin_fetch()),
            _ => {
                progress_debug!("ignoring stale refresh timer {}", timer);
                None
            }
        }
    }

    /// Immediate fetch for direct user actions. No-op while a refresh is
    /// already pending or in flight.
    pub fn force_refresh(&mut self) -> Option<Effect> {
        if self.stopped {
            return None;
        }
        match self.phase {
            RefreshPhase::Idle => Some(self.begin_fetch()),
            RefreshPhase::Armed { .. } | RefreshPhase::Fetching { .. } => None,
        }
    }

    /// Applies a fetch result. Returns the snapshot to present when it is the
    /// newest one seen so far.
    pub fn fetch_completed(
        &mut self,
        seq: FetchSeq,
        result: Result<ProgressSnapshot, TransportFailure>,
    ) -> Option<ProgressSnapshot> {
        if self.stopped {
            return None;
        }
        if self.phase == (RefreshPhase::Fetching { seq }) {
            self.phase = RefreshPhase::Idle;
        }

        match result {
            Ok(snapshot) => {
                if self.last_applied.is_some_and(|applied| seq <= applied) {
                    progress_debug!("discarding stale snapshot {}", seq);
                    return None;
                }
                self.last_applied = Some(seq);
                self.last_snapshot = Some(snapshot.clone());
                Some(snapshot)
            }
            Err(failure) => {
                progress_warn!("progress fetch {} failed: {}", seq, failure);
                None
            }
        }
    }

    /// Stops the scheduler for good. Returns the timer to cancel, if any.
    pub fn teardown(&mut self) -> Option<Effect> {
        if self.stopped {
            return None;
        }
        self.stopped = true;
        let cancel = match self.phase {
            RefreshPhase::Armed { timer, .. } => Some(Effect::CancelTimer { timer }),
            RefreshPhase::Idle | RefreshPhase::Fetching { .. } => None,
        };
        self.phase = RefreshPhase::Idle;
        cancel
    }

    fn begin_fetch(&mut self) -> Effect {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.phase = RefreshPhase::Fetching { seq };
        Effect::FetchSnapshot { seq }
    }
}

impl Default for RefreshScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE_WINDOW)
    }
}
