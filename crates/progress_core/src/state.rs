use std::time::Duration;

use crate::scheduler::DEFAULT_DEBOUNCE_WINDOW;
use crate::view_model::SummaryView;
use crate::{
    NotificationListener, Presenter, ProgressSnapshot, ProgressState, RefreshPhase,
    RefreshScheduler, DEFAULT_CHANNEL,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndicatorConfig {
    pub channel: String,
    pub debounce_window: Duration,
    /// States whose push payloads are re-published for per-job consumers.
    pub forward_states: Vec<ProgressState>,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            channel: DEFAULT_CHANNEL.to_string(),
            debounce_window: DEFAULT_DEBOUNCE_WINDOW,
            forward_states: vec![ProgressState::Ongoing, ProgressState::Done],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct IndicatorState {
    pub(crate) scheduler: RefreshScheduler,
    pub(crate) listener: NotificationListener,
    pub(crate) presenter: Presenter,
    dirty: bool,
}

impl IndicatorState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: IndicatorConfig) -> Self {
        Self {
            scheduler: RefreshScheduler::new(config.debounce_window),
            listener: NotificationListener::new(config.channel, config.forward_states),
            presenter: Presenter::new(),
            dirty: false,
        }
    }

    pub fn view(&self) -> SummaryView {
        self.presenter.view()
    }

    pub fn phase(&self) -> RefreshPhase {
        self.scheduler.phase()
    }

    pub fn last_snapshot(&self) -> Option<&ProgressSnapshot> {
        self.scheduler.last_snapshot()
    }

    pub fn listener(&self) -> &NotificationListener {
        &self.listener
    }

    pub fn is_stopped(&self) -> bool {
        self.scheduler.is_stopped()
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Returns whether the view changed since the last call and resets the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}
