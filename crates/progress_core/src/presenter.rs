use std::collections::BTreeSet;

use crate::view_model::{ProgressRowView, SummaryView};
use crate::ProgressSnapshot;

/// One-shot cancel handlers keyed by item code.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CancelRegistry {
    armed: BTreeSet<String>,
}

impl CancelRegistry {
    pub fn clear(&mut self) {
        self.armed.clear();
    }

    pub fn arm(&mut self, code: impl Into<String>) {
        self.armed.insert(code.into());
    }

    /// Fires the handler for `code`. The handler disarms itself, so only the
    /// first trigger after a render yields the code.
    pub fn trigger(&mut self, code: &str) -> Option<String> {
        self.armed.take(code)
    }

    pub fn is_armed(&self, code: &str) -> bool {
        self.armed.contains(code)
    }

    pub fn len(&self) -> usize {
        self.armed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.armed.is_empty()
    }
}

/// Turns snapshots into the displayed summary and owns the cancel wiring.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Presenter {
    displayed: SummaryView,
    cancels: CancelRegistry,
    open: bool,
}

impl Presenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> SummaryView {
        let mut view = self.displayed.clone();
        view.open = self.open;
        view.cancel_targets = view
            .rows
            .iter()
            .filter(|row| self.cancels.is_armed(&row.code))
            .map(|row| row.code.clone())
            .collect();
        view
    }

    pub fn cancels(&self) -> &CancelRegistry {
        &self.cancels
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Replaces the displayed summary with `snapshot` and rebuilds every
    /// cancel handler from scratch.
    pub fn render(&mut self, snapshot: &ProgressSnapshot) -> SummaryView {
        self.cancels.clear();
        let rows = snapshot
            .items()
            .iter()
            .map(|item| {
                if item.cancellable {
                    self.cancels.arm(item.code.clone());
                }
                ProgressRowView {
                    code: item.code.clone(),
                    label: item.name.clone().unwrap_or_else(|| item.code.clone()),
                    state: item.state.clone(),
                    progress: item.progress,
                    cancel_visible: item.cancellable,
                }
            })
            .collect();

        self.displayed = SummaryView {
            counter: snapshot.count(),
            spinning: !snapshot.is_empty(),
            rows,
            cancel_targets: Vec::new(),
            open: self.open,
        };
        self.view()
    }

    pub fn trigger_cancel(&mut self, code: &str) -> Option<String> {
        self.cancels.trigger(code)
    }

    /// Records the menu state. Returns `true` only on a closed -> open edge.
    pub fn set_open(&mut self, open: bool) -> bool {
        let opened = open && !self.open;
        self.open = open;
        opened
    }
}
