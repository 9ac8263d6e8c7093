use std::collections::HashSet;
use std::fmt;

/// Lifecycle state of a background job as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ProgressState {
    Ongoing,
    Done,
    /// Any other wire value (cancelled, failed, ...), kept verbatim.
    Other(String),
}

impl ProgressState {
    pub fn from_wire(raw: &str) -> Self {
        match raw {
            "ongoing" => ProgressState::Ongoing,
            "done" => ProgressState::Done,
            other => ProgressState::Other(other.to_string()),
        }
    }

    pub fn as_wire(&self) -> &str {
        match self {
            ProgressState::Ongoing => "ongoing",
            ProgressState::Done => "done",
            ProgressState::Other(raw) => raw,
        }
    }
}

impl fmt::Display for ProgressState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

/// One background job row of a snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressItem {
    /// Opaque handle, unique within a snapshot.
    pub code: String,
    pub state: ProgressState,
    pub cancellable: bool,
    /// Identifier of the job type owning this progress.
    pub model: String,
    pub name: Option<String>,
    /// Percent complete in `0.0..=100.0` when known.
    pub progress: Option<f64>,
}

impl ProgressItem {
    pub fn new(code: impl Into<String>, state: ProgressState) -> Self {
        Self {
            code: code.into(),
            state,
            cancellable: false,
            model: String::new(),
            name: None,
            progress: None,
        }
    }

    pub fn cancellable(mut self, cancellable: bool) -> Self {
        self.cancellable = cancellable;
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_progress(mut self, percent: f64) -> Self {
        self.progress = Some(percent.clamp(0.0, 100.0));
        self
    }
}

/// One complete fetch result. Replaces all previously displayed data.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProgressSnapshot {
    items: Vec<ProgressItem>,
}

impl ProgressSnapshot {
    /// Builds a snapshot, keeping the first item for any duplicated code.
    pub fn new(items: Vec<ProgressItem>) -> Self {
        let mut seen = HashSet::with_capacity(items.len());
        let items = items
            .into_iter()
            .filter(|item| seen.insert(item.code.clone()))
            .collect();
        Self { items }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[ProgressItem] {
        &self.items
    }

    pub fn count(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn find(&self, code: &str) -> Option<&ProgressItem> {
        self.items.iter().find(|item| item.code == code)
    }
}

