use crate::ProgressState;

/// What the systray indicator currently shows.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SummaryView {
    pub counter: usize,
    pub spinning: bool,
    pub rows: Vec<ProgressRowView>,
    /// Codes with an armed cancel handler, in row order.
    pub cancel_targets: Vec<String>,
    pub open: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProgressRowView {
    pub code: String,
    pub label: String,
    pub state: ProgressState,
    pub progress: Option<f64>,
    pub cancel_visible: bool,
}
