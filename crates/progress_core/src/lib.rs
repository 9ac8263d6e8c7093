//! Progress indicator core: pure refresh state machine and view-model helpers.
mod effect;
mod item;
mod listener;
mod msg;
mod presenter;
mod scheduler;
mod state;
mod update;
mod view_model;

pub use effect::Effect;
pub use item::{ProgressItem, ProgressSnapshot, ProgressState};
pub use listener::{
    Classification, MalformedNotification, NotificationListener, RawNotification, DEFAULT_CHANNEL,
};
pub use msg::{Msg, TransportFailure};
pub use presenter::{CancelRegistry, Presenter};
pub use scheduler::{FetchSeq, RefreshPhase, RefreshScheduler, TimerToken, DEFAULT_DEBOUNCE_WINDOW};
pub use state::{IndicatorConfig, IndicatorState};
pub use update::update;
pub use view_model::{ProgressRowView, SummaryView};

/// Identifier of the backend view used to open a job's owning record.
pub type ViewId = i64;
