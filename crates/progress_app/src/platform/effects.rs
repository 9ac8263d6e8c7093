use std::sync::mpsc;
use std::time::Instant;

use progress_core::{
    Effect, Msg, ProgressItem, ProgressSnapshot, ProgressState, RawNotification, TransportFailure,
};
use progress_engine::{
    BusEvent, EngineCommand, EngineEvent, EngineHandle, EventBus, EventSink, ProgressRecord,
    PushMessage,
};
use progress_logging::{progress_debug, progress_info, progress_warn};

/// Executes core effects against the engine and the event bus.
pub(crate) struct EffectRunner {
    engine: EngineHandle,
    bus: EventBus,
}

impl EffectRunner {
    pub(crate) fn new(engine: EngineHandle, bus: EventBus) -> Self {
        Self { engine, bus }
    }

    pub(crate) fn run(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::ArmTimer { timer, deadline } => {
                    self.engine.send(EngineCommand::ArmTimer { timer, deadline });
                }
                Effect::CancelTimer { timer } => {
                    self.engine.send(EngineCommand::CancelTimer { timer });
                }
                Effect::FetchSnapshot { seq } => {
                    progress_debug!("FetchSnapshot seq={}", seq);
                    self.engine.send(EngineCommand::FetchSnapshot { seq });
                }
                Effect::ForwardProgress { payload } => {
                    self.bus.publish(BusEvent::JobProgress { payload });
                }
                Effect::RequestCancel { code } => {
                    let delivered = self.bus.publish(BusEvent::CancelRequested { code: code.clone() });
                    if delivered == 0 {
                        progress_warn!("nobody handles cancel requests; {} stays running", code);
                    }
                }
                Effect::ResolveView { model } => {
                    self.engine.send(EngineCommand::ResolveView { model });
                }
                Effect::OpenView { model, view_id } => {
                    progress_info!("OpenView model={} view_id={}", model, view_id);
                    println!("-> open {model} (view {view_id})");
                }
            }
        }
    }
}

/// Feeds engine events into the single-threaded message loop.
pub(crate) struct MsgSink {
    tx: mpsc::Sender<Msg>,
}

impl MsgSink {
    pub(crate) fn new(tx: mpsc::Sender<Msg>) -> Self {
        Self { tx }
    }
}

impl EventSink for MsgSink {
    fn emit(&self, event: EngineEvent) {
        if let Some(msg) = map_event(event, Instant::now()) {
            let _ = self.tx.send(msg);
        }
    }
}

pub(crate) fn map_event(event: EngineEvent, now: Instant) -> Option<Msg> {
    match event {
        EngineEvent::TimerFired { timer } => Some(Msg::TimerFired { timer }),
        EngineEvent::SnapshotFetched { seq, result } => Some(Msg::FetchCompleted {
            seq,
            result: result
                .map(map_records)
                .map_err(|err| TransportFailure::new(err.to_string())),
        }),
        EngineEvent::ViewResolved { model, result } => Some(Msg::ViewResolved {
            model,
            result: result.map_err(|err| TransportFailure::new(err.to_string())),
        }),
        EngineEvent::CancelSent { code, result } => {
            match result {
                Ok(()) => progress_info!("cancel request for {} accepted", code),
                Err(err) => progress_warn!("cancel request for {} failed: {}", code, err),
            }
            None
        }
        EngineEvent::Push(messages) => Some(Msg::PushReceived {
            notifications: messages.into_iter().map(map_push).collect(),
            at: now,
        }),
        EngineEvent::FallbackTick => Some(Msg::FallbackTick { at: now }),
    }
}

fn map_records(records: Vec<ProgressRecord>) -> ProgressSnapshot {
    ProgressSnapshot::new(records.into_iter().map(map_record).collect())
}

fn map_record(record: ProgressRecord) -> ProgressItem {
    ProgressItem {
        code: record.code,
        state: ProgressState::from_wire(&record.state),
        cancellable: record.cancellable,
        model: record.model,
        name: record.name,
        progress: record.progress.map(|percent| percent.clamp(0.0, 100.0)),
    }
}

fn map_push(message: PushMessage) -> RawNotification {
    RawNotification::new(message.topic, message.payload)
}
