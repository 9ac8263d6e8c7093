use std::collections::HashMap;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::{Duration, Instant};

use progress_logging::{progress_debug, progress_error, progress_info, progress_warn};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::{EngineEvent, ProgressBackend, PushChannel};

#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Emit `FallbackTick` at this cadence when set and non-zero.
    pub fallback_poll_interval: Option<Duration>,
    /// Pause after a failed long-poll before trying again.
    pub poll_retry_delay: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            fallback_poll_interval: None,
            poll_retry_delay: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCommand {
    ArmTimer { timer: u64, deadline: Instant },
    CancelTimer { timer: u64 },
    FetchSnapshot { seq: u64 },
    ResolveView { model: String },
    CancelJob { code: String },
    Shutdown,
}

pub trait EventSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelEventSink {
    tx: mpsc::Sender<EngineEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

/// Owns the async runtime thread. Commands go in, [`EngineEvent`]s come out
/// through the sink.
#[derive(Clone)]
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
}

impl EngineHandle {
    pub fn new(
        backend: Arc<dyn ProgressBackend>,
        push: Option<Arc<dyn PushChannel>>,
        sink: Arc<dyn EventSink>,
        settings: EngineSettings,
    ) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel();

        thread::spawn(move || {
            let runtime = match tokio::runtime::Runtime::new() {
                Ok(runtime) => runtime,
                Err(err) => {
                    progress_error!("could not start engine runtime: {}", err);
                    return;
                }
            };
            let shutdown = CancellationToken::new();

            if let Some(push) = push {
                runtime.spawn(run_push_loop(
                    push,
                    sink.clone(),
                    settings.poll_retry_delay,
                    shutdown.clone(),
                ));
            }
            // `tokio::time::interval` rejects a zero period.
            let fallback = settings
                .fallback_poll_interval
                .filter(|interval| !interval.is_zero());
            if let Some(interval) = fallback {
                runtime.spawn(run_fallback_ticks(interval, sink.clone(), shutdown.clone()));
            }

            let mut timers: HashMap<u64, JoinHandle<()>> = HashMap::new();
            while let Ok(command) = cmd_rx.recv() {
                timers.retain(|_, handle| !handle.is_finished());
                match command {
                    EngineCommand::Shutdown => break,
                    EngineCommand::ArmTimer { timer, deadline } => {
                        let sink = sink.clone();
                        let handle = runtime.spawn(async move {
                            tokio::time::sleep_until(tokio::time::Instant::from_std(deadline))
                                .await;
                            sink.emit(EngineEvent::TimerFired { timer });
                        });
                        if let Some(previous) = timers.insert(timer, handle) {
                            previous.abort();
                        }
                    }
                    EngineCommand::CancelTimer { timer } => {
                        if let Some(handle) = timers.remove(&timer) {
                            progress_debug!("timer {} cancelled", timer);
                            handle.abort();
                        }
                    }
                    command => {
                        let backend = backend.clone();
                        let sink = sink.clone();
                        runtime.spawn(async move {
                            handle_request(backend.as_ref(), command, sink.as_ref()).await;
                        });
                    }
                }
            }

            shutdown.cancel();
            for handle in timers.values() {
                handle.abort();
            }
            runtime.shutdown_background();
            progress_info!("engine stopped");
        });

        Self { cmd_tx }
    }

    pub fn send(&self, command: EngineCommand) {
        let _ = self.cmd_tx.send(command);
    }

    pub fn shutdown(&self) {
        self.send(EngineCommand::Shutdown);
    }
}

async fn handle_request(backend: &dyn ProgressBackend, command: EngineCommand, sink: &dyn EventSink) {
    match command {
        EngineCommand::FetchSnapshot { seq } => {
            let result = backend.fetch_snapshot().await;
            sink.emit(EngineEvent::SnapshotFetched { seq, result });
        }
        EngineCommand::ResolveView { model } => {
            let result = backend.resolve_view(&model).await;
            sink.emit(EngineEvent::ViewResolved { model, result });
        }
        EngineCommand::CancelJob { code } => {
            let result = backend.cancel_progress(&code).await;
            sink.emit(EngineEvent::CancelSent { code, result });
        }
        EngineCommand::ArmTimer { .. } | EngineCommand::CancelTimer { .. } | EngineCommand::Shutdown => {}
    }
}

async fn run_push_loop(
    push: Arc<dyn PushChannel>,
    sink: Arc<dyn EventSink>,
    retry_delay: Duration,
    shutdown: CancellationToken,
) {
    let mut last = 0;
    loop {
        let polled = tokio::select! {
            _ = shutdown.cancelled() => return,
            polled = push.poll(last) => polled,
        };
        match polled {
            Ok(batch) => {
                last = batch.last;
                if !batch.messages.is_empty() {
                    sink.emit(EngineEvent::Push(batch.messages));
                }
            }
            Err(err) => {
                progress_warn!("push poll failed, retrying in {:?}: {}", retry_delay, err);
                tokio::select! {
                    _ = shutdown.cancelled() => return,
                    _ = tokio::time::sleep(retry_delay) => {}
                }
            }
        }
    }
}

async fn run_fallback_ticks(interval: Duration, sink: Arc<dyn EventSink>, shutdown: CancellationToken) {
    let mut ticker = tokio::time::interval(interval);
    // The first tick completes immediately; startup already loads once.
    ticker.tick().await;
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => return,
            _ = ticker.tick() => sink.emit(EngineEvent::FallbackTick),
        }
    }
}
