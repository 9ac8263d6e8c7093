//! Progress engine: backend RPC, push transport, timers and the event bus.
mod bus;
mod engine;
mod push;
mod rpc;
mod types;

pub use bus::{BusEvent, EventBus, Subscription, Topic};
pub use engine::{ChannelEventSink, EngineCommand, EngineHandle, EngineSettings, EventSink};
pub use push::{LongPollChannel, PushChannel, PushSettings};
pub use rpc::{JsonRpcBackend, ProgressBackend, RpcSettings, PROGRESS_MODEL};
pub use types::{
    EngineEvent, FailureKind, ProgressRecord, PushBatch, PushMessage, TransportError, ViewId,
};
