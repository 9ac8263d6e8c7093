//! In-process event bus with typed topics.
//!
//! Handlers run synchronously on the publishing thread, in subscription
//! order. A [`Subscription`] unsubscribes its handler when dropped, so a
//! component's handlers live exactly as long as the component holds them.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    /// Raw push payloads for per-job progress bars.
    JobProgress,
    /// A user asked to cancel a job.
    CancelRequested,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BusEvent {
    JobProgress { payload: Value },
    CancelRequested { code: String },
}

impl BusEvent {
    pub fn topic(&self) -> Topic {
        match self {
            BusEvent::JobProgress { .. } => Topic::JobProgress,
            BusEvent::CancelRequested { .. } => Topic::CancelRequested,
        }
    }
}

type Handler = Arc<dyn Fn(&BusEvent) + Send + Sync>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    handlers: HashMap<Topic, Vec<(u64, Handler)>>,
}

fn lock(registry: &Mutex<Registry>) -> MutexGuard<'_, Registry> {
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Clone, Default)]
pub struct EventBus {
    registry: Arc<Mutex<Registry>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for `topic` until the returned guard is dropped.
    #[must_use = "dropping the subscription unsubscribes the handler"]
    pub fn subscribe<F>(&self, topic: Topic, handler: F) -> Subscription
    where
        F: Fn(&BusEvent) + Send + Sync + 'static,
    {
        let mut registry = lock(&self.registry);
        let id = registry.next_id;
        registry.next_id += 1;
        registry
            .handlers
            .entry(topic)
            .or_default()
            .push((id, Arc::new(handler)));
        Subscription {
            topic,
            id,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Delivers `event` to every handler of its topic.
    ///
    /// Returns the number of handlers that received the event.
    pub fn publish(&self, event: BusEvent) -> usize {
        // Handlers are called outside the lock so they may publish or subscribe.
        let handlers: Vec<Handler> = lock(&self.registry)
            .handlers
            .get(&event.topic())
            .map(|entries| entries.iter().map(|(_, handler)| handler.clone()).collect())
            .unwrap_or_default();
        for handler in &handlers {
            handler(&event);
        }
        handlers.len()
    }

    pub fn subscriber_count(&self, topic: Topic) -> usize {
        lock(&self.registry)
            .handlers
            .get(&topic)
            .map_or(0, Vec::len)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("job_progress", &self.subscriber_count(Topic::JobProgress))
            .field(
                "cancel_requested",
                &self.subscriber_count(Topic::CancelRequested),
            )
            .finish()
    }
}

/// Keeps a handler registered; unsubscribes on drop.
#[derive(Debug)]
pub struct Subscription {
    topic: Topic,
    id: u64,
    registry: Weak<Mutex<Registry>>,
}

impl Subscription {
    pub fn topic(&self) -> Topic {
        self.topic
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        let mut registry = lock(&registry);
        if let Some(entries) = registry.handlers.get_mut(&self.topic) {
            entries.retain(|(id, _)| *id != self.id);
        }
    }
}
