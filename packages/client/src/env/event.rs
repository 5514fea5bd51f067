//! Lifecycle and diagnostic event bus

use std::fmt;

use tokio::sync::broadcast;

/// Events the core publishes about its own lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreEvent {
    /// More environments are alive than recommended.
    TooManyEnvironments { live: usize, max: usize },
    /// An environment finished shutting down its worker pool.
    EnvironmentShutdown { success: bool },
}

/// Publish/subscribe channel for [`CoreEvent`]s.
pub trait EventBus: Send + Sync + fmt::Debug {
    /// Publish `event`; returns whether any subscriber received it.
    fn publish(&self, event: CoreEvent) -> bool;

    fn subscribe(&self) -> broadcast::Receiver<CoreEvent>;
}

/// Buffered events per subscriber before the slowest one starts lagging.
pub const DEFAULT_EVENT_CAPACITY: usize = 1024;

/// [`EventBus`] backed by a tokio broadcast channel.
#[derive(Debug, Clone)]
pub struct BroadcastEventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl BroadcastEventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_EVENT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }
}

impl Default for BroadcastEventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus for BroadcastEventBus {
    fn publish(&self, event: CoreEvent) -> bool {
        self.sender.send(event).is_ok()
    }

    fn subscribe(&self) -> broadcast::Receiver<CoreEvent> {
        self.sender.subscribe()
    }
}
