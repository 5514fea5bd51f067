//! kvlink Public API
//!
//! Correlated, partition-routed requests with pluggable retry decisions for
//! clients of a clustered key-value store. Build one [`Environment`] per
//! process, construct a [`KeyValueRequest`] per operation, and let the
//! dispatch loop consult the environment's retry strategy and delays.

#![deny(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]

// Re-export important types from client package
pub use kvlink_client::env::{
    BroadcastEventBus, ComputationScheduler, CoreEnvironment, CoreEvent, Environment,
    EnvironmentBuilder, EventBus, IoPool, Knob, Overrides, Provenance, Scheduler, ShutdownSignal,
    WorkerPool,
};
pub use kvlink_client::message::{
    BinaryRequest, CoreRequest, CorrelationIdGenerator, KeyValueRequest, UNASSIGNED_PARTITION,
};
pub use kvlink_client::retry::{
    BestEffortRetryStrategy, Delay, DelayKind, FailFastRetryStrategy, ObservePoller,
    RetryExecutor, RetryStrategy, TimeUnit,
};
pub use kvlink_client::{CoreError, Result, ShutdownError};

pub mod prelude {
    pub use kvlink_client::prelude::*;
}

/// Main entry point providing static constructors
pub struct KvLink;

impl KvLink {
    /// Start configuring an environment
    ///
    /// Shorthand for `Environment::builder()`
    #[must_use]
    pub fn environment() -> EnvironmentBuilder {
        Environment::builder()
    }

    /// Create a key-value request for `key` in `bucket`
    ///
    /// The correlation id comes from the process-wide generator.
    #[must_use]
    pub fn request(key: impl Into<String>, bucket: impl Into<String>) -> KeyValueRequest {
        let request = KeyValueRequest::new(Some(key.into()), bucket, None);
        tracing::trace!(opaque = request.opaque(), "key-value request created");
        request
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_shorthand() {
        let first = KvLink::request("a", "default");
        let second = KvLink::request("b", "default");
        assert_eq!(first.key(), Some("a"));
        assert_ne!(first.opaque(), second.opaque());
        assert!(first.partition().is_err());
    }

    #[test]
    fn test_environment_shorthand_reads_defaults() {
        let builder = KvLink::environment().with_view_endpoints(2);
        assert_eq!(builder.view_endpoints(), 2);
        assert_eq!(builder.query_endpoints(), 1);
    }
}
