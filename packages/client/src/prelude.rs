//! kvlink core prelude
//!
//! The types an embedding dispatch loop needs to build an environment,
//! construct and route requests, and apply retry decisions.

// Environment and its builder
pub use crate::env::{CoreEnvironment, Environment, EnvironmentBuilder, Overrides, ShutdownSignal};

// Requests
pub use crate::message::{BinaryRequest, CoreRequest, KeyValueRequest};

// Retry decisions and backoff
pub use crate::retry::{
    BestEffortRetryStrategy, Delay, FailFastRetryStrategy, ObservePoller, RetryExecutor,
    RetryStrategy, TimeUnit,
};

// Error types
pub use crate::error::{CoreError, Result, ShutdownError};
