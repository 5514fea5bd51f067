//! Retry decisions, backoff delays and the drivers that apply them
//!
//! The strategy answers whether to retry, the delay answers how long to
//! wait, and the executor and observe poller combine both under the
//! environment's maximum request lifetime.

pub mod delay;
pub mod executor;
pub mod observe;
pub mod strategy;

// Re-export main types for convenient access
pub use delay::{Delay, DelayKind, TimeUnit};
pub use executor::RetryExecutor;
pub use observe::ObservePoller;
pub use strategy::{BestEffortRetryStrategy, FailFastRetryStrategy, RetryStrategy};
