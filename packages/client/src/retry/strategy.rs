//! Retry decision contract and the shipped strategies

use std::fmt;

use crate::env::CoreEnvironment;
use crate::message::CoreRequest;

/// Decides whether a failed request is retried.
///
/// Both entry points run on I/O callback threads. Implementations must not
/// block, perform I/O, or mutate the request or the environment; they only
/// answer yes or no. The maximum request lifetime is enforced by the caller
/// independently of the answer.
pub trait RetryStrategy: Send + Sync + fmt::Debug {
    /// Whether `request`, which just failed an attempt, should be retried.
    fn should_retry(&self, request: &dyn CoreRequest, environment: &dyn CoreEnvironment) -> bool;

    /// Whether an observe sequence survives a node-level error.
    ///
    /// `true` swallows the error and starts the next polling round; `false`
    /// aborts the whole sequence at the first error.
    fn should_retry_observe(&self) -> bool;
}

/// Retries everything until the request lifetime runs out.
///
/// This is the default strategy: it favors availability over failing fast.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BestEffortRetryStrategy;

impl RetryStrategy for BestEffortRetryStrategy {
    #[inline]
    fn should_retry(&self, _request: &dyn CoreRequest, _environment: &dyn CoreEnvironment) -> bool {
        true
    }

    #[inline]
    fn should_retry_observe(&self) -> bool {
        true
    }
}

/// Never retries; every failure surfaces on its first occurrence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FailFastRetryStrategy;

impl RetryStrategy for FailFastRetryStrategy {
    #[inline]
    fn should_retry(&self, _request: &dyn CoreRequest, _environment: &dyn CoreEnvironment) -> bool {
        false
    }

    #[inline]
    fn should_retry_observe(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::EnvironmentBuilder;
    use crate::message::{CorrelationIdGenerator, KeyValueRequest};

    #[test]
    fn test_best_effort_always_retries() {
        let env = EnvironmentBuilder::new();
        let ids = CorrelationIdGenerator::new();
        let strategy = BestEffortRetryStrategy;

        for i in 0..1000 {
            let key = (i % 2 == 0).then(|| format!("key-{i}"));
            let request = KeyValueRequest::with_generator(&ids, key, "bucket", None);
            for _ in 0..(i % 5) {
                request.increment_retry_count();
            }
            assert!(strategy.should_retry(&request, &env));
            assert!(strategy.should_retry_observe());
        }
    }

    #[test]
    fn test_fail_fast_never_retries() {
        let env = EnvironmentBuilder::new();
        let request = KeyValueRequest::new(Some("k".to_string()), "bucket", None);
        assert!(!FailFastRetryStrategy.should_retry(&request, &env));
        assert!(!FailFastRetryStrategy.should_retry_observe());
    }
}
