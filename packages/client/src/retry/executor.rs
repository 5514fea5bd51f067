use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

use crate::env::CoreEnvironment;
use crate::error::{BoxError, CoreError, Result};
use crate::message::CoreRequest;

/// Drives a request through repeated attempts under an environment's
/// retry strategy, retry delay and maximum request lifetime.
///
/// The lifetime is checked before the strategy is consulted, so a strategy
/// that always answers "retry" still stops once the deadline passes.
pub struct RetryExecutor<'env> {
    environment: &'env dyn CoreEnvironment,
}

impl<'env> RetryExecutor<'env> {
    /// Create an executor reading its policy from `environment`
    pub fn new(environment: &'env dyn CoreEnvironment) -> Self {
        Self { environment }
    }

    /// Run `operation` against `request` until it succeeds, the strategy
    /// declines another attempt, or the request outlives its lifetime.
    ///
    /// # Errors
    ///
    /// - `CoreError::Operation` wrapping the triggering error when the
    ///   strategy declines a retry
    /// - `CoreError::RetryExhausted` when the maximum request lifetime has
    ///   elapsed
    pub async fn execute<R, T, E, F, Fut>(&self, request: &R, mut operation: F) -> Result<T>
    where
        R: CoreRequest,
        F: FnMut(&R) -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
        E: Into<BoxError>,
    {
        let strategy = self.environment.retry_strategy();
        let delay = self.environment.retry_delay();
        let lifetime = self.environment.max_request_lifetime();
        // Measured on the tokio clock, like every sleep below
        let created = Instant::from_std(request.creation_time());

        loop {
            let error = match operation(request).await {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };

            let elapsed = created.elapsed();
            if elapsed >= lifetime {
                return Err(exhausted(request, request.retry_count().saturating_add(1), elapsed));
            }

            if !strategy.should_retry(request, self.environment) {
                tracing::debug!(retries = request.retry_count(), "retry declined by strategy");
                return Err(CoreError::Operation(error.into()));
            }

            // Never sleep past the deadline
            let wait = delay.compute(request.retry_count()).min(lifetime - elapsed);
            tracing::trace!(
                retries = request.retry_count(),
                wait_us = wait.as_micros() as u64,
                "retry scheduled"
            );
            tokio::time::sleep(wait).await;
            request.increment_retry_count();

            let elapsed = created.elapsed();
            if elapsed >= lifetime {
                return Err(exhausted(request, request.retry_count(), elapsed));
            }
        }
    }
}

fn exhausted<R: CoreRequest>(request: &R, attempts: u32, elapsed: Duration) -> CoreError {
    tracing::debug!(
        retries = request.retry_count(),
        elapsed_ms = elapsed.as_millis() as u64,
        "request lifetime exhausted"
    );
    CoreError::RetryExhausted { attempts, elapsed }
}
