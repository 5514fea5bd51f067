//! Consistency polling across replica nodes
//!
//! An observe sequence confirms that a mutation reached every node it must
//! be persisted or replicated to. Each round probes all nodes; the sequence
//! completes when one round sees every node confirm. Node errors are either
//! swallowed (the round is abandoned and the next one starts) or abort the
//! sequence, depending on [`RetryStrategy::should_retry_observe`].
//!
//! [`RetryStrategy::should_retry_observe`]: super::RetryStrategy::should_retry_observe

use std::future::Future;

use tokio::time::Instant;

use crate::env::CoreEnvironment;
use crate::error::{BoxError, CoreError, Result};

/// Polls a set of nodes until they all confirm, under an environment's
/// observe strategy, observe interval delay and maximum request lifetime.
pub struct ObservePoller<'env> {
    environment: &'env dyn CoreEnvironment,
}

impl<'env> ObservePoller<'env> {
    pub fn new(environment: &'env dyn CoreEnvironment) -> Self {
        Self { environment }
    }

    /// Probe `nodes` round by round until every node confirms.
    ///
    /// `probe` receives the node and the zero-based round and resolves to
    /// `Ok(true)` once that node has the mutation, `Ok(false)` while it does
    /// not yet, or an error. Returns the number of rounds polled.
    ///
    /// # Errors
    ///
    /// - `CoreError::ObserveAborted` at the first node error when the
    ///   strategy does not retry observes
    /// - `CoreError::RetryExhausted` when the maximum request lifetime
    ///   elapses before all nodes confirm
    pub async fn poll<N, F, Fut, E>(&self, nodes: &[N], mut probe: F) -> Result<u32>
    where
        F: FnMut(&N, u32) -> Fut,
        Fut: Future<Output = std::result::Result<bool, E>>,
        E: Into<BoxError>,
    {
        let strategy = self.environment.retry_strategy();
        let interval = self.environment.observe_interval_delay();
        let lifetime = self.environment.max_request_lifetime();
        let started = Instant::now();
        let mut round: u32 = 0;

        loop {
            let mut confirmed = true;
            for node in nodes {
                match probe(node, round).await {
                    Ok(true) => {}
                    Ok(false) => confirmed = false,
                    Err(error) => {
                        if !strategy.should_retry_observe() {
                            tracing::debug!(round, "observe aborted on node error");
                            return Err(CoreError::ObserveAborted {
                                round,
                                source: error.into(),
                            });
                        }
                        let error: BoxError = error.into();
                        tracing::debug!(round, %error, "observe node error swallowed");
                        confirmed = false;
                        break;
                    }
                }
            }

            if confirmed {
                return Ok(round + 1);
            }

            let elapsed = started.elapsed();
            if elapsed >= lifetime {
                return Err(CoreError::RetryExhausted {
                    attempts: round + 1,
                    elapsed,
                });
            }

            tokio::time::sleep(interval.compute(round).min(lifetime - elapsed)).await;
            round = round.saturating_add(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::env::EnvironmentBuilder;
    use crate::retry::{Delay, FailFastRetryStrategy, TimeUnit};

    #[derive(Debug, thiserror::Error)]
    #[error("partition not active on node {0}")]
    struct NotMyPartition(usize);

    fn fast_env() -> EnvironmentBuilder {
        EnvironmentBuilder::new()
            .with_observe_interval_delay(Delay::constant(TimeUnit::Microseconds, 10))
    }

    #[tokio::test]
    async fn test_completes_when_all_nodes_confirm() {
        let env = fast_env();
        let nodes = [0usize, 1, 2];
        let rounds = ObservePoller::new(&env)
            .poll(&nodes, |node, round| {
                let ready = round >= *node as u32;
                async move { Ok::<_, NotMyPartition>(ready) }
            })
            .await
            .unwrap_or_else(|e| panic!("observe failed: {e}"));
        assert_eq!(rounds, 3);
    }

    #[tokio::test]
    async fn test_swallows_errors_with_best_effort() {
        let env = fast_env();
        let nodes = [0usize, 1];
        let rounds = ObservePoller::new(&env)
            .poll(&nodes, |node, round| {
                let outcome = if *node == 1 && round < 2 {
                    Err(NotMyPartition(*node))
                } else {
                    Ok(true)
                };
                async move { outcome }
            })
            .await
            .unwrap_or_else(|e| panic!("observe failed: {e}"));
        assert_eq!(rounds, 3);
    }

    #[tokio::test]
    async fn test_aborts_on_first_error_with_fail_fast() {
        let env = fast_env().with_retry_strategy(Arc::new(FailFastRetryStrategy));
        let nodes = [0usize, 1, 2];
        let result = ObservePoller::new(&env)
            .poll(&nodes, |node, _| {
                let outcome = if *node == 1 { Err(NotMyPartition(*node)) } else { Ok(false) };
                async move { outcome }
            })
            .await;

        match result {
            Err(CoreError::ObserveAborted { round, source }) => {
                assert_eq!(round, 0);
                assert_eq!(source.to_string(), "partition not active on node 1");
            }
            other => panic!("expected ObserveAborted, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_gives_up_at_lifetime() {
        let env = fast_env().with_max_request_lifetime(Duration::from_millis(20));
        let result = ObservePoller::new(&env)
            .poll(&[0usize], |_, _| async { Ok::<_, NotMyPartition>(false) })
            .await;
        assert!(matches!(result, Err(CoreError::RetryExhausted { .. })));
    }
}
