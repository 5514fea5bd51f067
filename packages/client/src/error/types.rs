use std::time::Duration;

use super::BoxError;

/// A Result alias where the Err case is [`CoreError`].
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors raised by the request, retry and configuration core.
///
/// State and argument violations indicate programmer error and are surfaced
/// immediately. Override parse failures are recovered by the configuration
/// resolver and only ever logged. Exhaustion and observe aborts are terminal
/// for the operation that triggered them.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// An accessor was used before the value it reads was assigned.
    #[error("invalid state: {0}")]
    InvalidState(&'static str),

    /// An argument violated the contract of the operation it was passed to.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A process-wide override value could not be parsed for its knob.
    #[error("could not parse override {knob}={value:?}: {reason}")]
    ConfigOverrideParse {
        knob: &'static str,
        value: String,
        reason: String,
    },

    /// The request outlived the maximum request lifetime.
    #[error("request lifetime exhausted after {attempts} attempts ({elapsed:?})")]
    RetryExhausted { attempts: u32, elapsed: Duration },

    /// An observe sequence stopped at the first node error.
    #[error("observe aborted in round {round}")]
    ObserveAborted {
        round: u32,
        #[source]
        source: BoxError,
    },

    /// The operation failed and the retry strategy declined another attempt.
    #[error("operation failed")]
    Operation(#[source] BoxError),

    /// A default worker pool or scheduler thread could not be started.
    #[error("failed to start worker threads")]
    Io(#[from] std::io::Error),
}

/// Failure cause of a worker pool teardown.
///
/// Cloneable because the shutdown signal is shared between every caller of
/// `Environment::shutdown`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShutdownError {
    #[error("worker pool was already stopped")]
    AlreadyStopped,

    #[error("worker pool teardown failed: {0}")]
    Teardown(String),
}
