use super::types::CoreError;

impl CoreError {
    /// Returns true if the error signals misuse of a request envelope.
    #[must_use]
    pub fn is_programmer_error(&self) -> bool {
        matches!(self, CoreError::InvalidState(_) | CoreError::InvalidArgument(_))
    }

    /// Returns true if the request ran past its maximum lifetime.
    #[must_use]
    pub fn is_retry_exhausted(&self) -> bool {
        matches!(self, CoreError::RetryExhausted { .. })
    }

    /// Returns true if an observe sequence was aborted early.
    #[must_use]
    pub fn is_observe_aborted(&self) -> bool {
        matches!(self, CoreError::ObserveAborted { .. })
    }

    /// Returns true if the error ends the operation it was raised for.
    ///
    /// Override parse errors are the only recoverable kind; the resolver
    /// falls back to the next source instead of propagating them.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, CoreError::ConfigOverrideParse { .. })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_classification() {
        let state = CoreError::InvalidState("partition not assigned");
        assert!(state.is_programmer_error());
        assert!(state.is_terminal());

        let exhausted = CoreError::RetryExhausted {
            attempts: 3,
            elapsed: Duration::from_millis(75_000),
        };
        assert!(exhausted.is_retry_exhausted());
        assert!(!exhausted.is_programmer_error());

        let parse = CoreError::ConfigOverrideParse {
            knob: "ioPoolSize",
            value: "many".to_string(),
            reason: "invalid digit found in string".to_string(),
        };
        assert!(!parse.is_terminal());
        assert!(parse.to_string().contains("ioPoolSize"));
    }
}
