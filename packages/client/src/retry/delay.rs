//! Deterministic backoff delays
//!
//! A [`Delay`] maps a zero-based attempt index to a wait time. The result is
//! a pure function of the attempt and the delay's parameters, always clamped
//! to `[lower, upper]`, and non-decreasing in the attempt index.

use std::fmt;
use std::time::Duration;

use serde::Serialize;

/// Unit the bounds of a [`Delay`] are expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Nanoseconds,
    Microseconds,
    Milliseconds,
    Seconds,
}

impl TimeUnit {
    /// Convert `amount` of this unit into a [`Duration`].
    #[inline]
    #[must_use]
    pub const fn to_duration(self, amount: u64) -> Duration {
        match self {
            TimeUnit::Nanoseconds => Duration::from_nanos(amount),
            TimeUnit::Microseconds => Duration::from_micros(amount),
            TimeUnit::Milliseconds => Duration::from_millis(amount),
            TimeUnit::Seconds => Duration::from_secs(amount),
        }
    }

    #[inline]
    #[must_use]
    pub const fn suffix(self) -> &'static str {
        match self {
            TimeUnit::Nanoseconds => "ns",
            TimeUnit::Microseconds => "us",
            TimeUnit::Milliseconds => "ms",
            TimeUnit::Seconds => "s",
        }
    }
}

/// Growth curve of a [`Delay`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DelayKind {
    /// Always the lower bound.
    Constant,
    /// `lower + growth * attempt`, capped at `upper`.
    Linear,
    /// `lower * growth^attempt`, capped at `upper`.
    Exponential,
}

/// Backoff delay with a fixed kind, bounds, unit and growth factor.
///
/// Construct through [`Delay::constant`], [`Delay::linear`] or
/// [`Delay::exponential`]. An upper bound below the lower bound is raised to
/// the lower bound, so every computed delay lies within the bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Delay {
    kind: DelayKind,
    lower: u64,
    upper: u64,
    growth: u64,
    unit: TimeUnit,
}

impl Delay {
    /// A delay that always waits `delay` units.
    #[must_use]
    pub const fn constant(unit: TimeUnit, delay: u64) -> Self {
        Self {
            kind: DelayKind::Constant,
            lower: delay,
            upper: delay,
            growth: 0,
            unit,
        }
    }

    /// A delay growing by `step` units per attempt.
    #[must_use]
    pub const fn linear(unit: TimeUnit, lower: u64, upper: u64, step: u64) -> Self {
        Self::bounded(DelayKind::Linear, unit, lower, upper, step)
    }

    /// A delay multiplied by `factor` per attempt.
    #[must_use]
    pub const fn exponential(unit: TimeUnit, lower: u64, upper: u64, factor: u64) -> Self {
        Self::bounded(DelayKind::Exponential, unit, lower, upper, factor)
    }

    const fn bounded(kind: DelayKind, unit: TimeUnit, lower: u64, upper: u64, growth: u64) -> Self {
        Self {
            kind,
            lower,
            upper: if upper < lower { lower } else { upper },
            growth,
            unit,
        }
    }

    /// Delay for the zero-based `attempt`, in this delay's unit.
    ///
    /// Intermediate values saturate instead of overflowing, so once the cap
    /// is reached every later attempt yields exactly `upper`.
    #[must_use]
    pub fn calculate(&self, attempt: u32) -> u64 {
        let raw = match self.kind {
            DelayKind::Constant => self.lower,
            DelayKind::Linear => self
                .lower
                .saturating_add(self.growth.saturating_mul(u64::from(attempt))),
            DelayKind::Exponential => match self.growth {
                // 0^n collapses to zero after the first attempt; hold the floor
                0 | 1 => self.lower,
                factor => match factor.checked_pow(attempt) {
                    Some(multiplier) => self.lower.saturating_mul(multiplier),
                    None => self.upper,
                },
            },
        };
        raw.clamp(self.lower, self.upper)
    }

    /// Delay for the zero-based `attempt` as a [`Duration`].
    #[inline]
    #[must_use]
    pub fn compute(&self, attempt: u32) -> Duration {
        self.unit.to_duration(self.calculate(attempt))
    }

    #[inline]
    #[must_use]
    pub fn kind(&self) -> DelayKind {
        self.kind
    }

    #[inline]
    #[must_use]
    pub fn lower(&self) -> u64 {
        self.lower
    }

    #[inline]
    #[must_use]
    pub fn upper(&self) -> u64 {
        self.upper
    }

    #[inline]
    #[must_use]
    pub fn growth(&self) -> u64 {
        self.growth
    }

    #[inline]
    #[must_use]
    pub fn unit(&self) -> TimeUnit {
        self.unit
    }
}

impl fmt::Display for Delay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unit = self.unit.suffix();
        match self.kind {
            DelayKind::Constant => write!(f, "ConstantDelay{{delay={}{unit}}}", self.lower),
            DelayKind::Linear => write!(
                f,
                "LinearDelay{{lower={}{unit}, upper={}{unit}, step={}}}",
                self.lower, self.upper, self.growth
            ),
            DelayKind::Exponential => write!(
                f,
                "ExponentialDelay{{lower={}{unit}, upper={}{unit}, factor={}}}",
                self.lower, self.upper, self.growth
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_ignores_attempt() {
        let delay = Delay::constant(TimeUnit::Milliseconds, 250);
        for attempt in [0, 1, 7, u32::MAX] {
            assert_eq!(delay.compute(attempt), Duration::from_millis(250));
        }
    }

    #[test]
    fn test_linear_steps_then_caps() {
        let delay = Delay::linear(TimeUnit::Milliseconds, 10, 35, 10);
        let values: Vec<u64> = (0..6).map(|a| delay.calculate(a)).collect();
        assert_eq!(values, vec![10, 20, 30, 35, 35, 35]);
        assert_eq!(delay.calculate(u32::MAX), 35);
    }

    #[test]
    fn test_exponential_non_decreasing_and_capped() {
        let delay = Delay::exponential(TimeUnit::Microseconds, 100, 100_000, 10);
        assert_eq!(delay.calculate(0), 100);
        assert_eq!(delay.calculate(1), 1_000);
        assert_eq!(delay.calculate(3), 100_000);

        let mut previous = 0;
        let mut capped_at = None;
        for attempt in 0..200 {
            let value = delay.calculate(attempt);
            assert!(value >= previous, "attempt {attempt} decreased");
            assert!((delay.lower()..=delay.upper()).contains(&value));
            if let Some(first) = capped_at {
                assert!(attempt > first);
                assert_eq!(value, delay.upper());
            } else if value == delay.upper() {
                capped_at = Some(attempt);
            }
            previous = value;
        }
        assert_eq!(capped_at, Some(3));
    }

    #[test]
    fn test_exponential_degenerate_factors_hold_floor() {
        for factor in [0, 1] {
            let delay = Delay::exponential(TimeUnit::Milliseconds, 5, 50, factor);
            assert!((0..10).all(|a| delay.calculate(a) == 5));
        }
    }

    #[test]
    fn test_upper_below_lower_is_raised() {
        let delay = Delay::exponential(TimeUnit::Milliseconds, 40, 10, 2);
        assert_eq!(delay.upper(), 40);
        assert_eq!(delay.calculate(0), 40);
        assert_eq!(delay.calculate(9), 40);
    }

    #[test]
    fn test_equality_and_display() {
        let a = Delay::exponential(TimeUnit::Milliseconds, 32, 4096, 32);
        let b = Delay::exponential(TimeUnit::Milliseconds, 32, 4096, 32);
        assert_eq!(a, b);
        assert_ne!(a, Delay::linear(TimeUnit::Milliseconds, 32, 4096, 32));
        assert_eq!(a.to_string(), "ExponentialDelay{lower=32ms, upper=4096ms, factor=32}");
        assert_eq!(
            Delay::constant(TimeUnit::Seconds, 1).to_string(),
            "ConstantDelay{delay=1s}"
        );
    }
}
