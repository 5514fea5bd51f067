//! Process-wide configuration overrides
//!
//! Overrides sit between builder values and compiled-in defaults. A value
//! that fails to parse is logged and ignored, so a bad override never stops
//! an environment from being built.

use std::sync::{Arc, OnceLock};

use dashmap::DashMap;

use super::knob::Knob;
use super::settings::Secret;
use crate::error::{CoreError, Result};

/// Namespace every override key lives under.
pub const NAMESPACE: &str = "kvlink.";

/// Parsing of raw override strings into knob values.
pub trait FromOverride: Sized {
    /// # Errors
    ///
    /// Returns a human-readable reason when `raw` is not a valid value.
    fn from_override(raw: &str) -> std::result::Result<Self, String>;
}

impl FromOverride for bool {
    fn from_override(raw: &str) -> std::result::Result<Self, String> {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case("true") {
            Ok(true)
        } else if raw.eq_ignore_ascii_case("false") {
            Ok(false)
        } else {
            Err("expected true or false".to_string())
        }
    }
}

macro_rules! numeric_override {
    ($($ty:ty),*) => {
        $(
            impl FromOverride for $ty {
                fn from_override(raw: &str) -> std::result::Result<Self, String> {
                    raw.trim().parse::<$ty>().map_err(|e| e.to_string())
                }
            }
        )*
    };
}

numeric_override!(u16, usize, u64, i64);

impl FromOverride for String {
    fn from_override(raw: &str) -> std::result::Result<Self, String> {
        Ok(raw.to_string())
    }
}

impl FromOverride for Secret {
    fn from_override(raw: &str) -> std::result::Result<Self, String> {
        Ok(Secret::new(raw))
    }
}

impl<T: FromOverride> FromOverride for Option<T> {
    fn from_override(raw: &str) -> std::result::Result<Self, String> {
        T::from_override(raw).map(Some)
    }
}

/// Concurrent table of override values keyed by knob.
///
/// Cloning shares the table. [`Overrides::process`] is the instance used
/// when a builder is not given one explicitly.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    values: Arc<DashMap<Knob, String>>,
}

impl Overrides {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide table, seeded from the environment on first use.
    pub fn process() -> &'static Overrides {
        static PROCESS: OnceLock<Overrides> = OnceLock::new();
        PROCESS.get_or_init(Overrides::from_env)
    }

    /// A table holding every `KVLINK_*` variable that names a known knob.
    pub fn from_env() -> Self {
        let overrides = Self::new();
        for knob in Knob::ALL {
            if let Ok(value) = std::env::var(knob.env_var()) {
                overrides.set(knob, value);
            }
        }
        overrides
    }

    /// A table built from `key=value` pairs; keys may carry the namespace.
    ///
    /// Unknown keys are skipped.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        let overrides = Self::new();
        for (key, value) in pairs {
            match Knob::from_key(key.as_ref()) {
                Some(knob) => overrides.set(knob, value),
                None => tracing::debug!(key = key.as_ref(), "ignoring unknown override key"),
            }
        }
        overrides
    }

    pub fn set(&self, knob: Knob, value: impl Into<String>) {
        self.values.insert(knob, value.into());
    }

    pub fn remove(&self, knob: Knob) -> Option<String> {
        self.values.remove(&knob).map(|(_, value)| value)
    }

    pub fn get(&self, knob: Knob) -> Option<String> {
        self.values.get(&knob).map(|value| value.clone())
    }

    pub fn clear(&self) {
        self.values.clear();
    }

    /// Parse the override for `knob`, if one is set.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::ConfigOverrideParse` if the value is malformed.
    pub fn parse<T: FromOverride>(&self, knob: Knob) -> Option<Result<T>> {
        let raw = self.get(knob)?;
        Some(T::from_override(&raw).map_err(|reason| CoreError::ConfigOverrideParse {
            knob: knob.name(),
            value: raw,
            reason,
        }))
    }

    /// Resolve a knob: `explicit`, else a parseable override, else `default`.
    pub fn resolve<T: FromOverride>(
        &self,
        knob: Knob,
        explicit: Option<T>,
        default: impl FnOnce() -> T,
    ) -> T {
        self.resolve_valid(knob, explicit, default, |_| true)
    }

    /// Like [`resolve`](Self::resolve), but values rejected by `valid` are
    /// treated as unset and resolution falls through to the next source.
    pub fn resolve_valid<T: FromOverride>(
        &self,
        knob: Knob,
        explicit: Option<T>,
        default: impl FnOnce() -> T,
        valid: impl Fn(&T) -> bool,
    ) -> T {
        match explicit {
            Some(value) if valid(&value) => return value,
            Some(_) => tracing::warn!(knob = %knob, "ignoring invalid builder value"),
            None => {}
        }
        match self.parse(knob) {
            Some(Ok(value)) if valid(&value) => value,
            Some(Ok(_)) => {
                tracing::warn!(knob = %knob, "ignoring out-of-range override, using default");
                default()
            }
            Some(Err(error)) => {
                tracing::warn!(knob = %knob, %error, "ignoring malformed override, using default");
                default()
            }
            None => default(),
        }
    }
}
