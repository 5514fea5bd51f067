//! Resolved knob values and the diagnostic snapshot

use std::fmt;

use serde::{Serialize, Serializer};
use zeroize::Zeroizing;

use crate::retry::Delay;

/// Credential wiped from memory on drop and masked in `Debug` and
/// serialized output.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(Zeroizing<String>);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(Zeroizing::new(value.into()))
    }

    #[inline]
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(*****)")
    }
}

impl Serialize for Secret {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str("*****")
    }
}

/// Every overridable knob after resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub dcp_enabled: bool,
    pub ssl_enabled: bool,
    pub ssl_keystore_file: Option<String>,
    pub ssl_keystore_password: Option<Secret>,
    pub query_enabled: bool,
    pub query_port: u16,
    pub bootstrap_http_enabled: bool,
    pub bootstrap_carrier_enabled: bool,
    pub bootstrap_http_direct_port: u16,
    pub bootstrap_http_ssl_port: u16,
    pub bootstrap_carrier_direct_port: u16,
    pub bootstrap_carrier_ssl_port: u16,
    pub io_pool_size: usize,
    pub computation_pool_size: usize,
    pub request_buffer_size: usize,
    pub response_buffer_size: usize,
    pub kv_endpoints: usize,
    pub view_endpoints: usize,
    pub query_endpoints: usize,
    pub package_name_and_version: String,
    pub user_agent: String,
    pub max_request_lifetime_ms: u64,
    pub keep_alive_interval_ms: i64,
    pub autorelease_after_ms: u64,
}

/// Point-in-time view of an environment for logs and diagnostics.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentSnapshot {
    #[serde(flatten)]
    pub settings: Settings,
    pub observe_interval_delay: Delay,
    pub reconnect_delay: Delay,
    pub retry_delay: Delay,
    pub retry_strategy: String,
    pub io_pool_owned: bool,
    pub scheduler_owned: bool,
    pub event_bus_owned: bool,
    pub shutdown: bool,
}
