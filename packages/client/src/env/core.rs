//! Read accessors shared by the builder and the built environment

use std::sync::Arc;
use std::time::Duration;

use crate::retry::{Delay, RetryStrategy};

/// Read-only view of every environment knob.
///
/// Implemented by [`Environment`](super::Environment), which reports the
/// resolved values, and by [`EnvironmentBuilder`](super::EnvironmentBuilder),
/// which reports explicit values or defaults so partially configured
/// builders can derive further settings.
pub trait CoreEnvironment: Send + Sync {
    fn dcp_enabled(&self) -> bool;
    fn ssl_enabled(&self) -> bool;
    fn ssl_keystore_file(&self) -> Option<&str>;
    fn ssl_keystore_password(&self) -> Option<&str>;
    fn query_enabled(&self) -> bool;
    fn query_port(&self) -> u16;
    fn bootstrap_http_enabled(&self) -> bool;
    fn bootstrap_carrier_enabled(&self) -> bool;
    fn bootstrap_http_direct_port(&self) -> u16;
    fn bootstrap_http_ssl_port(&self) -> u16;
    fn bootstrap_carrier_direct_port(&self) -> u16;
    fn bootstrap_carrier_ssl_port(&self) -> u16;
    fn io_pool_size(&self) -> usize;
    fn computation_pool_size(&self) -> usize;
    fn request_buffer_size(&self) -> usize;
    fn response_buffer_size(&self) -> usize;
    fn kv_endpoints(&self) -> usize;
    fn view_endpoints(&self) -> usize;
    fn query_endpoints(&self) -> usize;
    fn package_name_and_version(&self) -> &str;
    fn user_agent(&self) -> &str;
    fn observe_interval_delay(&self) -> Delay;
    fn reconnect_delay(&self) -> Delay;
    fn retry_delay(&self) -> Delay;
    fn retry_strategy(&self) -> Arc<dyn RetryStrategy>;
    fn max_request_lifetime(&self) -> Duration;

    /// Raw keep-alive interval in milliseconds; `<= 0` disables it.
    fn keep_alive_interval_ms(&self) -> i64;

    fn autorelease_after(&self) -> Duration;

    /// Idle time after which services send keep-alives, if enabled.
    fn keep_alive_interval(&self) -> Option<Duration> {
        u64::try_from(self.keep_alive_interval_ms())
            .ok()
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
    }
}
