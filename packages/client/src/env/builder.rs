//! Mutable builder for [`Environment`]
//!
//! Every setter records an explicit value, which takes precedence over
//! process-wide overrides and compiled-in defaults when the environment is
//! built. Setters can be called any number of times before `build`.

use std::sync::Arc;
use std::time::Duration;

use super::core::CoreEnvironment;
use super::defaults;
use super::environment::Environment;
use super::event::EventBus;
use super::overrides::Overrides;
use super::pool::WorkerPool;
use super::scheduler::Scheduler;
use super::settings::Secret;
use crate::error::Result;
use crate::retry::{BestEffortRetryStrategy, Delay, RetryStrategy};

/// Builder collecting explicit knob values and shared resources.
#[derive(Debug, Clone, Default)]
pub struct EnvironmentBuilder {
    pub(super) dcp_enabled: Option<bool>,
    pub(super) ssl_enabled: Option<bool>,
    pub(super) ssl_keystore_file: Option<String>,
    pub(super) ssl_keystore_password: Option<Secret>,
    pub(super) query_enabled: Option<bool>,
    pub(super) query_port: Option<u16>,
    pub(super) bootstrap_http_enabled: Option<bool>,
    pub(super) bootstrap_carrier_enabled: Option<bool>,
    pub(super) bootstrap_http_direct_port: Option<u16>,
    pub(super) bootstrap_http_ssl_port: Option<u16>,
    pub(super) bootstrap_carrier_direct_port: Option<u16>,
    pub(super) bootstrap_carrier_ssl_port: Option<u16>,
    pub(super) io_pool_size: Option<usize>,
    pub(super) computation_pool_size: Option<usize>,
    pub(super) request_buffer_size: Option<usize>,
    pub(super) response_buffer_size: Option<usize>,
    pub(super) kv_endpoints: Option<usize>,
    pub(super) view_endpoints: Option<usize>,
    pub(super) query_endpoints: Option<usize>,
    pub(super) package_name_and_version: Option<String>,
    pub(super) user_agent: Option<String>,
    pub(super) observe_interval_delay: Option<Delay>,
    pub(super) reconnect_delay: Option<Delay>,
    pub(super) retry_delay: Option<Delay>,
    pub(super) retry_strategy: Option<Arc<dyn RetryStrategy>>,
    pub(super) max_request_lifetime_ms: Option<u64>,
    pub(super) keep_alive_interval_ms: Option<i64>,
    pub(super) autorelease_after_ms: Option<u64>,
    pub(super) io_pool: Option<Arc<dyn WorkerPool>>,
    pub(super) scheduler: Option<Arc<dyn Scheduler>>,
    pub(super) event_bus: Option<Arc<dyn EventBus>>,
    pub(super) overrides: Option<Overrides>,
}

impl EnvironmentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve every knob and start the resources not supplied explicitly.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Io` if a default worker pool or scheduler thread
    /// cannot be started.
    pub fn build(&self) -> Result<Environment> {
        Environment::from_builder(self)
    }

    /// Enable DCP streaming (server versions >= 3.0 only).
    pub fn with_dcp_enabled(mut self, enabled: bool) -> Self {
        self.dcp_enabled = Some(enabled);
        self
    }

    pub fn with_ssl_enabled(mut self, enabled: bool) -> Self {
        self.ssl_enabled = Some(enabled);
        self
    }

    pub fn with_ssl_keystore_file(mut self, path: impl Into<String>) -> Self {
        self.ssl_keystore_file = Some(path.into());
        self
    }

    pub fn with_ssl_keystore_password(mut self, password: impl Into<String>) -> Self {
        self.ssl_keystore_password = Some(Secret::new(password));
        self
    }

    pub fn with_query_enabled(mut self, enabled: bool) -> Self {
        self.query_enabled = Some(enabled);
        self
    }

    pub fn with_query_port(mut self, port: u16) -> Self {
        self.query_port = Some(port);
        self
    }

    pub fn with_bootstrap_http_enabled(mut self, enabled: bool) -> Self {
        self.bootstrap_http_enabled = Some(enabled);
        self
    }

    pub fn with_bootstrap_carrier_enabled(mut self, enabled: bool) -> Self {
        self.bootstrap_carrier_enabled = Some(enabled);
        self
    }

    pub fn with_bootstrap_http_direct_port(mut self, port: u16) -> Self {
        self.bootstrap_http_direct_port = Some(port);
        self
    }

    pub fn with_bootstrap_http_ssl_port(mut self, port: u16) -> Self {
        self.bootstrap_http_ssl_port = Some(port);
        self
    }

    pub fn with_bootstrap_carrier_direct_port(mut self, port: u16) -> Self {
        self.bootstrap_carrier_direct_port = Some(port);
        self
    }

    pub fn with_bootstrap_carrier_ssl_port(mut self, port: u16) -> Self {
        self.bootstrap_carrier_ssl_port = Some(port);
        self
    }

    /// Worker threads of the default I/O pool. Zero selects the default.
    ///
    /// Ignored for pool creation when a pool is supplied with
    /// [`with_io_pool`](Self::with_io_pool).
    pub fn with_io_pool_size(mut self, size: usize) -> Self {
        self.io_pool_size = Some(size);
        self
    }

    pub fn with_computation_pool_size(mut self, size: usize) -> Self {
        self.computation_pool_size = Some(size);
        self
    }

    pub fn with_request_buffer_size(mut self, size: usize) -> Self {
        self.request_buffer_size = Some(size);
        self
    }

    pub fn with_response_buffer_size(mut self, size: usize) -> Self {
        self.response_buffer_size = Some(size);
        self
    }

    /// Key-value endpoints opened per node.
    pub fn with_kv_endpoints(mut self, endpoints: usize) -> Self {
        self.kv_endpoints = Some(endpoints);
        self
    }

    pub fn with_view_endpoints(mut self, endpoints: usize) -> Self {
        self.view_endpoints = Some(endpoints);
        self
    }

    pub fn with_query_endpoints(mut self, endpoints: usize) -> Self {
        self.query_endpoints = Some(endpoints);
        self
    }

    pub fn with_package_name_and_version(mut self, value: impl Into<String>) -> Self {
        self.package_name_and_version = Some(value.into());
        self
    }

    pub fn with_user_agent(mut self, value: impl Into<String>) -> Self {
        self.user_agent = Some(value.into());
        self
    }

    /// Delay between observe polling rounds.
    pub fn with_observe_interval_delay(mut self, delay: Delay) -> Self {
        self.observe_interval_delay = Some(delay);
        self
    }

    /// Delay between node reconnect attempts.
    pub fn with_reconnect_delay(mut self, delay: Delay) -> Self {
        self.reconnect_delay = Some(delay);
        self
    }

    /// Delay between request retries.
    pub fn with_retry_delay(mut self, delay: Delay) -> Self {
        self.retry_delay = Some(delay);
        self
    }

    pub fn with_retry_strategy(mut self, strategy: Arc<dyn RetryStrategy>) -> Self {
        self.retry_strategy = Some(strategy);
        self
    }

    /// Upper bound on how long a request may live, retries included.
    ///
    /// Keep it longer than any operation timeout; it is the backstop that
    /// cancels requests a best-effort strategy would retry forever.
    pub fn with_max_request_lifetime(mut self, lifetime: Duration) -> Self {
        self.max_request_lifetime_ms = Some(saturating_millis(lifetime));
        self
    }

    /// Idle time before keep-alives are sent; `None` disables them.
    pub fn with_keep_alive_interval(mut self, interval: Option<Duration>) -> Self {
        self.keep_alive_interval_ms = Some(interval.map_or(0, |i| {
            i64::try_from(i.as_millis()).unwrap_or(i64::MAX)
        }));
        self
    }

    pub fn with_autorelease_after(mut self, after: Duration) -> Self {
        self.autorelease_after_ms = Some(saturating_millis(after));
        self
    }

    /// Use `pool` instead of starting one. The environment never shuts down
    /// a pool it was given.
    pub fn with_io_pool(mut self, pool: Arc<dyn WorkerPool>) -> Self {
        self.io_pool = Some(pool);
        self
    }

    pub fn with_scheduler(mut self, scheduler: Arc<dyn Scheduler>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    pub fn with_event_bus(mut self, bus: Arc<dyn EventBus>) -> Self {
        self.event_bus = Some(bus);
        self
    }

    /// Resolve overrides from `overrides` instead of the process-wide table.
    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        self.overrides = Some(overrides);
        self
    }

    pub fn io_pool(&self) -> Option<&Arc<dyn WorkerPool>> {
        self.io_pool.as_ref()
    }

    pub fn scheduler(&self) -> Option<&Arc<dyn Scheduler>> {
        self.scheduler.as_ref()
    }

    pub fn event_bus(&self) -> Option<&Arc<dyn EventBus>> {
        self.event_bus.as_ref()
    }

    pub(super) fn overrides_or_process(&self) -> Overrides {
        self.overrides
            .clone()
            .unwrap_or_else(|| Overrides::process().clone())
    }
}

fn saturating_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl CoreEnvironment for EnvironmentBuilder {
    fn dcp_enabled(&self) -> bool {
        self.dcp_enabled.unwrap_or(defaults::DCP_ENABLED)
    }

    fn ssl_enabled(&self) -> bool {
        self.ssl_enabled.unwrap_or(defaults::SSL_ENABLED)
    }

    fn ssl_keystore_file(&self) -> Option<&str> {
        self.ssl_keystore_file.as_deref()
    }

    fn ssl_keystore_password(&self) -> Option<&str> {
        self.ssl_keystore_password.as_ref().map(Secret::expose)
    }

    fn query_enabled(&self) -> bool {
        self.query_enabled.unwrap_or(defaults::QUERY_ENABLED)
    }

    fn query_port(&self) -> u16 {
        self.query_port.unwrap_or(defaults::QUERY_PORT)
    }

    fn bootstrap_http_enabled(&self) -> bool {
        self.bootstrap_http_enabled
            .unwrap_or(defaults::BOOTSTRAP_HTTP_ENABLED)
    }

    fn bootstrap_carrier_enabled(&self) -> bool {
        self.bootstrap_carrier_enabled
            .unwrap_or(defaults::BOOTSTRAP_CARRIER_ENABLED)
    }

    fn bootstrap_http_direct_port(&self) -> u16 {
        self.bootstrap_http_direct_port
            .unwrap_or(defaults::BOOTSTRAP_HTTP_DIRECT_PORT)
    }

    fn bootstrap_http_ssl_port(&self) -> u16 {
        self.bootstrap_http_ssl_port
            .unwrap_or(defaults::BOOTSTRAP_HTTP_SSL_PORT)
    }

    fn bootstrap_carrier_direct_port(&self) -> u16 {
        self.bootstrap_carrier_direct_port
            .unwrap_or(defaults::BOOTSTRAP_CARRIER_DIRECT_PORT)
    }

    fn bootstrap_carrier_ssl_port(&self) -> u16 {
        self.bootstrap_carrier_ssl_port
            .unwrap_or(defaults::BOOTSTRAP_CARRIER_SSL_PORT)
    }

    fn io_pool_size(&self) -> usize {
        self.io_pool_size
            .filter(|size| *size > 0)
            .unwrap_or_else(defaults::pool_size)
    }

    fn computation_pool_size(&self) -> usize {
        self.computation_pool_size
            .filter(|size| *size > 0)
            .unwrap_or_else(defaults::pool_size)
    }

    fn request_buffer_size(&self) -> usize {
        self.request_buffer_size
            .unwrap_or(defaults::REQUEST_BUFFER_SIZE)
    }

    fn response_buffer_size(&self) -> usize {
        self.response_buffer_size
            .unwrap_or(defaults::RESPONSE_BUFFER_SIZE)
    }

    fn kv_endpoints(&self) -> usize {
        self.kv_endpoints.unwrap_or(defaults::KEYVALUE_ENDPOINTS)
    }

    fn view_endpoints(&self) -> usize {
        self.view_endpoints.unwrap_or(defaults::VIEW_ENDPOINTS)
    }

    fn query_endpoints(&self) -> usize {
        self.query_endpoints.unwrap_or(defaults::QUERY_ENDPOINTS)
    }

    fn package_name_and_version(&self) -> &str {
        self.package_name_and_version
            .as_deref()
            .unwrap_or_else(|| defaults::package_name_and_version())
    }

    fn user_agent(&self) -> &str {
        self.user_agent
            .as_deref()
            .unwrap_or_else(|| defaults::user_agent())
    }

    fn observe_interval_delay(&self) -> Delay {
        self.observe_interval_delay
            .unwrap_or(defaults::OBSERVE_INTERVAL_DELAY)
    }

    fn reconnect_delay(&self) -> Delay {
        self.reconnect_delay.unwrap_or(defaults::RECONNECT_DELAY)
    }

    fn retry_delay(&self) -> Delay {
        self.retry_delay.unwrap_or(defaults::RETRY_DELAY)
    }

    fn retry_strategy(&self) -> Arc<dyn RetryStrategy> {
        self.retry_strategy
            .clone()
            .unwrap_or_else(|| Arc::new(BestEffortRetryStrategy))
    }

    fn max_request_lifetime(&self) -> Duration {
        Duration::from_millis(
            self.max_request_lifetime_ms
                .unwrap_or(defaults::MAX_REQUEST_LIFETIME_MS),
        )
    }

    fn keep_alive_interval_ms(&self) -> i64 {
        self.keep_alive_interval_ms
            .unwrap_or(defaults::KEEP_ALIVE_INTERVAL_MS)
    }

    fn autorelease_after(&self) -> Duration {
        Duration::from_millis(
            self.autorelease_after_ms
                .unwrap_or(defaults::AUTORELEASE_AFTER_MS),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::{FailFastRetryStrategy, TimeUnit};

    #[test]
    fn test_builder_reports_defaults() {
        let builder = EnvironmentBuilder::new();
        assert_eq!(builder.request_buffer_size(), 16384);
        assert_eq!(builder.response_buffer_size(), 16384);
        assert_eq!(builder.kv_endpoints(), 1);
        assert_eq!(builder.io_pool_size(), defaults::pool_size());
        assert_eq!(builder.max_request_lifetime(), Duration::from_secs(75));
        assert_eq!(builder.keep_alive_interval(), Some(Duration::from_secs(30)));
        assert_eq!(builder.autorelease_after(), Duration::from_secs(2));
        assert_eq!(builder.retry_delay(), defaults::RETRY_DELAY);
        assert_eq!(builder.reconnect_delay().compute(0), Duration::from_millis(32));
        assert_eq!(builder.observe_interval_delay().compute(0), Duration::from_micros(100));
        assert!(builder.retry_strategy().should_retry_observe());
        assert!(builder.user_agent().starts_with(builder.package_name_and_version()));
    }

    #[test]
    fn test_identity_accessors_explicit_and_default() {
        let builder = EnvironmentBuilder::new();
        assert_eq!(builder.package_name_and_version(), defaults::package_name_and_version());
        assert_eq!(builder.user_agent(), defaults::user_agent());

        let builder = builder
            .with_package_name_and_version("acme-app/2.1")
            .with_user_agent("acme-agent");
        assert_eq!(builder.package_name_and_version(), "acme-app/2.1");
        assert_eq!(builder.user_agent(), "acme-agent");
    }

    #[test]
    fn test_zero_pool_sizes_report_default() {
        let builder = EnvironmentBuilder::new()
            .with_io_pool_size(0)
            .with_computation_pool_size(0);
        assert_eq!(builder.io_pool_size(), defaults::pool_size());
        assert_eq!(builder.computation_pool_size(), defaults::pool_size());
    }

    #[test]
    fn test_setters_are_re_settable() {
        let builder = EnvironmentBuilder::new()
            .with_kv_endpoints(2)
            .with_kv_endpoints(4)
            .with_retry_delay(Delay::constant(TimeUnit::Milliseconds, 1))
            .with_retry_strategy(Arc::new(FailFastRetryStrategy))
            .with_keep_alive_interval(None);

        assert_eq!(builder.kv_endpoints(), 4);
        assert_eq!(builder.retry_delay(), Delay::constant(TimeUnit::Milliseconds, 1));
        assert!(!builder.retry_strategy().should_retry_observe());
        assert_eq!(builder.keep_alive_interval(), None);
        assert_eq!(builder.keep_alive_interval_ms(), 0);
    }
}
