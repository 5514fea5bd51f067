//! The immutable, built environment

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use futures::FutureExt;
use futures::future::{self, BoxFuture, Shared};

use super::builder::EnvironmentBuilder;
use super::core::CoreEnvironment;
use super::defaults;
use super::event::{BroadcastEventBus, CoreEvent, EventBus};
use super::knob::Knob;
use super::pool::{IoPool, WorkerPool};
use super::scheduler::{ComputationScheduler, Scheduler};
use super::settings::{EnvironmentSnapshot, Secret, Settings};
use crate::error::{Result, ShutdownError};
use crate::retry::{Delay, RetryStrategy};

/// Completion signal of [`Environment::shutdown`].
///
/// Cloneable and shareable; every clone resolves to the same outcome.
pub type ShutdownSignal = Shared<BoxFuture<'static, std::result::Result<(), ShutdownError>>>;

/// Whether the environment created a resource or was handed it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    Owned,
    Borrowed,
}

static LIVE_INSTANCES: AtomicUsize = AtomicUsize::new(0);

/// Number of environments currently alive in this process.
pub fn live_instances() -> usize {
    LIVE_INSTANCES.load(Ordering::Acquire)
}

#[doc(hidden)]
pub fn reset_instance_counter() {
    LIVE_INSTANCES.store(0, Ordering::Release);
}

/// Immutable snapshot of operational knobs plus the shared resources the
/// dispatch loop and endpoints run on.
///
/// Build one early, before traffic starts, and share it. Knob values never
/// change after `build`; a new configuration needs a new environment.
pub struct Environment {
    settings: Settings,
    observe_interval_delay: Delay,
    reconnect_delay: Delay,
    retry_delay: Delay,
    retry_strategy: Arc<dyn RetryStrategy>,
    io_pool: Arc<dyn WorkerPool>,
    io_pool_provenance: Provenance,
    scheduler: Arc<dyn Scheduler>,
    scheduler_provenance: Provenance,
    event_bus: Arc<dyn EventBus>,
    event_bus_provenance: Provenance,
    shutdown: OnceLock<ShutdownSignal>,
}

impl Environment {
    /// Build an environment from defaults and process-wide overrides.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Io` if the default pools cannot be started.
    pub fn create() -> Result<Self> {
        EnvironmentBuilder::new().build()
    }

    pub fn builder() -> EnvironmentBuilder {
        EnvironmentBuilder::new()
    }

    pub(super) fn from_builder(builder: &EnvironmentBuilder) -> Result<Self> {
        let settings = resolve_settings(builder);

        let (io_pool, io_pool_provenance) = match builder.io_pool() {
            Some(pool) => (Arc::clone(pool), Provenance::Borrowed),
            None => (
                Arc::new(IoPool::new(settings.io_pool_size)?) as Arc<dyn WorkerPool>,
                Provenance::Owned,
            ),
        };
        let (scheduler, scheduler_provenance) = match builder.scheduler() {
            Some(scheduler) => (Arc::clone(scheduler), Provenance::Borrowed),
            None => (
                Arc::new(ComputationScheduler::new(settings.computation_pool_size)?)
                    as Arc<dyn Scheduler>,
                Provenance::Owned,
            ),
        };
        let (event_bus, event_bus_provenance) = match builder.event_bus() {
            Some(bus) => (Arc::clone(bus), Provenance::Borrowed),
            None => (
                Arc::new(BroadcastEventBus::new()) as Arc<dyn EventBus>,
                Provenance::Owned,
            ),
        };

        let environment = Self {
            settings,
            observe_interval_delay: builder.observe_interval_delay(),
            reconnect_delay: builder.reconnect_delay(),
            retry_delay: builder.retry_delay(),
            retry_strategy: builder.retry_strategy(),
            io_pool,
            io_pool_provenance,
            scheduler,
            scheduler_provenance,
            event_bus,
            event_bus_provenance,
            shutdown: OnceLock::new(),
        };

        let live = LIVE_INSTANCES.fetch_add(1, Ordering::AcqRel) + 1;
        if live > defaults::MAX_ALLOWED_INSTANCES {
            tracing::warn!(
                live,
                max = defaults::MAX_ALLOWED_INSTANCES,
                "more environments alive than recommended; share one environment across clients"
            );
            environment.event_bus.publish(CoreEvent::TooManyEnvironments {
                live,
                max: defaults::MAX_ALLOWED_INSTANCES,
            });
        }

        tracing::debug!(
            io_pool_size = environment.settings.io_pool_size,
            computation_pool_size = environment.settings.computation_pool_size,
            kv_endpoints = environment.settings.kv_endpoints,
            max_request_lifetime_ms = environment.settings.max_request_lifetime_ms,
            retry_strategy = ?environment.retry_strategy,
            "environment built"
        );

        Ok(environment)
    }

    /// Shut down the worker pool this environment created.
    ///
    /// The first call starts the teardown; every call returns the same
    /// signal, so a repeated call yields the already-completed outcome
    /// without further side effects. A pool supplied through the builder is
    /// left running and the signal resolves immediately.
    pub fn shutdown(&self) -> ShutdownSignal {
        self.shutdown.get_or_init(|| self.begin_shutdown()).clone()
    }

    /// Whether [`shutdown`](Self::shutdown) has been called.
    pub fn is_shutdown(&self) -> bool {
        self.shutdown.get().is_some()
    }

    fn begin_shutdown(&self) -> ShutdownSignal {
        if self.io_pool_provenance == Provenance::Borrowed {
            tracing::debug!("leaving caller-supplied worker pool running");
            return future::ready(Ok(())).boxed().shared();
        }

        tracing::debug!("shutting down worker pool");
        let teardown = self.io_pool.shutdown_gracefully();
        let event_bus = Arc::clone(&self.event_bus);
        async move {
            let outcome = teardown.await;
            match &outcome {
                Ok(()) => tracing::info!("worker pool shut down"),
                Err(error) => tracing::warn!(%error, "worker pool shutdown failed"),
            }
            event_bus.publish(CoreEvent::EnvironmentShutdown {
                success: outcome.is_ok(),
            });
            outcome
        }
        .boxed()
        .shared()
    }

    #[inline]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    #[inline]
    pub fn io_pool(&self) -> &Arc<dyn WorkerPool> {
        &self.io_pool
    }

    #[inline]
    pub fn scheduler(&self) -> &Arc<dyn Scheduler> {
        &self.scheduler
    }

    #[inline]
    pub fn event_bus(&self) -> &Arc<dyn EventBus> {
        &self.event_bus
    }

    #[inline]
    pub fn io_pool_provenance(&self) -> Provenance {
        self.io_pool_provenance
    }

    #[inline]
    pub fn scheduler_provenance(&self) -> Provenance {
        self.scheduler_provenance
    }

    #[inline]
    pub fn event_bus_provenance(&self) -> Provenance {
        self.event_bus_provenance
    }

    pub fn snapshot(&self) -> EnvironmentSnapshot {
        EnvironmentSnapshot {
            settings: self.settings.clone(),
            observe_interval_delay: self.observe_interval_delay,
            reconnect_delay: self.reconnect_delay,
            retry_delay: self.retry_delay,
            retry_strategy: format!("{:?}", self.retry_strategy),
            io_pool_owned: self.io_pool_provenance == Provenance::Owned,
            scheduler_owned: self.scheduler_provenance == Provenance::Owned,
            event_bus_owned: self.event_bus_provenance == Provenance::Owned,
            shutdown: self.is_shutdown(),
        }
    }
}

fn resolve_settings(builder: &EnvironmentBuilder) -> Settings {
    let o = builder.overrides_or_process();
    Settings {
        dcp_enabled: o.resolve(Knob::DcpEnabled, builder.dcp_enabled, || defaults::DCP_ENABLED),
        ssl_enabled: o.resolve(Knob::SslEnabled, builder.ssl_enabled, || defaults::SSL_ENABLED),
        ssl_keystore_file: o.resolve(
            Knob::SslKeystoreFile,
            builder.ssl_keystore_file.clone().map(Some),
            || None,
        ),
        ssl_keystore_password: o.resolve(
            Knob::SslKeystorePassword,
            builder.ssl_keystore_password.clone().map(Some),
            || None,
        ),
        query_enabled: o.resolve(Knob::QueryEnabled, builder.query_enabled, || {
            defaults::QUERY_ENABLED
        }),
        query_port: o.resolve(Knob::QueryPort, builder.query_port, || defaults::QUERY_PORT),
        bootstrap_http_enabled: o.resolve(
            Knob::BootstrapHttpEnabled,
            builder.bootstrap_http_enabled,
            || defaults::BOOTSTRAP_HTTP_ENABLED,
        ),
        bootstrap_carrier_enabled: o.resolve(
            Knob::BootstrapCarrierEnabled,
            builder.bootstrap_carrier_enabled,
            || defaults::BOOTSTRAP_CARRIER_ENABLED,
        ),
        bootstrap_http_direct_port: o.resolve(
            Knob::BootstrapHttpDirectPort,
            builder.bootstrap_http_direct_port,
            || defaults::BOOTSTRAP_HTTP_DIRECT_PORT,
        ),
        bootstrap_http_ssl_port: o.resolve(
            Knob::BootstrapHttpSslPort,
            builder.bootstrap_http_ssl_port,
            || defaults::BOOTSTRAP_HTTP_SSL_PORT,
        ),
        bootstrap_carrier_direct_port: o.resolve(
            Knob::BootstrapCarrierDirectPort,
            builder.bootstrap_carrier_direct_port,
            || defaults::BOOTSTRAP_CARRIER_DIRECT_PORT,
        ),
        bootstrap_carrier_ssl_port: o.resolve(
            Knob::BootstrapCarrierSslPort,
            builder.bootstrap_carrier_ssl_port,
            || defaults::BOOTSTRAP_CARRIER_SSL_PORT,
        ),
        io_pool_size: o.resolve_valid(
            Knob::IoPoolSize,
            builder.io_pool_size,
            defaults::pool_size,
            is_positive,
        ),
        computation_pool_size: o.resolve_valid(
            Knob::ComputationPoolSize,
            builder.computation_pool_size,
            defaults::pool_size,
            is_positive,
        ),
        request_buffer_size: o.resolve(
            Knob::RequestBufferSize,
            builder.request_buffer_size,
            || defaults::REQUEST_BUFFER_SIZE,
        ),
        response_buffer_size: o.resolve(
            Knob::ResponseBufferSize,
            builder.response_buffer_size,
            || defaults::RESPONSE_BUFFER_SIZE,
        ),
        kv_endpoints: o.resolve(Knob::KvEndpoints, builder.kv_endpoints, || {
            defaults::KEYVALUE_ENDPOINTS
        }),
        view_endpoints: o.resolve(Knob::ViewEndpoints, builder.view_endpoints, || {
            defaults::VIEW_ENDPOINTS
        }),
        query_endpoints: o.resolve(Knob::QueryEndpoints, builder.query_endpoints, || {
            defaults::QUERY_ENDPOINTS
        }),
        package_name_and_version: o.resolve(
            Knob::PackageNameAndVersion,
            builder.package_name_and_version.clone(),
            || defaults::package_name_and_version().to_string(),
        ),
        user_agent: o.resolve(Knob::UserAgent, builder.user_agent.clone(), || {
            defaults::user_agent().to_string()
        }),
        max_request_lifetime_ms: o.resolve(
            Knob::MaxRequestLifetime,
            builder.max_request_lifetime_ms,
            || defaults::MAX_REQUEST_LIFETIME_MS,
        ),
        keep_alive_interval_ms: o.resolve(
            Knob::KeepAliveInterval,
            builder.keep_alive_interval_ms,
            || defaults::KEEP_ALIVE_INTERVAL_MS,
        ),
        autorelease_after_ms: o.resolve(
            Knob::AutoreleaseAfter,
            builder.autorelease_after_ms,
            || defaults::AUTORELEASE_AFTER_MS,
        ),
    }
}

// A pool needs at least one thread; zero means unset
fn is_positive(size: &usize) -> bool {
    *size > 0
}

impl Drop for Environment {
    fn drop(&mut self) {
        LIVE_INSTANCES
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| Some(n.saturating_sub(1)))
            .ok();
    }
}

impl CoreEnvironment for Environment {
    fn dcp_enabled(&self) -> bool {
        self.settings.dcp_enabled
    }

    fn ssl_enabled(&self) -> bool {
        self.settings.ssl_enabled
    }

    fn ssl_keystore_file(&self) -> Option<&str> {
        self.settings.ssl_keystore_file.as_deref()
    }

    fn ssl_keystore_password(&self) -> Option<&str> {
        self.settings
            .ssl_keystore_password
            .as_ref()
            .map(Secret::expose)
    }

    fn query_enabled(&self) -> bool {
        self.settings.query_enabled
    }

    fn query_port(&self) -> u16 {
        self.settings.query_port
    }

    fn bootstrap_http_enabled(&self) -> bool {
        self.settings.bootstrap_http_enabled
    }

    fn bootstrap_carrier_enabled(&self) -> bool {
        self.settings.bootstrap_carrier_enabled
    }

    fn bootstrap_http_direct_port(&self) -> u16 {
        self.settings.bootstrap_http_direct_port
    }

    fn bootstrap_http_ssl_port(&self) -> u16 {
        self.settings.bootstrap_http_ssl_port
    }

    fn bootstrap_carrier_direct_port(&self) -> u16 {
        self.settings.bootstrap_carrier_direct_port
    }

    fn bootstrap_carrier_ssl_port(&self) -> u16 {
        self.settings.bootstrap_carrier_ssl_port
    }

    fn io_pool_size(&self) -> usize {
        self.settings.io_pool_size
    }

    fn computation_pool_size(&self) -> usize {
        self.settings.computation_pool_size
    }

    fn request_buffer_size(&self) -> usize {
        self.settings.request_buffer_size
    }

    fn response_buffer_size(&self) -> usize {
        self.settings.response_buffer_size
    }

    fn kv_endpoints(&self) -> usize {
        self.settings.kv_endpoints
    }

    fn view_endpoints(&self) -> usize {
        self.settings.view_endpoints
    }

    fn query_endpoints(&self) -> usize {
        self.settings.query_endpoints
    }

    fn package_name_and_version(&self) -> &str {
        &self.settings.package_name_and_version
    }

    fn user_agent(&self) -> &str {
        &self.settings.user_agent
    }

    fn observe_interval_delay(&self) -> Delay {
        self.observe_interval_delay
    }

    fn reconnect_delay(&self) -> Delay {
        self.reconnect_delay
    }

    fn retry_delay(&self) -> Delay {
        self.retry_delay
    }

    fn retry_strategy(&self) -> Arc<dyn RetryStrategy> {
        Arc::clone(&self.retry_strategy)
    }

    fn max_request_lifetime(&self) -> Duration {
        Duration::from_millis(self.settings.max_request_lifetime_ms)
    }

    fn keep_alive_interval_ms(&self) -> i64 {
        self.settings.keep_alive_interval_ms
    }

    fn autorelease_after(&self) -> Duration {
        Duration::from_millis(self.settings.autorelease_after_ms)
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("settings", &self.settings)
            .field("retry_strategy", &self.retry_strategy)
            .field("io_pool", &self.io_pool)
            .field("io_pool_provenance", &self.io_pool_provenance)
            .field("shutdown", &self.is_shutdown())
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dump = serde_json::to_string(&self.snapshot()).map_err(|_| fmt::Error)?;
        f.write_str(&dump)
    }
}
