use std::sync::Arc;
use std::time::Duration;

use kvlink_client::env::{
    BroadcastEventBus, CoreEnvironment, CoreEvent, Environment, EnvironmentBuilder, EventBus,
    Knob, Overrides, Provenance, defaults,
};
use kvlink_client::retry::{Delay, TimeUnit};

fn isolated(overrides: Overrides) -> EnvironmentBuilder {
    Environment::builder()
        .with_overrides(overrides)
        .with_io_pool_size(1)
        .with_computation_pool_size(1)
}

#[test]
fn test_kv_endpoints_precedence_across_sources() {
    // (builder value set, override set, override well-formed)
    for builder_set in [false, true] {
        for override_set in [false, true] {
            for well_formed in [false, true] {
                let overrides = Overrides::new();
                if override_set {
                    overrides.set(Knob::KvEndpoints, if well_formed { "5" } else { "five" });
                }
                let mut builder = isolated(overrides);
                if builder_set {
                    builder = builder.with_kv_endpoints(9);
                }

                let env = builder
                    .build()
                    .unwrap_or_else(|e| panic!("build failed: {e}"));
                let expected = match (builder_set, override_set && well_formed) {
                    (true, _) => 9,
                    (false, true) => 5,
                    (false, false) => defaults::KEYVALUE_ENDPOINTS,
                };
                assert_eq!(
                    env.kv_endpoints(),
                    expected,
                    "builder={builder_set} override={override_set} well_formed={well_formed}"
                );
            }
        }
    }
}

#[test]
fn test_malformed_overrides_never_block_startup() {
    let overrides = Overrides::from_pairs([
        ("kvlink.sslEnabled", "maybe"),
        ("kvlink.queryPort", "99999"),
        ("kvlink.maxRequestLifetime", "-5"),
        ("kvlink.keepAliveInterval", "-1"),
        ("kvlink.userAgent", "custom-agent/1.0"),
    ]);
    let env = isolated(overrides)
        .build()
        .unwrap_or_else(|e| panic!("build failed: {e}"));

    assert!(!env.ssl_enabled());
    assert_eq!(env.query_port(), defaults::QUERY_PORT);
    assert_eq!(env.max_request_lifetime(), Duration::from_secs(75));
    assert_eq!(env.keep_alive_interval(), None);
    assert_eq!(env.user_agent(), "custom-agent/1.0");
}

#[test]
fn test_environment_defaults() {
    let env = isolated(Overrides::new())
        .build()
        .unwrap_or_else(|e| panic!("build failed: {e}"));

    assert_eq!(env.request_buffer_size(), 16384);
    assert_eq!(env.response_buffer_size(), 16384);
    assert_eq!((env.kv_endpoints(), env.view_endpoints(), env.query_endpoints()), (1, 1, 1));
    assert_eq!(
        env.observe_interval_delay(),
        Delay::exponential(TimeUnit::Microseconds, 100, 100_000, 10)
    );
    assert_eq!(
        env.reconnect_delay(),
        Delay::exponential(TimeUnit::Milliseconds, 32, 4096, 32)
    );
    assert_eq!(
        env.retry_delay(),
        Delay::exponential(TimeUnit::Microseconds, 100, 100_000, 100)
    );
    assert_eq!(env.max_request_lifetime(), Duration::from_millis(75_000));
    assert_eq!(env.keep_alive_interval(), Some(Duration::from_millis(30_000)));
    assert_eq!(env.autorelease_after(), Duration::from_millis(2_000));
    assert_eq!(env.bootstrap_carrier_direct_port(), 11210);
    assert_eq!(env.bootstrap_http_direct_port(), 8091);
    assert!(env.retry_strategy().should_retry_observe());
}

#[test]
fn test_too_many_environments_is_advisory() {
    let bus = Arc::new(BroadcastEventBus::new());
    let mut events = bus.subscribe();

    let first = isolated(Overrides::new())
        .with_event_bus(Arc::clone(&bus) as Arc<dyn EventBus>)
        .build()
        .unwrap_or_else(|e| panic!("build failed: {e}"));
    let second = isolated(Overrides::new())
        .with_event_bus(Arc::clone(&bus) as Arc<dyn EventBus>)
        .build()
        .unwrap_or_else(|e| panic!("second build must still succeed: {e}"));

    assert_eq!(second.event_bus_provenance(), Provenance::Borrowed);
    let mut warned = false;
    while let Ok(event) = events.try_recv() {
        if let CoreEvent::TooManyEnvironments { live, max } = event {
            assert!(live > max);
            warned = true;
        }
    }
    assert!(warned, "expected a TooManyEnvironments event");
    drop((first, second));
}

#[tokio::test]
async fn test_shutdown_is_idempotent() {
    let env = isolated(Overrides::new())
        .build()
        .unwrap_or_else(|e| panic!("build failed: {e}"));
    assert!(!env.is_shutdown());

    let first = env.shutdown().await;
    let second = env.shutdown().await;
    assert_eq!(first, Ok(()));
    assert_eq!(second, first);
    assert!(env.is_shutdown());
    assert!(env.snapshot().shutdown);
}
