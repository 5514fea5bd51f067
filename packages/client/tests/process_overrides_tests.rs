//! Process-wide overrides seeded from `KVLINK_*` variables.
//!
//! Kept to a single test: the variables are set before the process table is
//! first read, and the live-instance counter is not shared with other tests.

use kvlink_client::env::{
    CoreEnvironment, Environment, Knob, Overrides, live_instances, reset_instance_counter,
};

#[test]
fn test_environment_variables_feed_default_builders() {
    // SAFETY: the only test in this binary; no other thread reads the
    // environment concurrently.
    unsafe {
        std::env::set_var(Knob::KvEndpoints.env_var(), "7");
        std::env::set_var(Knob::QueryPort.env_var(), "not-a-port");
    }
    reset_instance_counter();

    assert_eq!(Overrides::process().get(Knob::KvEndpoints).as_deref(), Some("7"));

    let env = Environment::builder()
        .with_io_pool_size(1)
        .with_computation_pool_size(1)
        .build()
        .unwrap_or_else(|e| panic!("build failed: {e}"));
    assert_eq!(env.kv_endpoints(), 7);
    assert_eq!(env.query_port(), 8093);
    assert_eq!(live_instances(), 1);

    let explicit = Environment::builder()
        .with_io_pool_size(1)
        .with_computation_pool_size(1)
        .with_kv_endpoints(2)
        .build()
        .unwrap_or_else(|e| panic!("build failed: {e}"));
    assert_eq!(explicit.kv_endpoints(), 2);
    assert_eq!(live_instances(), 2);

    drop((env, explicit));
    assert_eq!(live_instances(), 0);
}
