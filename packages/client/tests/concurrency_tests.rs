use std::collections::HashSet;
use std::sync::{Arc, Barrier};
use std::thread;

use kvlink_client::env::{CoreEnvironment, Environment, Overrides};
use kvlink_client::message::{BinaryRequest, KeyValueRequest};

#[test]
fn test_concurrent_requests_get_distinct_correlation_ids() {
    let env = Environment::builder()
        .with_overrides(Overrides::new())
        .with_io_pool_size(4)
        .with_computation_pool_size(1)
        .build()
        .unwrap_or_else(|e| panic!("build failed: {e}"));
    assert_eq!(env.io_pool_size(), 4);

    let barrier = Arc::new(Barrier::new(8));
    let handles: Vec<_> = (0..8)
        .map(|t| {
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                (0..125)
                    .map(|i| {
                        KeyValueRequest::new(Some(format!("doc-{t}-{i}")), "default", None).opaque()
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let ids: HashSet<i32> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap_or_else(|_| panic!("request thread panicked")))
        .collect();
    assert_eq!(ids.len(), 1000);
}

#[test]
fn test_partition_published_to_io_threads() {
    let env = Environment::builder()
        .with_overrides(Overrides::new())
        .with_io_pool_size(2)
        .with_computation_pool_size(1)
        .build()
        .unwrap_or_else(|e| panic!("build failed: {e}"));

    let request = Arc::new(KeyValueRequest::new(Some("routed".to_string()), "default", None));
    request
        .assign_partition(731)
        .unwrap_or_else(|e| panic!("assign failed: {e}"));

    let (tx, rx) = std::sync::mpsc::channel();
    let reader = Arc::clone(&request);
    env.io_pool()
        .submit(Box::pin(async move {
            let _ = tx.send(reader.partition().ok());
        }))
        .unwrap_or_else(|e| panic!("submit failed: {e}"));

    let seen = rx
        .recv_timeout(std::time::Duration::from_secs(5))
        .unwrap_or_else(|e| panic!("io task did not run: {e}"));
    assert_eq!(seen, Some(731));
}
