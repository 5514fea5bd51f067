//! Key-value request envelope

use std::fmt;
use std::sync::atomic::{AtomicI16, Ordering};
use std::time::Instant;

use super::correlation::{CorrelationIdGenerator, GLOBAL_CORRELATION_IDS};
use super::request::{BinaryRequest, CoreRequest, RequestMeta};
use crate::error::{CoreError, Result};

/// Sentinel stored while no partition has been assigned.
pub const UNASSIGNED_PARTITION: i16 = -1;

/// Envelope for a single key-value operation.
///
/// The correlation id is fixed at construction. The partition is written by
/// the routing layer, possibly from another thread, and read by I/O threads;
/// the store is published with release ordering so readers that observe it
/// also observe everything the router wrote before it. Later assignments
/// overwrite earlier ones, which is how a request is re-routed after a
/// topology change.
pub struct KeyValueRequest {
    meta: RequestMeta,
    key: Option<String>,
    opaque: i32,
    partition: AtomicI16,
}

impl KeyValueRequest {
    /// Create a request with an id from the process-wide generator.
    pub fn new(key: Option<String>, bucket: impl Into<String>, password: Option<String>) -> Self {
        Self::with_generator(&GLOBAL_CORRELATION_IDS, key, bucket, password)
    }

    /// Create a request with an id drawn from `ids`.
    pub fn with_generator(
        ids: &CorrelationIdGenerator,
        key: Option<String>,
        bucket: impl Into<String>,
        password: Option<String>,
    ) -> Self {
        Self {
            meta: RequestMeta::new(bucket, password),
            key,
            opaque: ids.next_id(),
            partition: AtomicI16::new(UNASSIGNED_PARTITION),
        }
    }

    /// True once a partition has been assigned.
    #[inline]
    pub fn has_partition(&self) -> bool {
        self.partition.load(Ordering::Acquire) != UNASSIGNED_PARTITION
    }
}

impl CoreRequest for KeyValueRequest {
    #[inline]
    fn bucket(&self) -> &str {
        self.meta.bucket()
    }

    #[inline]
    fn password(&self) -> Option<&str> {
        self.meta.password()
    }

    #[inline]
    fn creation_time(&self) -> Instant {
        self.meta.creation_time()
    }

    #[inline]
    fn retry_count(&self) -> u32 {
        self.meta.retry_count()
    }

    #[inline]
    fn increment_retry_count(&self) -> u32 {
        self.meta.increment_retry_count()
    }
}

impl BinaryRequest for KeyValueRequest {
    #[inline]
    fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    fn partition(&self) -> Result<i16> {
        match self.partition.load(Ordering::Acquire) {
            UNASSIGNED_PARTITION => Err(CoreError::InvalidState(
                "partition requested but not assigned beforehand",
            )),
            partition => Ok(partition),
        }
    }

    fn assign_partition(&self, partition: i16) -> Result<()> {
        if partition < 0 {
            return Err(CoreError::InvalidArgument(format!(
                "partition must be >= 0, got {partition}"
            )));
        }
        self.partition.store(partition, Ordering::Release);
        Ok(())
    }

    #[inline]
    fn opaque(&self) -> i32 {
        self.opaque
    }
}

impl fmt::Debug for KeyValueRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let partition = self.partition.load(Ordering::Acquire);
        f.debug_struct("KeyValueRequest")
            .field("key", &self.key)
            .field("opaque", &self.opaque)
            .field("partition", &(partition != UNASSIGNED_PARTITION).then_some(partition))
            .field("meta", &self.meta)
            .finish()
    }
}
