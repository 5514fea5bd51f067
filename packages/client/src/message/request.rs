//! Request contracts shared by the dispatch loop and retry decisions

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};

use zeroize::Zeroizing;

use crate::error::Result;

/// Metadata every request carries regardless of service.
///
/// Retry decisions read this through [`CoreRequest`]; only the dispatch
/// loop advances the retry counter.
pub trait CoreRequest: Send + Sync + fmt::Debug {
    /// Bucket the request is scoped to.
    fn bucket(&self) -> &str;

    /// Credential presented for the bucket, opaque to the core.
    fn password(&self) -> Option<&str>;

    /// When the request was constructed.
    fn creation_time(&self) -> Instant;

    /// Number of retries already scheduled for this request.
    fn retry_count(&self) -> u32;

    /// Record another retry and return the new count.
    fn increment_retry_count(&self) -> u32;

    /// Time elapsed since construction.
    #[inline]
    fn age(&self) -> Duration {
        self.creation_time().elapsed()
    }
}

/// A request sent over the binary key-value protocol.
pub trait BinaryRequest: CoreRequest {
    /// Document key, absent for keyless operations.
    fn key(&self) -> Option<&str>;

    /// Partition the key routes to.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidState` if no partition was assigned yet.
    fn partition(&self) -> Result<i16>;

    /// Route the request to `partition`.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidArgument` if `partition` is negative.
    fn assign_partition(&self, partition: i16) -> Result<()>;

    /// Correlation id written to the protocol's opaque field.
    fn opaque(&self) -> i32;
}

/// Bucket scope, credential, birth time and retry counter of a request.
pub struct RequestMeta {
    bucket: String,
    password: Option<Zeroizing<String>>,
    created_at: Instant,
    retries: AtomicU32,
}

impl RequestMeta {
    pub fn new(bucket: impl Into<String>, password: Option<String>) -> Self {
        Self {
            bucket: bucket.into(),
            password: password.map(Zeroizing::new),
            created_at: Instant::now(),
            retries: AtomicU32::new(0),
        }
    }

    #[inline]
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    #[inline]
    pub fn password(&self) -> Option<&str> {
        self.password.as_ref().map(|p| p.as_str())
    }

    #[inline]
    pub fn creation_time(&self) -> Instant {
        self.created_at
    }

    #[inline]
    pub fn retry_count(&self) -> u32 {
        self.retries.load(Ordering::Acquire)
    }

    #[inline]
    pub fn increment_retry_count(&self) -> u32 {
        self.retries.fetch_add(1, Ordering::AcqRel).saturating_add(1)
    }
}

impl fmt::Debug for RequestMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestMeta")
            .field("bucket", &self.bucket)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("retries", &self.retry_count())
            .finish()
    }
}
