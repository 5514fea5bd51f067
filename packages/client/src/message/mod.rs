//! Request envelopes and correlation id allocation
//!
//! Every request carries the metadata the dispatch loop needs to route,
//! retry and expire it. Binary requests additionally carry a key, a
//! correlation id (the wire-level opaque) and a partition assignment.

pub mod correlation;
pub mod kv;
pub mod request;

pub use correlation::{CorrelationIdGenerator, GLOBAL_CORRELATION_IDS};
pub use kv::{KeyValueRequest, UNASSIGNED_PARTITION};
pub use request::{BinaryRequest, CoreRequest, RequestMeta};
