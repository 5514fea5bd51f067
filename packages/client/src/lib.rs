//! # kvlink client core
//!
//! Request correlation, partition routing and retry decisions for a client
//! talking to a clustered key-value store over a binary protocol.
//!
//! ## Features
//!
//! - **Correlation ids** drawn lock-free from one process-wide counter
//! - **Partition routing** with a write-once-then-overwrite partition slot
//!   published across threads
//! - **Pluggable retry strategies** with a separate decision for observe
//!   (consistency polling) sequences
//! - **Deterministic backoff** delays: constant, linear and exponential
//! - **Immutable environments** resolved from builder values, process-wide
//!   overrides and defaults, with single-shot shutdown
//!
//! ## Usage
//!
//! ```no_run
//! use kvlink_client::prelude::*;
//!
//! # async fn run() -> kvlink_client::Result<()> {
//! let env = Environment::builder().with_kv_endpoints(2).build()?;
//!
//! let request = KeyValueRequest::new(Some("user::42".to_string()), "default", None);
//! request.assign_partition(17)?;
//!
//! let value = RetryExecutor::new(&env)
//!     .execute(&request, |req| {
//!         let partition = req.partition();
//!         async move { partition.map(|p| p * 2) }
//!     })
//!     .await?;
//! assert_eq!(value, 34);
//!
//! let _ = env.shutdown().await;
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(clippy::all)]

pub mod env;
pub mod error;
pub mod message;
pub mod retry;

// Prelude with canonical types
pub mod prelude;

pub use crate::error::{CoreError, Result};
pub use crate::prelude::*;
