//! I/O worker pool abstraction and its tokio-backed default

use std::fmt;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use futures::FutureExt;
use futures::future::{self, BoxFuture};
use tokio::runtime::{Builder, Handle, Runtime};
use tokio::sync::oneshot;

use crate::error::ShutdownError;

/// Pool executing I/O work for the dispatch loop and endpoints.
pub trait WorkerPool: Send + Sync + fmt::Debug {
    /// Run `task` on the pool.
    ///
    /// # Errors
    ///
    /// Returns `ShutdownError::AlreadyStopped` once the pool is shut down.
    fn submit(&self, task: BoxFuture<'static, ()>) -> Result<(), ShutdownError>;

    /// Stop accepting work and wind the pool down.
    ///
    /// The returned future completes once teardown finished.
    fn shutdown_gracefully(&self) -> BoxFuture<'static, Result<(), ShutdownError>>;

    fn is_shutdown(&self) -> bool;
}

/// Time in-flight tasks get to finish during a graceful shutdown.
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_secs(2);

/// Multi-threaded tokio runtime with named worker threads.
pub struct IoPool {
    runtime: Mutex<Option<Runtime>>,
    handle: Handle,
    size: usize,
    quiet_period: Duration,
}

impl IoPool {
    /// Start a pool of `size` worker threads (at least one).
    ///
    /// # Errors
    ///
    /// Returns the I/O error raised while spawning the runtime.
    pub fn new(size: usize) -> std::io::Result<Self> {
        Self::with_quiet_period(size, DEFAULT_QUIET_PERIOD)
    }

    /// # Errors
    ///
    /// Returns the I/O error raised while spawning the runtime.
    pub fn with_quiet_period(size: usize, quiet_period: Duration) -> std::io::Result<Self> {
        let size = size.max(1);
        let runtime = Builder::new_multi_thread()
            .worker_threads(size)
            .thread_name("kvlink-io")
            .enable_all()
            .build()?;
        Ok(Self {
            handle: runtime.handle().clone(),
            runtime: Mutex::new(Some(runtime)),
            size,
            quiet_period,
        })
    }

    /// Handle for spawning directly onto the pool.
    #[inline]
    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    fn take_runtime(&self) -> Option<Runtime> {
        self.runtime
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

impl WorkerPool for IoPool {
    fn submit(&self, task: BoxFuture<'static, ()>) -> Result<(), ShutdownError> {
        let guard = self.runtime.lock().unwrap_or_else(PoisonError::into_inner);
        match guard.as_ref() {
            Some(runtime) => {
                runtime.spawn(task);
                Ok(())
            }
            None => Err(ShutdownError::AlreadyStopped),
        }
    }

    fn shutdown_gracefully(&self) -> BoxFuture<'static, Result<(), ShutdownError>> {
        let Some(runtime) = self.take_runtime() else {
            return future::ready(Err(ShutdownError::AlreadyStopped)).boxed();
        };

        // Runtime::shutdown_timeout blocks, so it runs off any async context
        let (done_tx, done_rx) = oneshot::channel();
        let quiet_period = self.quiet_period;
        let spawned = std::thread::Builder::new()
            .name("kvlink-io-shutdown".to_string())
            .spawn(move || {
                runtime.shutdown_timeout(quiet_period);
                let _ = done_tx.send(());
            });

        match spawned {
            Ok(_) => async move {
                done_rx
                    .await
                    .map_err(|_| ShutdownError::Teardown("shutdown thread exited early".to_string()))
            }
            .boxed(),
            Err(e) => future::ready(Err(ShutdownError::Teardown(e.to_string()))).boxed(),
        }
    }

    fn is_shutdown(&self) -> bool {
        self.runtime
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }
}

impl Drop for IoPool {
    fn drop(&mut self) {
        // Dropping a runtime blocks, which panics inside async code
        if let Some(runtime) = self.take_runtime() {
            runtime.shutdown_background();
        }
    }
}

impl fmt::Debug for IoPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IoPool")
            .field("size", &self.size)
            .field("quiet_period", &self.quiet_period)
            .field("shutdown", &self.is_shutdown())
            .finish()
    }
}
