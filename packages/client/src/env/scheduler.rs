//! Computation scheduler abstraction and its thread-pool default

use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Mutex, PoisonError};

use crossbeam_channel::{Sender, unbounded};

use crate::error::ShutdownError;

/// Unit of computation-bound work.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Schedules computation-bound work away from the I/O pool.
pub trait Scheduler: Send + Sync + fmt::Debug {
    /// # Errors
    ///
    /// Returns `ShutdownError::AlreadyStopped` once the scheduler stopped.
    fn schedule(&self, job: Job) -> Result<(), ShutdownError>;

    /// Number of jobs that can run at the same time.
    fn parallelism(&self) -> usize;
}

/// Fixed set of worker threads draining a shared job queue.
///
/// Workers exit once the scheduler is dropped and the queue is empty. A
/// panicking job is contained and does not take its worker down.
pub struct ComputationScheduler {
    sender: Mutex<Option<Sender<Job>>>,
    size: usize,
}

impl ComputationScheduler {
    /// Start `size` workers (at least one).
    ///
    /// # Errors
    ///
    /// Returns the I/O error raised while spawning a worker thread.
    pub fn new(size: usize) -> std::io::Result<Self> {
        let size = size.max(1);
        let (sender, receiver) = unbounded::<Job>();

        for index in 0..size {
            let receiver = receiver.clone();
            std::thread::Builder::new()
                .name(format!("kvlink-computation-{index}"))
                .spawn(move || {
                    for job in receiver.iter() {
                        if catch_unwind(AssertUnwindSafe(job)).is_err() {
                            tracing::warn!("computation job panicked");
                        }
                    }
                })?;
        }

        Ok(Self {
            sender: Mutex::new(Some(sender)),
            size,
        })
    }

    /// Close the queue; queued jobs still run.
    pub fn stop(&self) {
        self.sender.lock().unwrap_or_else(PoisonError::into_inner).take();
    }
}

impl Scheduler for ComputationScheduler {
    fn schedule(&self, job: Job) -> Result<(), ShutdownError> {
        let guard = self.sender.lock().unwrap_or_else(PoisonError::into_inner);
        match guard.as_ref() {
            Some(sender) => sender.send(job).map_err(|_| ShutdownError::AlreadyStopped),
            None => Err(ShutdownError::AlreadyStopped),
        }
    }

    #[inline]
    fn parallelism(&self) -> usize {
        self.size
    }
}

impl fmt::Debug for ComputationScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComputationScheduler")
            .field("size", &self.size)
            .finish()
    }
}
