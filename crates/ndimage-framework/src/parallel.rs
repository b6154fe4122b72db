use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;
use thiserror::Error;

use crate::error::FrameworkError;

/// Number of operations below which the frameworks do not start worker threads.
pub const THREADING_THRESHOLD: usize = 70_000;

/// 0 means "as many as the global pool has".
static NUMBER_OF_THREADS: AtomicUsize = AtomicUsize::new(0);

/// Failures to set up the threads for a framework call.
#[derive(Error, Debug, PartialEq)]
pub enum ParallelError {
    /// Rayon could not start a local pool.
    #[error("cannot start worker threads: {0}")]
    BuildError(String),

    /// A fixed strategy asked for no threads at all.
    #[error("a fixed thread count of {0} leaves no thread to run on")]
    InvalidThreadCount(usize),
}

/// Controls how the frameworks spread lines over threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionStrategy {
    /// Use the global Rayon thread pool, with at most [`number_of_threads`] chunks of work.
    #[default]
    Auto,

    /// All lines on the calling thread.
    ///
    /// Required when the line filter is not safe to call from several threads at once.
    Serial,

    /// A pool of exactly `n` threads, built for this call.
    ///
    /// Every framework call builds and tears down its own pool, so prefer [`Auto`] outside
    /// of timing comparisons.
    ///
    /// [`Auto`]: ExecutionStrategy::Auto
    Fixed(usize),
}

impl ExecutionStrategy {
    /// Number of threads this strategy asks for.
    ///
    /// # Errors
    ///
    /// Returns [`ParallelError::InvalidThreadCount`] for `Fixed(0)`.
    pub fn threads(self) -> Result<usize, ParallelError> {
        match self {
            ExecutionStrategy::Auto => Ok(number_of_threads()),
            ExecutionStrategy::Serial => Ok(1),
            ExecutionStrategy::Fixed(0) => Err(ParallelError::InvalidThreadCount(0)),
            ExecutionStrategy::Fixed(n) => Ok(n),
        }
    }
}

/// Sets the number of threads the frameworks use with [`ExecutionStrategy::Auto`].
///
/// Passing 0 restores the default, the size of the global Rayon pool.
pub fn set_number_of_threads(n: usize) {
    NUMBER_OF_THREADS.store(n, Ordering::Relaxed);
}

/// The number of threads the frameworks use with [`ExecutionStrategy::Auto`].
pub fn number_of_threads() -> usize {
    match NUMBER_OF_THREADS.load(Ordering::Relaxed) {
        0 => rayon::current_num_threads(),
        n => n,
    }
}

/// Runs `work(thread)` for `thread` in `0..n_threads`, in parallel unless there is only one.
///
/// Stops early on the first error, which is returned.
pub(crate) fn run_threads<F>(
    strategy: ExecutionStrategy,
    n_threads: usize,
    work: F,
) -> Result<(), FrameworkError>
where
    F: Fn(usize) -> Result<(), FrameworkError> + Sync + Send,
{
    if n_threads <= 1 {
        return work(0);
    }
    match strategy {
        ExecutionStrategy::Serial => (0..n_threads).try_for_each(work),
        ExecutionStrategy::Auto => (0..n_threads).into_par_iter().try_for_each(work),
        ExecutionStrategy::Fixed(n) => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(n)
                .build()
                .map_err(|e| ParallelError::BuildError(e.to_string()))?;
            pool.install(|| (0..n_threads).into_par_iter().try_for_each(work))
        }
    }
}
