/*!
 * Concurrency primitives for parallel verification
 *
 * A [`CountDownLatch`] lets the verifier wait until every scheduled task has
 * finished, and [`build_pool`] creates the bounded worker pool those tasks
 * run on.
 */

use crate::error::{BagitError, Result};
use std::sync::{Arc, Condvar, Mutex};
use tracing::warn;

/// Completion barrier that releases waiters once `count` tasks have finished
#[derive(Clone)]
pub struct CountDownLatch {
    state: Arc<LatchState>,
}

struct LatchState {
    remaining: Mutex<usize>,
    condvar: Condvar,
}

impl CountDownLatch {
    pub fn new(count: usize) -> Self {
        Self {
            state: Arc::new(LatchState {
                remaining: Mutex::new(count),
                condvar: Condvar::new(),
            }),
        }
    }

    /// Decrement the count, waking waiters when it reaches zero
    pub fn count_down(&self) {
        let mut remaining = lock(&self.state.remaining);
        if *remaining > 0 {
            *remaining -= 1;
            if *remaining == 0 {
                self.state.condvar.notify_all();
            }
        }
    }

    /// Block until the count reaches zero
    pub fn wait(&self) {
        let mut remaining = lock(&self.state.remaining);
        while *remaining > 0 {
            remaining = self
                .state
                .condvar
                .wait(remaining)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
        }
    }

    pub fn count(&self) -> usize {
        *lock(&self.state.remaining)
    }

    /// Guard that counts down when dropped, including during a panic unwind
    pub fn guard(&self) -> LatchGuard {
        LatchGuard {
            latch: self.clone(),
        }
    }
}

/// Counts its latch down exactly once on drop
pub struct LatchGuard {
    latch: CountDownLatch,
}

impl Drop for LatchGuard {
    fn drop(&mut self) {
        self.latch.count_down();
    }
}

// A panicking task must not wedge the latch, so a poisoned lock is still usable.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Number of worker threads to use when none is configured
pub fn default_parallelism() -> usize {
    num_cpus::get()
}

/// Build a rayon pool with `threads` workers (0 = auto-detect)
pub fn build_pool(threads: usize) -> Result<rayon::ThreadPool> {
    let threads = if threads == 0 {
        default_parallelism()
    } else {
        threads
    };

    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("bagit-verify-{}", i))
        .build()
        .map_err(|e| BagitError::Parallel(format!("Failed to build thread pool: {}", e)))
}

// Shim for num_cpus functionality (fallback to std if needed)
//
// If CPU detection fails (restricted containers, cgroup environments) we fall
// back to a single worker.
mod num_cpus {
    use super::warn;
    use std::thread;

    pub fn get() -> usize {
        thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or_else(|e| {
                warn!(
                    error = %e,
                    "Failed to detect available parallelism, defaulting to 1 worker"
                );
                1
            })
    }
}
