//! Rayon thread pool configuration for batch TTK evaluation.
//!
//! Use [WorkerPool::install] to run a batch with a fixed number of threads, or
//! rely on Rayon's default (all CPU cores).

use rayon::ThreadPoolBuilder;

/// Configures how many worker threads are used for parallel batch execution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerPool {
    /// Number of worker threads. If 0, use Rayon default (num_cpus).
    pub workers: usize,
}

impl WorkerPool {
    /// Use exactly `n` worker threads.
    pub fn with_workers(n: usize) -> Self {
        Self { workers: n }
    }

    /// Run a closure on a thread pool with this worker count. If [workers](WorkerPool::workers) is 0,
    /// or a dedicated pool cannot be built, the global Rayon pool is used.
    pub fn install<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R + Send,
        R: Send,
    {
        if self.workers == 0 {
            return f();
        }
        match ThreadPoolBuilder::new().num_threads(self.workers).build() {
            Ok(pool) => pool.install(f),
            Err(_) => f(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_pool_runs_on_requested_thread_count() {
        let threads = WorkerPool::with_workers(2).install(rayon::current_num_threads);
        assert_eq!(threads, 2);
    }

    #[test]
    fn default_pool_uses_global_rayon_pool() {
        let pool = WorkerPool::default();
        assert_eq!(pool.workers, 0);
        assert_eq!(pool.install(|| 7), 7);
    }
}
