//! Bounded worker pool
//!
//! A thin wrapper over a dedicated rayon pool so that every fan-out in the
//! crate runs with an explicit worker count.

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::core::error::BookError;
use crate::core::util::default_jobs;

pub struct WorkerPool {
    pool: ThreadPool,
    workers: usize,
}

impl WorkerPool {
    /// Build a pool with `workers` threads (`0` means available parallelism)
    pub fn new(workers: usize) -> Result<Self, BookError> {
        let workers = if workers == 0 { default_jobs() } else { workers };
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("bookforge-worker-{}", i))
            .build()?;
        Ok(Self { pool, workers })
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Run `f` over every item on the pool. Results keep input order.
    pub fn map<T, R, F>(&self, items: Vec<T>, f: F) -> Vec<R>
    where
        T: Send,
        R: Send,
        F: Fn(T) -> R + Sync + Send,
    {
        self.pool.install(|| items.into_par_iter().map(f).collect())
    }
}
