//! Fork-join dispatch over a bounded worker pool.
//!
//! Every parallel stage partitions an index range into contiguous,
//! non-overlapping sub-ranges and blocks until all of them finish. Workers
//! either write a disjoint slice of the output or return a private result that
//! the caller merges in range order after the join.

use crate::error::{HpssError, Result};
use rayon::prelude::*;
use std::ops::Range;

/// Splits `[0, len)` into `min(workers, len)` contiguous ranges.
///
/// The first `len % n` ranges carry one extra item so sizes differ by at most
/// one. Returns an empty list when `len` or `workers` is zero.
pub fn partition(len: usize, workers: usize) -> Vec<Range<usize>> {
    let n = workers.min(len);
    if n == 0 {
        return Vec::new();
    }
    let base = len / n;
    let rem = len % n;
    (0..n)
        .map(|i| {
            let start = i * base + i.min(rem);
            let end = start + base + usize::from(i < rem);
            start..end
        })
        .collect()
}

/// A bounded pool of worker threads shared by the pipeline stages.
pub struct WorkerPool {
    pool: rayon::ThreadPool,
    max_threads: usize,
}

impl WorkerPool {
    /// Builds a pool with at most `max_threads` workers.
    ///
    /// # Errors
    ///
    /// Returns [`HpssError::InvalidParams`] for zero threads and
    /// [`HpssError::ThreadPool`] if the threads cannot be spawned.
    pub fn new(max_threads: usize) -> Result<Self> {
        if max_threads == 0 {
            return Err(HpssError::InvalidParams(
                "worker pool needs at least one thread".to_string(),
            ));
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(max_threads)
            .thread_name(|i| format!("swaratone-worker-{}", i))
            .build()
            .map_err(|e| HpssError::ThreadPool(e.to_string()))?;
        Ok(Self { pool, max_threads })
    }

    pub fn max_threads(&self) -> usize {
        self.max_threads
    }

    /// Ranges this pool would hand out for `len` work items.
    pub fn partition(&self, len: usize) -> Vec<Range<usize>> {
        partition(len, self.max_threads)
    }

    /// Runs `f` once per partition of `[0, len)` and returns the results in
    /// range order. The first error aborts the stage and is returned.
    pub fn map_ranges<T, F>(&self, len: usize, f: F) -> Result<Vec<(Range<usize>, T)>>
    where
        T: Send,
        F: Fn(Range<usize>) -> Result<T> + Sync,
    {
        let ranges = self.partition(len);
        log::debug!("dispatching {} items over {} ranges", len, ranges.len());
        self.pool.install(|| {
            ranges
                .into_par_iter()
                .map(|range| f(range.clone()).map(|out| (range, out)))
                .collect()
        })
    }

    /// Splits `data` into disjoint runs of whole `unit`-sized items and runs
    /// `f(items, chunk)` on each, where `items` is the item range the chunk
    /// covers.
    ///
    /// `data.len()` must be a multiple of `unit`.
    pub fn for_each_chunk_mut<T, F>(&self, data: &mut [T], unit: usize, f: F) -> Result<()>
    where
        T: Send,
        F: Fn(Range<usize>, &mut [T]) -> Result<()> + Sync,
    {
        if unit == 0 || data.len() % unit != 0 {
            return Err(HpssError::InvalidParams(format!(
                "cannot split {} elements into items of {}",
                data.len(),
                unit
            )));
        }
        let items = data.len() / unit;
        let mut chunks = Vec::new();
        let mut rest = data;
        for range in self.partition(items) {
            let (head, tail) = std::mem::take(&mut rest).split_at_mut(range.len() * unit);
            chunks.push((range, head));
            rest = tail;
        }
        self.pool.install(|| {
            chunks
                .into_par_iter()
                .try_for_each(|(range, chunk)| f(range, chunk))
        })
    }

    /// Runs two independent closures concurrently inside the pool.
    pub fn join<A, B, RA, RB>(&self, a: A, b: B) -> (RA, RB)
    where
        A: FnOnce() -> RA + Send,
        B: FnOnce() -> RB + Send,
        RA: Send,
        RB: Send,
    {
        self.pool.install(|| rayon::join(a, b))
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("max_threads", &self.max_threads)
            .finish()
    }
}

/// Number of threads the host reports as available, at least one.
pub fn available_threads() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}
