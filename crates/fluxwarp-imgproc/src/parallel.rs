use std::ops::Range;

use rayon::prelude::*;
use thiserror::Error;

/// Errors that can occur during parallel execution.
#[derive(Error, Debug, PartialEq)]
pub enum ParallelError {
    /// The thread pool failed to build.
    #[error("failed to build thread pool: {0}")]
    BuildError(String),

    /// The requested thread count is invalid.
    #[error("thread count must be > 0, got {0}")]
    InvalidThreadCount(usize),
}

/// Controls how parallel operations are executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ExecutionStrategy {
    /// Use the global Rayon thread pool, with one block per pool thread.
    #[default]
    GlobalPool,

    /// Run sequentially on the current thread.
    ///
    /// Useful for small images, debugging, or when the overhead of parallelization
    /// outweighs the benefits.
    Serial,

    /// Run on a local thread pool with `n` threads, with one block per thread.
    ///
    /// # Warning
    /// Creates a new thread pool on every call. The pool lives for a single job and is joined
    /// before the call returns.
    Fixed(usize),
}

impl ExecutionStrategy {
    /// Number of workers the strategy runs with.
    ///
    /// # Errors
    ///
    /// Returns [`ParallelError::InvalidThreadCount`] for `Fixed(0)`.
    pub fn num_workers(&self) -> Result<usize, ParallelError> {
        match *self {
            ExecutionStrategy::Serial => Ok(1),
            ExecutionStrategy::GlobalPool => Ok(rayon::current_num_threads()),
            ExecutionStrategy::Fixed(0) => Err(ParallelError::InvalidThreadCount(0)),
            ExecutionStrategy::Fixed(n) => Ok(n),
        }
    }
}

/// Partition `[0, len)` into contiguous blocks, one per worker.
///
/// The returned ranges are ordered, do not overlap and cover `[0, len)` exactly. The number of
/// blocks is `workers` clamped to `[1, max(len, 1)]`, and block lengths differ by at most one,
/// with the longer blocks first.
///
/// # Example
///
/// ```
/// use fluxwarp_imgproc::parallel::partition_blocks;
///
/// assert_eq!(partition_blocks(10, 3), vec![0..4, 4..7, 7..10]);
/// assert_eq!(partition_blocks(2, 8), vec![0..1, 1..2]);
/// assert_eq!(partition_blocks(0, 4), vec![0..0]);
/// ```
pub fn partition_blocks(len: usize, workers: usize) -> Vec<Range<usize>> {
    let num_blocks = workers.clamp(1, len.max(1));
    let base = len / num_blocks;
    let extra = len % num_blocks;

    let mut blocks = Vec::with_capacity(num_blocks);
    let mut start = 0;
    for i in 0..num_blocks {
        let end = start + base + usize::from(i < extra);
        blocks.push(start..end);
        start = end;
    }
    blocks
}

/// Split `dst` along a block partition, returning each block with its start index.
fn split_blocks_mut<'a, T>(
    mut dst: &'a mut [T],
    blocks: &[Range<usize>],
) -> Vec<(usize, &'a mut [T])> {
    let mut chunks = Vec::with_capacity(blocks.len());
    for block in blocks {
        let (head, tail) = std::mem::take(&mut dst).split_at_mut(block.len());
        chunks.push((block.start, head));
        dst = tail;
    }
    debug_assert!(dst.is_empty(), "block partition does not cover the buffer");
    chunks
}

/// Apply a function to disjoint contiguous blocks of `dst` in parallel.
///
/// `f` receives the index of the first element of its block and the block itself, and returns a
/// per-block result; the results are summed once every block has finished. Each element of `dst`
/// belongs to exactly one block, so no synchronisation is needed inside `f`.
///
/// # Arguments
///
/// * `strategy` - The execution strategy.
/// * `dst` - The destination slice.
/// * `f` - The operation to perform on each block.
///
/// # Errors
///
/// Fails before any block runs if the strategy is invalid or the thread pool cannot be built.
///
/// # Example
///
/// ```
/// use fluxwarp_imgproc::parallel::{par_for_blocks, ExecutionStrategy};
///
/// let mut dst = vec![0usize; 10];
/// let total: usize = par_for_blocks(ExecutionStrategy::Fixed(3), &mut dst, |start, block| {
///     for (i, v) in block.iter_mut().enumerate() {
///         *v = start + i;
///     }
///     block.len()
/// })
/// .unwrap();
///
/// assert_eq!(total, 10);
/// assert_eq!(dst, (0..10).collect::<Vec<_>>());
/// ```
pub fn par_for_blocks<T, R, F>(
    strategy: ExecutionStrategy,
    dst: &mut [T],
    f: F,
) -> Result<R, ParallelError>
where
    T: Send,
    R: Send + std::iter::Sum<R>,
    F: Fn(usize, &mut [T]) -> R + Send + Sync,
{
    let workers = strategy.num_workers()?;
    let blocks = partition_blocks(dst.len(), workers);

    // build the pool before handing out any work
    let pool = match strategy {
        ExecutionStrategy::Fixed(n) => Some(
            rayon::ThreadPoolBuilder::new()
                .num_threads(n)
                .build()
                .map_err(|e| ParallelError::BuildError(e.to_string()))?,
        ),
        _ => None,
    };

    let chunks = split_blocks_mut(dst, &blocks);
    log::trace!("dispatching {} blocks over {} workers", chunks.len(), workers);

    let result = match (strategy, pool) {
        (ExecutionStrategy::Serial, _) => chunks
            .into_iter()
            .map(|(start, block)| f(start, block))
            .sum(),
        (_, Some(pool)) => pool.install(|| {
            chunks
                .into_par_iter()
                .map(|(start, block)| f(start, block))
                .sum()
        }),
        (_, None) => chunks
            .into_par_iter()
            .map(|(start, block)| f(start, block))
            .sum(),
    };

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_is_partition(blocks: &[Range<usize>], len: usize) {
        let mut expected_start = 0;
        for block in blocks {
            assert_eq!(block.start, expected_start);
            assert!(block.end >= block.start);
            expected_start = block.end;
        }
        assert_eq!(expected_start, len);
    }

    #[test]
    fn test_partition_blocks_is_set_partition() {
        for len in [0, 1, 2, 7, 64, 1000, 1001] {
            for workers in [0, 1, 2, 3, 8, 2000] {
                let blocks = partition_blocks(len, workers);
                assert_is_partition(&blocks, len);
                assert!(!blocks.is_empty());
                assert!(blocks.len() <= workers.max(1));

                let min = blocks.iter().map(|b| b.len()).min().unwrap_or(0);
                let max = blocks.iter().map(|b| b.len()).max().unwrap_or(0);
                assert!(max - min <= 1);
            }
        }
    }

    #[test]
    fn test_partition_blocks_balanced() {
        assert_eq!(partition_blocks(10, 4), vec![0..3, 3..6, 6..8, 8..10]);
        assert_eq!(partition_blocks(5, 1), vec![0..5]);
        assert_eq!(partition_blocks(3, 0), vec![0..3]);
    }

    #[test]
    fn test_split_blocks_mut() {
        let mut data = vec![0u8; 7];
        let blocks = partition_blocks(data.len(), 3);
        let chunks = split_blocks_mut(&mut data, &blocks);
        let shape = chunks
            .iter()
            .map(|(start, block)| (*start, block.len()))
            .collect::<Vec<_>>();
        assert_eq!(shape, vec![(0, 3), (3, 2), (5, 2)]);
    }

    #[test]
    fn test_execute_serial() -> Result<(), ParallelError> {
        let mut dst = vec![0; 4];
        let n: usize = par_for_blocks(ExecutionStrategy::Serial, &mut dst, |start, block| {
            block
                .iter_mut()
                .enumerate()
                .for_each(|(i, d)| *d = (start + i) * 2);
            1
        })?;
        assert_eq!(n, 1);
        assert_eq!(dst, vec![0, 2, 4, 6]);
        Ok(())
    }

    #[test]
    fn test_execute_global_pool() -> Result<(), ParallelError> {
        let mut dst = vec![0; 100];
        let n: usize = par_for_blocks(ExecutionStrategy::GlobalPool, &mut dst, |start, block| {
            block
                .iter_mut()
                .enumerate()
                .for_each(|(i, d)| *d = start + i);
            block.len()
        })?;
        assert_eq!(n, 100);
        assert_eq!(dst, (0..100).collect::<Vec<_>>());
        Ok(())
    }

    #[test]
    fn test_execute_fixed_success() -> Result<(), ParallelError> {
        let mut dst = vec![0; 9];
        let n: usize = par_for_blocks(ExecutionStrategy::Fixed(4), &mut dst, |start, block| {
            block.iter_mut().for_each(|d| *d = start);
            1
        })?;
        assert_eq!(n, 4);
        assert_eq!(dst, vec![0, 0, 0, 3, 3, 5, 5, 7, 7]);
        Ok(())
    }

    #[test]
    fn test_execute_fixed_error() {
        let mut dst = vec![0];
        let res: Result<usize, _> =
            par_for_blocks(ExecutionStrategy::Fixed(0), &mut dst, |_, _| 0);
        assert!(matches!(res, Err(ParallelError::InvalidThreadCount(0))));
    }
}
