//! Fixed-size batch partitioning.

use std::ops::Range;

/// Index ranges of consecutive batches of `batch_size` over `len` items; the
/// last range may be shorter.
pub fn batch_ranges(len: usize, batch_size: usize) -> Vec<Range<usize>> {
    let batch_size = batch_size.max(1);
    (0..len)
        .step_by(batch_size)
        .map(|start| start..(start + batch_size).min(len))
        .collect()
}

pub fn batch_count(len: usize, batch_size: usize) -> usize {
    len.div_ceil(batch_size.max(1))
}
