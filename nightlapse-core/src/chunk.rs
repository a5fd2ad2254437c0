use std::{num::NonZeroUsize, path::PathBuf, thread::available_parallelism};

use crate::clips::ClipSet;

/// Worker count used when host parallelism cannot be determined.
pub const FALLBACK_WORKERS: usize = 4;

/// A contiguous slice of a [`ClipSet`], transcoded by one worker.
///
/// Chunks are non-overlapping and concatenating them in index order
/// reconstructs the original clip set exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub index: usize,
    pub clips: Vec<PathBuf>,
}

/// Host parallelism, floor 1, falling back to [`FALLBACK_WORKERS`] when
/// it cannot be queried.
#[inline]
pub fn available_workers() -> usize {
    available_parallelism().map_or(FALLBACK_WORKERS, NonZeroUsize::get)
}

/// Splits `clips` into contiguous chunks of `ceil(len / workers)` clips
/// each; the last chunk may be shorter. Produces no chunks only for an
/// empty set.
#[inline]
pub fn partition(clips: &ClipSet, workers: usize) -> Vec<Chunk> {
    if clips.is_empty() {
        return Vec::new();
    }

    let workers = workers.max(1);
    let chunk_size = clips.len().div_ceil(workers);

    clips
        .as_slice()
        .chunks(chunk_size)
        .enumerate()
        .map(|(index, clips)| Chunk {
            index,
            clips: clips.to_vec(),
        })
        .collect()
}
