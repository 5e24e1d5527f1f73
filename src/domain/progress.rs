/// Position of a chunk handed to the executor.
///
/// `index` is zero-based and `total` counts only chunks that hold rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkProgress {
    pub index: usize,
    pub total: usize,
    pub rows: usize,
}

/// Receives a callback each time a chunk is dispatched, in chunk order.
///
/// Callbacks run while the batch is locked for execution and must not call
/// back into the batch that reports them.
pub trait ChunkObserver: Send + Sync {
    fn chunk_dispatched(&self, progress: ChunkProgress);
}

impl<F> ChunkObserver for F
where
    F: Fn(ChunkProgress) + Send + Sync,
{
    fn chunk_dispatched(&self, progress: ChunkProgress) {
        self(progress)
    }
}
