//! The batch engine.
//!
//! [`BatchExecer`] collects rows for a single parameterised statement, splits
//! them into chunks that stay under the engine's placeholder ceiling and runs
//! every chunk through an [`Execer`](crate::domain::execer::Execer), serially
//! or on a pool of worker threads.

mod chunk;
mod coordinator;
mod render;

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::domain::base_arg::{BaseArgPosition, BaseArgs};
use crate::domain::batch_spec::BatchSpec;
use crate::domain::error::{BatchError, BatchResult};
use crate::domain::execer::ExecHandle;
use crate::domain::progress::ChunkObserver;
use crate::domain::sql_value::SqlValue;

pub use chunk::Chunk;
pub use coordinator::BatchReport;
pub use render::{RenderedStatement, render_chunk};

use chunk::ChunkList;
use coordinator::{ChunkRunner, check_concurrency, run_parallel, run_serial};

#[derive(Debug, Default)]
struct BatchState {
    chunks: ChunkList,
    base_args: BaseArgs,
    workers: usize,
}

impl BatchState {
    /// Hands out the accumulated rows and base args, leaving an empty batch behind.
    fn drain(&mut self) -> (ChunkList, BaseArgs) {
        (
            std::mem::take(&mut self.chunks),
            std::mem::take(&mut self.base_args),
        )
    }
}

/// Accumulates rows for one bulk statement and executes them in chunks.
///
/// All methods take `&self`; rows may be added from several threads. A call
/// to [`execute`](Self::execute) holds the batch lock until every chunk has
/// finished and always leaves the accumulator empty, so one instance can be
/// reused for the next batch.
pub struct BatchExecer {
    handle: ExecHandle,
    spec: BatchSpec,
    observer: Option<Arc<dyn ChunkObserver>>,
    state: Mutex<BatchState>,
}

impl BatchExecer {
    /// Fails when the spec's limits leave no room for a row in a chunk.
    pub fn new(handle: ExecHandle, spec: BatchSpec) -> BatchResult<Self> {
        spec.check_capacity()?;
        Ok(Self {
            handle,
            spec,
            observer: None,
            state: Mutex::new(BatchState::default()),
        })
    }

    pub fn inserter(handle: ExecHandle, insert_query: &str, cols: usize) -> BatchResult<Self> {
        Self::new(handle, BatchSpec::inserter(insert_query, cols)?)
    }

    pub fn updater(handle: ExecHandle, update_query: &str, cols: usize) -> BatchResult<Self> {
        Self::new(handle, BatchSpec::updater(update_query, cols)?)
    }

    pub fn custom(
        handle: ExecHandle,
        base_query: &str,
        cols: usize,
        value_template: &str,
    ) -> BatchResult<Self> {
        Self::new(handle, BatchSpec::custom(base_query, cols, value_template)?)
    }

    /// Installs a callback invoked once per dispatched chunk.
    ///
    /// The observer runs while [`execute`](Self::execute) holds the batch
    /// lock, so it must not call back into this batch: `count`, `add_row`,
    /// `add_base_arg` and `use_workers` would block forever.
    pub fn with_observer(mut self, observer: impl ChunkObserver + 'static) -> Self {
        self.observer = Some(Arc::new(observer));
        self
    }

    /// Sets how many workers [`execute`](Self::execute) uses; `0` means one.
    pub fn use_workers(&self, workers: usize) {
        self.state.lock().workers = workers;
    }

    pub fn workers(&self) -> usize {
        self.state.lock().workers.max(1)
    }

    /// Rows accumulated since the last execution.
    pub fn count(&self) -> usize {
        self.state.lock().chunks.row_count()
    }

    /// Adds one row.
    ///
    /// The caller must pass exactly [`BatchSpec::cols`] values; the row shape
    /// is not checked here.
    pub fn add_row<I>(&self, values: I)
    where
        I: IntoIterator,
        I::Item: Into<SqlValue>,
    {
        let row = values.into_iter().map(Into::into).collect::<Vec<_>>();
        let capacity = self.spec.rows_per_chunk();
        self.state.lock().chunks.push_row(row, capacity);
    }

    /// Registers a statement-wide argument placed before or after the row values.
    pub fn add_base_arg(
        &self,
        value: impl Into<SqlValue>,
        position: BaseArgPosition,
    ) -> BatchResult<()> {
        let limit = self.spec.reserved_base_args();
        let mut state = self.state.lock();
        if state.base_args.len() + 1 > limit {
            return Err(BatchError::TooManyBaseArgs { limit });
        }
        state.base_args.push(value.into(), position);
        Ok(())
    }

    /// Executes every accumulated chunk and resets the batch.
    ///
    /// The reset drops base arguments along with the rows; a reused instance
    /// must register its base arguments again before the next execution.
    ///
    /// Returns the first chunk error. With one worker that is the earliest
    /// failing chunk; with several it is whichever failure was observed first.
    /// Chunks that already ran are not rolled back here.
    #[instrument(
        level = "debug",
        skip(self),
        fields(kind = %self.spec.kind(), execer = self.handle.kind().as_str())
    )]
    pub fn execute(&self) -> BatchResult<BatchReport> {
        let mut state = self.state.lock();
        let (chunks, base_args) = state.drain();
        let workers = state.workers.max(1);

        check_concurrency(self.handle.kind(), workers)?;

        let chunks = chunks.into_filled();
        if chunks.is_empty() {
            debug!("no rows accumulated, nothing to execute");
            return Ok(BatchReport::default());
        }

        let runner = ChunkRunner::new(
            &self.spec,
            &self.handle,
            &base_args,
            self.observer.as_deref(),
            chunks.len(),
        );
        let result = if workers == 1 {
            run_serial(&runner, &chunks)
        } else {
            run_parallel(&runner, &chunks, workers.min(chunks.len()))
        };

        match &result {
            Ok(report) => info!(
                chunks = report.chunks,
                rows = report.rows,
                rows_affected = report.rows_affected,
                workers,
                "batch executed"
            ),
            Err(error) => warn!(error = %error, workers, "batch failed"),
        }
        result
    }
}

impl fmt::Debug for BatchExecer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchExecer")
            .field("handle", &self.handle)
            .field("spec", &self.spec)
            .field("observer", &self.observer.is_some())
            .finish_non_exhaustive()
    }
}
