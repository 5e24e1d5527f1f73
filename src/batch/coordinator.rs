use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::thread;

use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use crate::batch::chunk::Chunk;
use crate::batch::render::render_chunk;
use crate::domain::base_arg::BaseArgs;
use crate::domain::batch_spec::BatchSpec;
use crate::domain::error::{BatchError, BatchResult};
use crate::domain::execer::{ExecHandle, ExecOutcome, ExecerKind};
use crate::domain::progress::{ChunkObserver, ChunkProgress};

/// Totals for a batch whose chunks all executed without error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub chunks: usize,
    pub rows: usize,
    pub rows_affected: usize,
}

impl BatchReport {
    fn record(&mut self, done: ChunkDone) {
        self.chunks += 1;
        self.rows += done.rows;
        self.rows_affected += done.outcome.rows_affected;
    }
}

#[derive(Debug, Clone, Copy)]
struct ChunkDone {
    rows: usize,
    outcome: ExecOutcome,
}

enum WorkerEvent {
    Finished(BatchResult<ChunkDone>),
    Done,
}

/// Refuses worker counts the executor can't serve safely.
pub(crate) fn check_concurrency(kind: ExecerKind, workers: usize) -> BatchResult<()> {
    if workers <= 1 {
        return Ok(());
    }
    match kind {
        ExecerKind::Pool => Ok(()),
        ExecerKind::Transaction => Err(BatchError::ConcurrentTransaction { workers }),
        ExecerKind::Unknown => Err(BatchError::UnknownExecer { workers }),
    }
}

/// Renders and submits chunks of one drained batch.
pub(crate) struct ChunkRunner<'a> {
    spec: &'a BatchSpec,
    handle: &'a ExecHandle,
    base_args: &'a BaseArgs,
    observer: Option<&'a dyn ChunkObserver>,
    total: usize,
}

impl<'a> ChunkRunner<'a> {
    pub(crate) fn new(
        spec: &'a BatchSpec,
        handle: &'a ExecHandle,
        base_args: &'a BaseArgs,
        observer: Option<&'a dyn ChunkObserver>,
        total: usize,
    ) -> Self {
        Self {
            spec,
            handle,
            base_args,
            observer,
            total,
        }
    }

    fn dispatch(&self, index: usize, chunk: &Chunk) {
        debug!(
            chunk = index + 1,
            total = self.total,
            rows = chunk.len(),
            "dispatching chunk"
        );
        if let Some(observer) = self.observer {
            observer.chunk_dispatched(ChunkProgress {
                index,
                total: self.total,
                rows: chunk.len(),
            });
        }
    }

    fn run_chunk(&self, index: usize, chunk: &Chunk) -> BatchResult<ChunkDone> {
        let Some(statement) = render_chunk(self.spec, chunk, self.base_args) else {
            return Ok(ChunkDone {
                rows: 0,
                outcome: ExecOutcome::default(),
            });
        };

        let outcome = self
            .handle
            .exec(&statement.query, &statement.args)
            .map_err(|source| {
                warn!(chunk = index + 1, total = self.total, error = %source, "chunk failed");
                BatchError::Exec {
                    chunk: index,
                    total: self.total,
                    source,
                }
            })?;

        Ok(ChunkDone {
            rows: chunk.len(),
            outcome,
        })
    }
}

/// Executes chunks one by one, stopping at the first failure.
pub(crate) fn run_serial(runner: &ChunkRunner<'_>, chunks: &[Chunk]) -> BatchResult<BatchReport> {
    let mut report = BatchReport::default();
    for (index, chunk) in chunks.iter().enumerate() {
        runner.dispatch(index, chunk);
        report.record(runner.run_chunk(index, chunk)?);
    }
    Ok(report)
}

/// Fans chunks out to `workers` threads through a bounded queue.
///
/// The first error observed wins; it is not necessarily the lowest chunk
/// index. Queued chunks are skipped once an error is seen, but every worker
/// is joined before returning.
pub(crate) fn run_parallel(
    runner: &ChunkRunner<'_>,
    chunks: &[Chunk],
    workers: usize,
) -> BatchResult<BatchReport> {
    let (work_tx, work_rx) = mpsc::sync_channel::<(usize, &Chunk)>(workers);
    let work_rx = Mutex::new(work_rx);
    let (event_tx, event_rx) = mpsc::sync_channel::<WorkerEvent>(workers);
    let cancelled = AtomicBool::new(false);

    thread::scope(|scope| {
        for worker in 0..workers {
            let event_tx = event_tx.clone();
            let work_rx = &work_rx;
            let cancelled = &cancelled;
            scope.spawn(move || {
                loop {
                    let next = work_rx.lock().recv();
                    let Ok((index, chunk)) = next else {
                        break;
                    };
                    if cancelled.load(Ordering::Acquire) {
                        trace!(worker, chunk = index + 1, "skipping chunk after failure");
                        continue;
                    }
                    let result = runner.run_chunk(index, chunk);
                    if event_tx.send(WorkerEvent::Finished(result)).is_err() {
                        break;
                    }
                }
                trace!(worker, "worker drained");
                let _ = event_tx.send(WorkerEvent::Done);
            });
        }
        drop(event_tx);

        let producer_cancelled = &cancelled;
        scope.spawn(move || {
            for (index, chunk) in chunks.iter().enumerate() {
                if producer_cancelled.load(Ordering::Acquire) {
                    break;
                }
                runner.dispatch(index, chunk);
                if work_tx.send((index, chunk)).is_err() {
                    break;
                }
            }
        });

        let mut report = BatchReport::default();
        let mut first_error = None;
        let mut alive = workers;
        while alive > 0 {
            match event_rx.recv() {
                Ok(WorkerEvent::Finished(Ok(done))) => report.record(done),
                Ok(WorkerEvent::Finished(Err(error))) => {
                    if first_error.is_none() {
                        cancelled.store(true, Ordering::Release);
                        first_error = Some(error);
                    } else {
                        debug!(error = %error, "additional chunk failure after the first");
                    }
                }
                Ok(WorkerEvent::Done) => alive -= 1,
                Err(_) => break,
            }
        }

        match first_error {
            Some(error) => Err(error),
            None => Ok(report),
        }
    })
}
