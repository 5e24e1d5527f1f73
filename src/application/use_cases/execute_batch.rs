use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use tracing::{info, warn};

use crate::{
    application::commands::{ExecuteBatchCommand, ExecuteBatchResult},
    batch::{BatchExecer, BatchReport},
    domain::{
        base_arg::BaseArgPosition,
        batch_spec::{BatchKind, BatchSpec},
        execer::ExecHandle,
        progress::{ChunkObserver, ChunkProgress},
        sql_value::SqlValue,
    },
    infrastructure::{
        rows_file::read_rows,
        sqlite_execer::{SqliteConnectionExecer, SqlitePoolExecer},
    },
};

#[derive(Default)]
pub struct ExecuteBatchUseCase {
    observer: Option<Arc<dyn ChunkObserver>>,
}

impl ExecuteBatchUseCase {
    pub fn with_observer(observer: impl ChunkObserver + 'static) -> Self {
        Self {
            observer: Some(Arc::new(observer)),
        }
    }

    /// Loads the rows file and runs the batch against the SQLite database.
    ///
    /// One worker runs inside a single transaction that is rolled back on
    /// failure. More workers use a connection pool and commit per chunk.
    pub fn execute(&self, command: ExecuteBatchCommand) -> Result<ExecuteBatchResult> {
        let spec = build_spec(&command)?;
        let rows = read_rows(&command.rows_path, command.delimiter, command.cols)?;
        let row_count = rows.len();
        let workers = command.workers.max(1);
        info!(rows = row_count, workers, kind = %spec.kind(), "rows loaded");

        let report = if workers > 1 {
            let pool = Arc::new(SqlitePoolExecer::open(&command.database_path, workers)?);
            let batch = self.prepare(ExecHandle::pool(pool), spec, &command, rows)?;
            batch.use_workers(workers);
            batch.execute().context("Batch execution failed")?
        } else {
            let connection = Arc::new(SqliteConnectionExecer::open(&command.database_path)?);
            let batch =
                self.prepare(ExecHandle::transaction(connection.clone()), spec, &command, rows)?;
            run_in_transaction(&connection, &batch)?
        };

        Ok(ExecuteBatchResult {
            database_path: command.database_path,
            rows: row_count,
            chunks: report.chunks,
            rows_affected: report.rows_affected,
        })
    }

    fn prepare(
        &self,
        handle: ExecHandle,
        spec: BatchSpec,
        command: &ExecuteBatchCommand,
        rows: Vec<Vec<SqlValue>>,
    ) -> Result<BatchExecer> {
        let mut batch = BatchExecer::new(handle, spec)?;
        if let Some(observer) = self.observer.clone() {
            batch = batch.with_observer(move |progress: ChunkProgress| {
                observer.chunk_dispatched(progress)
            });
        }

        for value in &command.base_args_before {
            batch.add_base_arg(value.clone(), BaseArgPosition::Before)?;
        }
        for value in &command.base_args_after {
            batch.add_base_arg(value.clone(), BaseArgPosition::After)?;
        }
        for row in rows {
            batch.add_row(row);
        }
        Ok(batch)
    }
}

fn build_spec(command: &ExecuteBatchCommand) -> Result<BatchSpec> {
    let spec = match (command.kind, command.value_template.as_deref()) {
        (BatchKind::Custom, Some(template)) => {
            BatchSpec::custom(&command.base_query, command.cols, template)?
        }
        (BatchKind::Custom, None) => {
            return Err(anyhow!("A value template is required in custom mode"));
        }
        (kind, Some(_)) => {
            return Err(anyhow!(
                "A value template can only be used in custom mode, not {kind} mode"
            ));
        }
        (BatchKind::Inserter, None) => BatchSpec::inserter(&command.base_query, command.cols)?,
        (BatchKind::Updater, None) => BatchSpec::updater(&command.base_query, command.cols)?,
    };

    Ok(spec
        .with_reserved_base_args(command.reserved_base_args)
        .with_max_placeholders(command.max_placeholders))
}

fn run_in_transaction(
    connection: &SqliteConnectionExecer,
    batch: &BatchExecer,
) -> Result<BatchReport> {
    connection.begin()?;
    match batch.execute() {
        Ok(report) => {
            connection.commit()?;
            Ok(report)
        }
        Err(error) => {
            if let Err(rollback_error) = connection.rollback() {
                warn!(error = %rollback_error, "rollback failed");
            }
            Err(error).context("Batch execution failed, transaction rolled back")
        }
    }
}
