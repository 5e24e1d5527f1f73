use anyhow::Result;
use console::style;
use tracing_subscriber::EnvFilter;

use sql_batch_execer::ChunkProgress;
use sql_batch_execer::application::use_cases::execute_batch::ExecuteBatchUseCase;
use sql_batch_execer::interfaces::cli::collect_execute_command;

const DEFAULT_LOG_FILTER: &str = "sql_batch_execer=warn";

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_writer(std::io::stderr)
        .init();

    let command = collect_execute_command()?;
    let use_case = ExecuteBatchUseCase::with_observer(|progress: ChunkProgress| {
        println!(
            "{}",
            style(format!(
                "  chunk {}/{} ({} rows)",
                progress.index + 1,
                progress.total,
                progress.rows
            ))
            .dim()
        );
    });

    println!("{}", style("Executing batched SQL...").cyan());
    let result = use_case.execute(command)?;

    println!(
        "{} {} ({} rows in {} chunks, {} rows affected)",
        style("Batch has been applied to").green(),
        style(result.database_path.display()).bold(),
        result.rows,
        result.chunks,
        result.rows_affected,
    );
    Ok(())
}
