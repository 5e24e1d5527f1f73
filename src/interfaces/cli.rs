use std::{
    env, fs,
    path::{Path, PathBuf},
};

use anyhow::{Result, anyhow};
use clap::{Parser, ValueEnum};
use console::style;
use dialoguer::{Editor, Input, Select, theme::ColorfulTheme};

use crate::{
    application::commands::ExecuteBatchCommand,
    domain::{
        batch_spec::{BatchKind, DEFAULT_RESERVED_BASE_ARGS},
        sql_value::SqlValue,
    },
    infrastructure::sqlite_execer::SQLITE_MAX_VARIABLES,
};

const DEFAULT_WORKERS: usize = 1;
const DEFAULT_DELIMITER: char = ',';
const DEFAULT_DATABASE: &str = "batch.db";

#[derive(Debug, Parser)]
#[command(
    name = "sql-batch-execer",
    version,
    about = "Run rows through one bulk statement, chunked under the placeholder limit"
)]
struct CliArgs {
    #[arg(long, short = 'D', help = "SQLite database file")]
    database: Option<PathBuf>,
    #[arg(long, short = 'q', help = "Base query with one %s marker")]
    query: Option<String>,
    #[arg(long, short = 'f', help = "Read the base query from file path")]
    query_file: Option<PathBuf>,
    #[arg(long, short = 'm', value_enum, default_value_t = CliMode::Insert)]
    mode: CliMode,
    #[arg(long, short = 'c', help = "Values per row")]
    cols: Option<usize>,
    #[arg(long, short = 't', help = "Per-row value group, custom mode only")]
    value_template: Option<String>,
    #[arg(long, short = 'r', help = "Delimited rows file, one row per line")]
    rows: Option<PathBuf>,
    #[arg(long, default_value_t = DEFAULT_DELIMITER)]
    delimiter: char,
    #[arg(long = "before-arg", help = "Base argument bound before rows")]
    before_args: Vec<String>,
    #[arg(long = "after-arg", help = "Base argument bound after rows")]
    after_args: Vec<String>,
    #[arg(long, short = 'w', default_value_t = DEFAULT_WORKERS)]
    workers: usize,
    #[arg(long, default_value_t = SQLITE_MAX_VARIABLES)]
    max_placeholders: usize,
    #[arg(long, default_value_t = DEFAULT_RESERVED_BASE_ARGS)]
    reserved_base_args: usize,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliMode {
    Insert,
    Update,
    Custom,
}

impl From<CliMode> for BatchKind {
    fn from(value: CliMode) -> Self {
        match value {
            CliMode::Insert => BatchKind::Inserter,
            CliMode::Update => BatchKind::Updater,
            CliMode::Custom => BatchKind::Custom,
        }
    }
}

pub fn collect_execute_command() -> Result<ExecuteBatchCommand> {
    if env::args_os().len() == 1 {
        return collect_interactive_command();
    }
    collect_command_from_args(CliArgs::parse())
}

fn collect_command_from_args(args: CliArgs) -> Result<ExecuteBatchCommand> {
    let database_path = args
        .database
        .ok_or_else(|| anyhow!("--database is required when using argument mode"))?;
    let rows_path = args
        .rows
        .ok_or_else(|| anyhow!("--rows is required when using argument mode"))?;
    let cols = args
        .cols
        .ok_or_else(|| anyhow!("--cols is required when using argument mode"))?;

    let base_query = read_query_from_sources(args.query, args.query_file)?;

    Ok(ExecuteBatchCommand {
        database_path,
        kind: args.mode.into(),
        base_query,
        cols,
        value_template: args.value_template,
        rows_path,
        delimiter: args.delimiter,
        base_args_before: parse_base_args(&args.before_args),
        base_args_after: parse_base_args(&args.after_args),
        workers: args.workers,
        max_placeholders: args.max_placeholders,
        reserved_base_args: args.reserved_base_args,
    })
}

fn collect_interactive_command() -> Result<ExecuteBatchCommand> {
    let theme = ColorfulTheme::default();

    println!();
    println!(
        "{}",
        style(" SQL BATCH EXECER ")
            .black()
            .on_cyan()
            .bold()
            .underlined()
    );
    println!("{}", style("Chunked bulk statements").dim());
    println!();

    let database: String = Input::with_theme(&theme)
        .with_prompt("SQLite database file")
        .default(DEFAULT_DATABASE.to_string())
        .interact_text()?;

    let modes = [BatchKind::Inserter, BatchKind::Updater, BatchKind::Custom];
    let mode_items = modes.iter().map(|kind| kind.as_str()).collect::<Vec<_>>();
    let selected_mode_index = Select::with_theme(&theme)
        .with_prompt("Statement kind")
        .default(0)
        .items(&mode_items)
        .interact()?;
    let kind = modes[selected_mode_index];

    let cols: usize = if kind == BatchKind::Updater {
        1
    } else {
        Input::with_theme(&theme)
            .with_prompt("Values per row")
            .validate_with(|value: &usize| {
                if *value == 0 {
                    Err("Values per row must be greater than 0")
                } else {
                    Ok(())
                }
            })
            .interact_text()?
    };

    let source_options = ["Edit query in your editor", "Load query from file"];
    let source_index = Select::with_theme(&theme)
        .with_prompt("Base query source")
        .default(0)
        .items(&source_options)
        .interact()?;

    let base_query = if source_index == 0 {
        let edited_query = Editor::new()
            .extension(".sql")
            .edit("-- one %s marks where the value groups go\n")?
            .ok_or_else(|| anyhow!("No query input detected from editor"))?;
        ensure_non_empty_value(strip_sql_comments(&edited_query), "Base query")?
    } else {
        let query_file_path: String = Input::with_theme(&theme)
            .with_prompt("Query file path")
            .interact_text()?;
        read_query_file(Path::new(query_file_path.trim()))?
    };

    let value_template = if kind == BatchKind::Custom {
        let template: String = Input::with_theme(&theme)
            .with_prompt("Value group template, e.g. (NULL, ?, ?)")
            .validate_with(|value: &String| {
                if value.trim().is_empty() {
                    Err("Value template must not be empty")
                } else {
                    Ok(())
                }
            })
            .interact_text()?;
        Some(template.trim().to_string())
    } else {
        None
    };

    let rows_path: String = Input::with_theme(&theme)
        .with_prompt("Rows file path")
        .interact_text()?;

    let workers: usize = Input::with_theme(&theme)
        .with_prompt("Workers")
        .default(DEFAULT_WORKERS)
        .interact_text()?;

    Ok(ExecuteBatchCommand {
        database_path: PathBuf::from(database.trim()),
        kind,
        base_query,
        cols,
        value_template,
        rows_path: PathBuf::from(rows_path.trim()),
        delimiter: DEFAULT_DELIMITER,
        base_args_before: Vec::new(),
        base_args_after: Vec::new(),
        workers,
        max_placeholders: SQLITE_MAX_VARIABLES,
        reserved_base_args: DEFAULT_RESERVED_BASE_ARGS,
    })
}

fn parse_base_args(raw_args: &[String]) -> Vec<SqlValue> {
    raw_args
        .iter()
        .map(|raw| SqlValue::parse_literal(raw))
        .collect()
}

fn strip_sql_comments(text: &str) -> String {
    text.lines()
        .filter(|line| !line.trim_start().starts_with("--"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn read_query_from_sources(query: Option<String>, query_file: Option<PathBuf>) -> Result<String> {
    match (query, query_file) {
        (Some(_), Some(_)) => Err(anyhow!(
            "Please provide only one of --query or --query-file"
        )),
        (Some(query_text), None) => ensure_non_empty_value(query_text, "Base query"),
        (None, Some(file_path)) => read_query_file(&file_path),
        (None, None) => Err(anyhow!(
            "One of --query or --query-file is required when using argument mode"
        )),
    }
}

fn read_query_file(path: &Path) -> Result<String> {
    let content = fs::read_to_string(path)
        .map_err(|error| anyhow!("Unable to read query file {}: {error}", path.display()))?;
    ensure_non_empty_value(content.trim().to_string(), "Base query")
}

fn ensure_non_empty_value(value: String, field_name: &str) -> Result<String> {
    if value.trim().is_empty() {
        return Err(anyhow!("{field_name} must not be empty"));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use std::{
        fs,
        path::PathBuf,
        time::{SystemTime, UNIX_EPOCH},
    };

    use clap::Parser;

    use super::{CliArgs, collect_command_from_args, strip_sql_comments};
    use crate::domain::{batch_spec::BatchKind, sql_value::SqlValue};

    fn build_temp_query_file(content: &str) -> PathBuf {
        let unique_suffix = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time should be after unix epoch")
            .as_nanos();
        let path = std::env::temp_dir().join(format!("sql_batch_execer_cli_{unique_suffix}.sql"));
        fs::write(&path, content).expect("temp query file should be written");
        path
    }

    #[test]
    fn parses_args_mode_with_inline_query_and_base_args() {
        let args = CliArgs::try_parse_from([
            "sql-batch-execer",
            "--database",
            "app.db",
            "--query",
            "UPDATE mytable SET other = 'nub' WHERE id > ? AND name IN(%s) AND other = ?",
            "--mode",
            "update",
            "--cols",
            "1",
            "--rows",
            "names.csv",
            "--before-arg",
            "0",
            "--after-arg",
            "'dev'",
            "--workers",
            "4",
        ])
        .expect("cli args should parse");

        let command = collect_command_from_args(args).expect("command should be created");

        assert_eq!(command.database_path, PathBuf::from("app.db"));
        assert_eq!(command.kind, BatchKind::Updater);
        assert_eq!(command.cols, 1);
        assert_eq!(command.rows_path, PathBuf::from("names.csv"));
        assert_eq!(command.base_args_before, vec![SqlValue::Integer(0)]);
        assert_eq!(
            command.base_args_after,
            vec![SqlValue::Text("dev".to_string())]
        );
        assert_eq!(command.workers, 4);
        assert_eq!(command.max_placeholders, 32766);
        assert_eq!(command.reserved_base_args, 10);
        assert_eq!(command.delimiter, ',');
    }

    #[test]
    fn parses_args_mode_with_query_file() {
        let query_file = build_temp_query_file("INSERT INTO mytable (id, name, other) VALUES %s\n");

        let args = CliArgs::try_parse_from([
            "sql-batch-execer",
            "-D",
            "app.db",
            "-c",
            "2",
            "-r",
            "rows.tsv",
            "--delimiter",
            "\t",
            "-m",
            "custom",
            "-t",
            "(NULL, ?, ?)",
            "--query-file",
            query_file
                .to_str()
                .expect("temp query path should be valid utf8 for test"),
        ])
        .expect("cli args should parse");

        let command = collect_command_from_args(args).expect("command should be created");
        assert_eq!(
            command.base_query,
            "INSERT INTO mytable (id, name, other) VALUES %s"
        );
        assert_eq!(command.kind, BatchKind::Custom);
        assert_eq!(command.value_template.as_deref(), Some("(NULL, ?, ?)"));
        assert_eq!(command.delimiter, '\t');

        fs::remove_file(query_file).expect("temp query file should be removed");
    }

    #[test]
    fn rejects_when_both_query_and_query_file_are_provided() {
        let query_file = build_temp_query_file("DELETE FROM t WHERE id IN (%s)");

        let args = CliArgs::try_parse_from([
            "sql-batch-execer",
            "-D",
            "app.db",
            "-c",
            "1",
            "-r",
            "ids.csv",
            "--query",
            "DELETE FROM t WHERE id IN (%s)",
            "--query-file",
            query_file
                .to_str()
                .expect("temp query path should be valid utf8 for test"),
        ])
        .expect("cli args should parse");

        let error = collect_command_from_args(args).expect_err("should reject dual query sources");
        assert!(
            error
                .to_string()
                .contains("Please provide only one of --query or --query-file")
        );

        fs::remove_file(query_file).expect("temp query file should be removed");
    }

    #[test]
    fn rejects_when_required_args_are_missing() {
        let missing_database = CliArgs::try_parse_from([
            "sql-batch-execer",
            "--cols",
            "1",
            "--rows",
            "ids.csv",
            "--query",
            "DELETE FROM t WHERE id IN (%s)",
        ])
        .expect("cli args should parse");
        let error = collect_command_from_args(missing_database)
            .expect_err("missing database should be rejected");
        assert!(
            error
                .to_string()
                .contains("--database is required when using argument mode")
        );

        let missing_cols = CliArgs::try_parse_from([
            "sql-batch-execer",
            "--database",
            "app.db",
            "--rows",
            "ids.csv",
            "--query",
            "DELETE FROM t WHERE id IN (%s)",
        ])
        .expect("cli args should parse");
        let error =
            collect_command_from_args(missing_cols).expect_err("missing cols should be rejected");
        assert!(
            error
                .to_string()
                .contains("--cols is required when using argument mode")
        );
    }

    #[test]
    fn editor_comment_lines_are_dropped() {
        assert_eq!(
            strip_sql_comments("-- hint\nINSERT INTO t VALUES %s\n  -- trailing"),
            "INSERT INTO t VALUES %s"
        );
    }
}
