use std::path::PathBuf;

use crate::domain::{batch_spec::BatchKind, sql_value::SqlValue};

#[derive(Debug)]
pub struct ExecuteBatchCommand {
    pub database_path: PathBuf,
    pub kind: BatchKind,
    pub base_query: String,
    pub cols: usize,
    pub value_template: Option<String>,
    pub rows_path: PathBuf,
    pub delimiter: char,
    pub base_args_before: Vec<SqlValue>,
    pub base_args_after: Vec<SqlValue>,
    pub workers: usize,
    pub max_placeholders: usize,
    pub reserved_base_args: usize,
}

#[derive(Debug)]
pub struct ExecuteBatchResult {
    pub database_path: PathBuf,
    pub rows: usize,
    pub chunks: usize,
    pub rows_affected: usize,
}
