use thiserror::Error;

use crate::domain::batch_spec::BatchKind;

/// Errors raised by the batch engine.
///
/// Every variant except [`BatchError::Exec`] is a configuration error and is
/// raised by the call that caused it, before any statement reaches the
/// executor.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("Column count must be at least 1")]
    ZeroColumns,
    #[error(
        "Unsupported number of columns for {kind} batch: {cols}, it must be 1"
    )]
    UnsupportedColumnCount { kind: BatchKind, cols: usize },
    #[error(
        "Base query must contain exactly one `%s` marker, found {found}"
    )]
    SubstitutionMarker { found: usize },
    #[error("Value template must not be empty")]
    EmptyValueTemplate,
    #[error(
        "Placeholder ceiling {max} leaves no room for a {cols}-column row after {reserved} reserved slots"
    )]
    PlaceholderCeilingTooLow {
        max: usize,
        reserved: usize,
        cols: usize,
    },
    #[error("More base args than expected: at most {limit} are reserved")]
    TooManyBaseArgs { limit: usize },
    #[error("Can't use {workers} workers on a transaction-bound executor")]
    ConcurrentTransaction { workers: usize },
    #[error("Unknown executor type can't be used with {workers} workers")]
    UnknownExecer { workers: usize },
    #[error("Failed to execute chunk {} of {total}", .chunk + 1)]
    Exec {
        chunk: usize,
        total: usize,
        #[source]
        source: anyhow::Error,
    },
}

impl BatchError {
    pub fn is_configuration(&self) -> bool {
        !matches!(self, BatchError::Exec { .. })
    }
}

pub type BatchResult<T> = Result<T, BatchError>;
