use std::fmt;
use std::sync::Arc;

use anyhow::Result;

use crate::domain::sql_value::SqlValue;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecOutcome {
    pub rows_affected: usize,
}

/// Runs one rendered statement with its flattened arguments.
///
/// Implementations own connection handling, transactions and retries.
pub trait Execer: Send + Sync {
    fn exec(&self, query: &str, args: &[SqlValue]) -> Result<ExecOutcome>;
}

/// Declares whether an executor may be driven from several workers at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecerKind {
    /// Bound to a single connection or open transaction; serial use only.
    Transaction,
    /// Backed by several connections; any worker count is fine.
    Pool,
    Unknown,
}

impl ExecerKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ExecerKind::Transaction => "transaction",
            ExecerKind::Pool => "pool",
            ExecerKind::Unknown => "unknown",
        }
    }
}

/// An executor paired with its declared [`ExecerKind`].
#[derive(Clone)]
pub struct ExecHandle {
    execer: Arc<dyn Execer>,
    kind: ExecerKind,
}

impl ExecHandle {
    pub fn new(execer: Arc<dyn Execer>, kind: ExecerKind) -> Self {
        Self { execer, kind }
    }

    pub fn transaction(execer: Arc<dyn Execer>) -> Self {
        Self::new(execer, ExecerKind::Transaction)
    }

    pub fn pool(execer: Arc<dyn Execer>) -> Self {
        Self::new(execer, ExecerKind::Pool)
    }

    pub fn unknown(execer: Arc<dyn Execer>) -> Self {
        Self::new(execer, ExecerKind::Unknown)
    }

    pub fn kind(&self) -> ExecerKind {
        self.kind
    }

    pub fn exec(&self, query: &str, args: &[SqlValue]) -> Result<ExecOutcome> {
        self.execer.exec(query, args)
    }
}

impl fmt::Debug for ExecHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecHandle")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}
