//! Chunked execution of bulk parameterized SQL statements.
//!
//! Rows are collected by a [`BatchExecer`], split into chunks that keep every
//! rendered statement under the engine's placeholder ceiling, and handed to an
//! [`Execer`] one chunk at a time or across a pool of worker threads.

pub mod application;
pub mod batch;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;

pub use batch::{BatchExecer, BatchReport, RenderedStatement};
pub use domain::{
    base_arg::BaseArgPosition,
    batch_spec::{BatchKind, BatchSpec, DEFAULT_RESERVED_BASE_ARGS, MAX_SQL_PLACEHOLDERS},
    error::{BatchError, BatchResult},
    execer::{ExecHandle, ExecOutcome, Execer, ExecerKind},
    progress::{ChunkObserver, ChunkProgress},
    sql_value::SqlValue,
};
