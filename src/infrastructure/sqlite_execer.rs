use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use parking_lot::Mutex;
use rusqlite::types::{ToSql, ToSqlOutput, ValueRef};
use rusqlite::{Connection, params_from_iter};

use crate::domain::execer::{ExecOutcome, Execer};
use crate::domain::sql_value::SqlValue;

/// SQLite's default bound-parameter ceiling since 3.32.
pub const SQLITE_MAX_VARIABLES: usize = 32766;

const BUSY_TIMEOUT: Duration = Duration::from_secs(30);

impl ToSql for SqlValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::Borrowed(match self {
            SqlValue::Null => ValueRef::Null,
            SqlValue::Integer(value) => ValueRef::Integer(*value),
            SqlValue::Real(value) => ValueRef::Real(*value),
            SqlValue::Text(value) => ValueRef::Text(value.as_bytes()),
            SqlValue::Blob(bytes) => ValueRef::Blob(bytes),
        }))
    }
}

fn exec_on(connection: &Connection, query: &str, args: &[SqlValue]) -> Result<ExecOutcome> {
    let rows_affected = connection
        .execute(query, params_from_iter(args.iter()))
        .with_context(|| format!("Unable to execute statement with {} args", args.len()))?;
    Ok(ExecOutcome { rows_affected })
}

/// A single SQLite connection. Serial use only.
///
/// Wrap a batch in [`begin`](Self::begin) / [`commit`](Self::commit) to make
/// it atomic.
#[derive(Debug)]
pub struct SqliteConnectionExecer {
    connection: Mutex<Connection>,
}

impl SqliteConnectionExecer {
    pub fn open(path: &Path) -> Result<Self> {
        let connection = Connection::open(path)
            .with_context(|| format!("Unable to open SQLite database: {}", path.display()))?;
        Ok(Self::from_connection(connection))
    }

    pub fn open_in_memory() -> Result<Self> {
        let connection =
            Connection::open_in_memory().context("Unable to open in-memory SQLite database")?;
        Ok(Self::from_connection(connection))
    }

    pub fn from_connection(connection: Connection) -> Self {
        Self {
            connection: Mutex::new(connection),
        }
    }

    pub fn begin(&self) -> Result<()> {
        self.execute_batch("BEGIN")
    }

    pub fn commit(&self) -> Result<()> {
        self.execute_batch("COMMIT")
    }

    pub fn rollback(&self) -> Result<()> {
        self.execute_batch("ROLLBACK")
    }

    /// Runs raw SQL without parameters, e.g. schema setup.
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        self.connection
            .lock()
            .execute_batch(sql)
            .with_context(|| format!("Unable to execute: {sql}"))
    }

    /// Gives temporary access to the connection, e.g. to read rows back.
    pub fn with_connection<T>(&self, f: impl FnOnce(&Connection) -> T) -> T {
        f(&self.connection.lock())
    }
}

impl Execer for SqliteConnectionExecer {
    fn exec(&self, query: &str, args: &[SqlValue]) -> Result<ExecOutcome> {
        exec_on(&self.connection.lock(), query, args)
    }
}

/// Several connections to one database file, usable from many workers.
///
/// Each call takes the first idle connection, starting from a rotating
/// offset, and waits on one if all are busy. SQLite still serialises writers;
/// the busy timeout covers that wait.
#[derive(Debug)]
pub struct SqlitePoolExecer {
    connections: Vec<Mutex<Connection>>,
    next: AtomicUsize,
}

impl SqlitePoolExecer {
    pub fn open(path: &Path, size: usize) -> Result<Self> {
        if size == 0 {
            return Err(anyhow!("Pool size must be greater than 0"));
        }

        let connections = (0..size)
            .map(|_| {
                let connection = Connection::open(path).with_context(|| {
                    format!("Unable to open SQLite database: {}", path.display())
                })?;
                connection
                    .busy_timeout(BUSY_TIMEOUT)
                    .context("Unable to set SQLite busy timeout")?;
                Ok::<_, anyhow::Error>(Mutex::new(connection))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            connections,
            next: AtomicUsize::new(0),
        })
    }
}

impl Execer for SqlitePoolExecer {
    fn exec(&self, query: &str, args: &[SqlValue]) -> Result<ExecOutcome> {
        let size = self.connections.len();
        let start = self.next.fetch_add(1, Ordering::Relaxed) % size;

        for offset in 0..size {
            if let Some(connection) = self.connections[(start + offset) % size].try_lock() {
                return exec_on(&connection, query, args);
            }
        }
        exec_on(&self.connections[start].lock(), query, args)
    }
}
