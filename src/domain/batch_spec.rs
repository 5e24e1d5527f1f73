use std::fmt::{self, Display};
use std::sync::LazyLock;

use regex::Regex;

use crate::domain::error::{BatchError, BatchResult};

/// Parameter ceiling shared by the common SQL engines.
pub const MAX_SQL_PLACEHOLDERS: usize = 65535;
pub const DEFAULT_RESERVED_BASE_ARGS: usize = 10;

static FORMAT_DIRECTIVE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("%[%s]").expect("format directive regex is valid"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchKind {
    Inserter,
    Updater,
    Custom,
}

impl BatchKind {
    pub fn as_str(self) -> &'static str {
        match self {
            BatchKind::Inserter => "insert",
            BatchKind::Updater => "update",
            BatchKind::Custom => "custom",
        }
    }
}

impl Display for BatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The base query split around its single `%s` marker.
///
/// `%%` is unescaped to `%` on both sides; any other `%` sequence is kept
/// verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
struct QueryTemplate {
    head: String,
    tail: String,
}

impl QueryTemplate {
    fn parse(raw: &str) -> BatchResult<Self> {
        let mut head = String::with_capacity(raw.len());
        let mut tail = String::new();
        let mut markers = 0usize;
        let mut cursor = 0usize;

        for directive in FORMAT_DIRECTIVE.find_iter(raw) {
            let target = if markers == 0 { &mut head } else { &mut tail };
            target.push_str(&raw[cursor..directive.start()]);
            if directive.as_str() == "%%" {
                target.push('%');
            } else {
                markers += 1;
            }
            cursor = directive.end();
        }

        if markers != 1 {
            return Err(BatchError::SubstitutionMarker { found: markers });
        }
        tail.push_str(&raw[cursor..]);
        Ok(Self { head, tail })
    }

    fn render(&self, values: &str) -> String {
        let mut statement = String::with_capacity(self.head.len() + values.len() + self.tail.len());
        statement.push_str(&self.head);
        statement.push_str(values);
        statement.push_str(&self.tail);
        statement
    }
}

/// Everything the accumulator needs to size and render its chunks.
#[derive(Debug, Clone)]
pub struct BatchSpec {
    kind: BatchKind,
    query: QueryTemplate,
    cols: usize,
    value_template: String,
    max_placeholders: usize,
    reserved_base_args: usize,
}

impl BatchSpec {
    /// Multi-row INSERT: each row renders as `(?, ?, ...)` with `cols` placeholders.
    pub fn inserter(base_query: &str, cols: usize) -> BatchResult<Self> {
        Self::new(
            BatchKind::Inserter,
            base_query,
            cols,
            default_value_template(cols),
        )
    }

    /// UPDATE driven by a single `IN (...)` style column list.
    pub fn updater(base_query: &str, cols: usize) -> BatchResult<Self> {
        Self::new(
            BatchKind::Updater,
            base_query,
            cols,
            default_value_template(cols),
        )
    }

    pub fn custom(base_query: &str, cols: usize, value_template: &str) -> BatchResult<Self> {
        Self::new(
            BatchKind::Custom,
            base_query,
            cols,
            value_template.to_string(),
        )
    }

    fn new(
        kind: BatchKind,
        base_query: &str,
        cols: usize,
        value_template: String,
    ) -> BatchResult<Self> {
        if cols == 0 {
            return Err(BatchError::ZeroColumns);
        }
        if kind == BatchKind::Updater && cols != 1 {
            return Err(BatchError::UnsupportedColumnCount { kind, cols });
        }
        if value_template.trim().is_empty() {
            return Err(BatchError::EmptyValueTemplate);
        }

        Ok(Self {
            kind,
            query: QueryTemplate::parse(base_query)?,
            cols,
            value_template,
            max_placeholders: MAX_SQL_PLACEHOLDERS,
            reserved_base_args: DEFAULT_RESERVED_BASE_ARGS,
        })
    }

    pub fn with_max_placeholders(mut self, max_placeholders: usize) -> Self {
        self.max_placeholders = max_placeholders;
        self
    }

    pub fn with_reserved_base_args(mut self, reserved_base_args: usize) -> Self {
        self.reserved_base_args = reserved_base_args;
        self
    }

    /// Fails when the limits leave no room for a single row per chunk.
    pub fn check_capacity(&self) -> BatchResult<()> {
        if self.rows_per_chunk() == 0 {
            return Err(BatchError::PlaceholderCeilingTooLow {
                max: self.max_placeholders,
                reserved: self.reserved_base_args,
                cols: self.cols,
            });
        }
        Ok(())
    }

    /// Rows that fit in one statement once the base argument slots are set aside.
    pub fn rows_per_chunk(&self) -> usize {
        self.max_placeholders.saturating_sub(self.reserved_base_args) / self.cols
    }

    pub fn kind(&self) -> BatchKind {
        self.kind
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn value_template(&self) -> &str {
        &self.value_template
    }

    pub fn max_placeholders(&self) -> usize {
        self.max_placeholders
    }

    pub fn reserved_base_args(&self) -> usize {
        self.reserved_base_args
    }

    pub(crate) fn render_query(&self, values: &str) -> String {
        self.query.render(values)
    }
}

/// `(?, ?, ?)` for three columns.
pub fn default_value_template(cols: usize) -> String {
    format!("({})", vec!["?"; cols].join(", "))
}
