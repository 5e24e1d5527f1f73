use std::fmt::{self, Display};

/// A single bound parameter: one cell of a row or one base argument.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl SqlValue {
    /// Parses a literal as typed on the command line or in a row file.
    ///
    /// `NULL` (any case) becomes [`SqlValue::Null`], integers and floats keep
    /// their numeric type, `'quoted'` text drops the quotes and unescapes `''`,
    /// and anything else is taken verbatim as text.
    pub fn parse_literal(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.eq_ignore_ascii_case("null") {
            return SqlValue::Null;
        }
        if let Ok(value) = trimmed.parse::<i64>() {
            return SqlValue::Integer(value);
        }
        if let Ok(value) = trimmed.parse::<f64>() {
            if value.is_finite() {
                return SqlValue::Real(value);
            }
        }
        if let Some(inner) = trimmed
            .strip_prefix('\'')
            .and_then(|rest| rest.strip_suffix('\''))
        {
            return SqlValue::Text(inner.replace("''", "'"));
        }
        SqlValue::Text(trimmed.to_string())
    }
}

impl Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Null => f.write_str("NULL"),
            SqlValue::Integer(value) => write!(f, "{value}"),
            SqlValue::Real(value) => write!(f, "{value}"),
            SqlValue::Text(value) => write!(f, "'{}'", value.replace('\'', "''")),
            SqlValue::Blob(bytes) => write!(f, "<{} bytes>", bytes.len()),
        }
    }
}

macro_rules! impl_from_integer {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for SqlValue {
                fn from(value: $ty) -> Self {
                    SqlValue::Integer(i64::from(value))
                }
            }
        )*
    };
}

impl_from_integer!(i8, i16, i32, i64, u8, u16, u32);

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        SqlValue::Integer(i64::from(value))
    }
}

impl From<f32> for SqlValue {
    fn from(value: f32) -> Self {
        SqlValue::Real(f64::from(value))
    }
}

impl From<f64> for SqlValue {
    fn from(value: f64) -> Self {
        SqlValue::Real(value)
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

impl From<Vec<u8>> for SqlValue {
    fn from(value: Vec<u8>) -> Self {
        SqlValue::Blob(value)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(SqlValue::Null, Into::into)
    }
}

/// Builds one row (`Vec<SqlValue>`) out of mixed literals.
///
/// ```
/// use sql_batch_execer::{row, SqlValue};
///
/// let values = row![SqlValue::Null, "roobs", 7];
/// assert_eq!(values.len(), 3);
/// ```
#[macro_export]
macro_rules! row {
    ($($value:expr),* $(,)?) => {
        vec![$($crate::SqlValue::from($value)),*]
    };
}
