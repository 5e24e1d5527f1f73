use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use anyhow::{Context, Result, anyhow};

use crate::domain::sql_value::SqlValue;

/// Reads one row per non-blank line, splitting fields on `delimiter`.
///
/// Lines starting with `#` are skipped. Each field goes through
/// [`SqlValue::parse_literal`].
pub fn read_rows(path: &Path, delimiter: char, cols: usize) -> Result<Vec<Vec<SqlValue>>> {
    let file = File::open(path)
        .with_context(|| format!("Unable to open rows file: {}", path.display()))?;
    parse_rows(BufReader::new(file), delimiter, cols)
        .with_context(|| format!("Invalid rows file: {}", path.display()))
}

pub fn parse_rows<R: BufRead>(
    reader: R,
    delimiter: char,
    cols: usize,
) -> Result<Vec<Vec<SqlValue>>> {
    let mut rows = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let row = trimmed
            .split(delimiter)
            .map(SqlValue::parse_literal)
            .collect::<Vec<_>>();
        if row.len() != cols {
            return Err(anyhow!(
                "Line {} has {} fields, expected {cols}",
                index + 1,
                row.len()
            ));
        }
        rows.push(row);
    }
    Ok(rows)
}
