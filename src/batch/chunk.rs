use crate::domain::sql_value::SqlValue;

/// Rows that will be rendered into one statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Chunk {
    rows: Vec<Vec<SqlValue>>,
}

impl Chunk {
    pub fn from_rows(rows: Vec<Vec<SqlValue>>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[Vec<SqlValue>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub(crate) fn push(&mut self, row: Vec<SqlValue>) {
        self.rows.push(row);
    }
}

/// Append-only chunk list whose last entry is the one being filled.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ChunkList {
    chunks: Vec<Chunk>,
}

impl Default for ChunkList {
    fn default() -> Self {
        Self {
            chunks: vec![Chunk::default()],
        }
    }
}

impl ChunkList {
    /// Appends to the current chunk and opens a new one once it holds `capacity` rows.
    pub(crate) fn push_row(&mut self, row: Vec<SqlValue>, capacity: usize) {
        let current = self.current_mut();
        current.push(row);
        if current.len() >= capacity {
            self.chunks.push(Chunk::default());
        }
    }

    fn current_mut(&mut self) -> &mut Chunk {
        if self.chunks.is_empty() {
            self.chunks.push(Chunk::default());
        }
        let last = self.chunks.len() - 1;
        &mut self.chunks[last]
    }

    pub(crate) fn row_count(&self) -> usize {
        self.chunks.iter().map(Chunk::len).sum()
    }

    pub(crate) fn into_filled(self) -> Vec<Chunk> {
        self.chunks
            .into_iter()
            .filter(|chunk| !chunk.is_empty())
            .collect()
    }
}
