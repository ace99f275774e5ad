/// Configuration for an ingestion buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferConfig {
    /// Soft row limit reported by `is_full` (None = unbounded).
    /// Appends are never rejected; callers flush when the buffer reports full.
    pub max_rows: Option<usize>,

    /// Initial slot capacity for newly created columns
    pub capacity_hint: usize,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            // 100k rows per batch
            max_rows: Some(100_000),
            capacity_hint: 1024,
        }
    }
}

impl BufferConfig {
    /// No row limit and no preallocation.
    pub fn unbounded() -> Self {
        Self {
            max_rows: None,
            capacity_hint: 0,
        }
    }

    /// Set the soft row limit.
    pub fn with_max_rows(mut self, max_rows: usize) -> Self {
        self.max_rows = Some(max_rows);
        self
    }

    /// Set the per-column preallocation hint.
    pub fn with_capacity_hint(mut self, capacity_hint: usize) -> Self {
        self.capacity_hint = capacity_hint;
        self
    }
}
