use std::fmt;

use serde::Serialize;

use crate::batch::TimeRange;

/// Point-in-time statistics of an ingestion buffer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BufferStats {
    /// Number of buffered rows
    pub rows: usize,
    /// Number of columns, including the time column
    pub columns: usize,
    /// Number of tag columns
    pub tag_columns: usize,
    /// Total null slots across all columns
    pub null_slots: usize,
    /// Observed time bounds, if any row was buffered
    pub time_range: Option<TimeRange>,
}

impl BufferStats {
    /// Fraction of slots holding a real value (1.0 for an empty buffer).
    pub fn density(&self) -> f64 {
        let slots = self.rows * self.columns;
        if slots == 0 {
            return 1.0;
        }
        (slots - self.null_slots) as f64 / slots as f64
    }
}

impl fmt::Display for BufferStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Buffered {} rows in {} columns ({} tags), {:.1}% dense",
            self.rows,
            self.columns,
            self.tag_columns,
            self.density() * 100.0
        )?;
        if let Some(range) = self.time_range {
            write!(f, ", time [{}, {}]", range.min, range.max)?;
        }
        Ok(())
    }
}
