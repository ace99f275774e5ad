//! # Columnar Batches
//!
//! A [`Batch`] is the immutable snapshot of an ingestion buffer: an ordered
//! schema, a parallel list of value stores, the batch identifiers and the
//! observed time bounds. It is everything a transport needs to build a write
//! request.
//!
//! ## Ordering
//!
//! Columns are sorted byte-wise by name, so two buffers holding the same
//! column set produce the same schema order no matter which rows introduced
//! which columns first.
//!
//! ## Block Encoding
//!
//! [`encode_block`] turns a batch into a length-prefixed Arrow IPC stream,
//! the binary payload submitted alongside the request metadata.

mod block;
mod record_batch;
mod snapshot;


use std::fmt;

use serde::{Deserialize, Serialize};

use crate::column::{ColumnSchema, ColumnValueStore};

pub use block::{decode_block, decode_blocks, encode_block, BLOCK_HEADER_LEN};
pub use snapshot::BatchSnapshotter;

/// Errors that can occur while producing or encoding a batch
#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    /// Snapshot requested from a buffer without columns
    #[error("no columns to convert")]
    EmptyBatch,

    /// A column's length differs from the batch row count
    #[error("record inconsistency: column '{column}' has {len} slots, batch has {row_count} rows")]
    RecordInconsistency {
        /// Offending column
        column: String,
        /// Its slot count
        len: usize,
        /// Batch row count
        row_count: usize,
    },

    /// Error from the Arrow library
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// Error from the Parquet library
    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed block payload
    #[error("invalid block: {0}")]
    InvalidBlock(String),
}

/// Target of a batch on the storage service
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct BatchIdentifiers {
    /// Target database
    pub database: String,
    /// Target retention policy
    pub retention_policy: String,
    /// Target measurement
    pub measurement: String,
}

impl BatchIdentifiers {
    /// Create identifiers for a database / retention policy / measurement triple.
    pub fn new(
        database: impl Into<String>,
        retention_policy: impl Into<String>,
        measurement: impl Into<String>,
    ) -> Self {
        Self {
            database: database.into(),
            retention_policy: retention_policy.into(),
            measurement: measurement.into(),
        }
    }
}

impl fmt::Display for BatchIdentifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.database, self.retention_policy, self.measurement)
    }
}

/// Inclusive nanosecond time bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeRange {
    /// Smallest timestamp
    pub min: i64,
    /// Largest timestamp
    pub max: i64,
}

impl TimeRange {
    /// Range covering a single instant.
    pub fn at(timestamp: i64) -> Self {
        Self {
            min: timestamp,
            max: timestamp,
        }
    }

    /// Widen the range to include `timestamp`.
    pub fn observe(&mut self, timestamp: i64) {
        self.min = self.min.min(timestamp);
        self.max = self.max.max(timestamp);
    }
}

/// Ordered, validated columnar snapshot of a buffer
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    identifiers: BatchIdentifiers,
    row_count: usize,
    time_range: TimeRange,
    schema: Vec<ColumnSchema>,
    values: Vec<ColumnValueStore>,
}

impl Batch {
    /// Batch identifiers.
    pub fn identifiers(&self) -> &BatchIdentifiers {
        &self.identifiers
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Number of columns, including the time column.
    pub fn num_columns(&self) -> usize {
        self.schema.len()
    }

    /// Observed time bounds.
    pub fn time_range(&self) -> TimeRange {
        self.time_range
    }

    /// Smallest timestamp in the batch.
    pub fn min_time(&self) -> i64 {
        self.time_range.min
    }

    /// Largest timestamp in the batch.
    pub fn max_time(&self) -> i64 {
        self.time_range.max
    }

    /// Ordered column descriptors.
    pub fn schema(&self) -> &[ColumnSchema] {
        &self.schema
    }

    /// Value stores, index-aligned with [`Batch::schema`].
    pub fn values(&self) -> &[ColumnValueStore] {
        &self.values
    }

    /// Look up a column's values by name.
    pub fn column(&self, name: &str) -> Option<&ColumnValueStore> {
        self.schema
            .binary_search_by(|c| c.name.as_str().cmp(name))
            .ok()
            .map(|idx| &self.values[idx])
    }

    /// Iterate over `(descriptor, values)` pairs in schema order.
    pub fn columns(&self) -> impl Iterator<Item = (&ColumnSchema, &ColumnValueStore)> {
        self.schema.iter().zip(self.values.iter())
    }
}

impl fmt::Display for Batch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} rows x {} columns, time [{}, {}]",
            self.identifiers,
            self.row_count,
            self.schema.len(),
            self.time_range.min,
            self.time_range.max
        )
    }
}
