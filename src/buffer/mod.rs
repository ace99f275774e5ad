//! # Ingestion Buffer
//!
//! Accumulates schemaless rows into rectangular, strongly typed columns.
//!
//! ## Column Alignment
//!
//! Two backfill mechanisms keep every column exactly `row_count` slots long:
//!
//! 1. **Backfill on creation**: a column first seen at row `k` starts with `k`
//!    nulls before its first value.
//! 2. **Backfill on absence**: after a row is written, every column that the
//!    row did not mention receives one null.
//!
//! Both run in O(columns) per row; nothing already buffered is rewritten.
//!
//! ## Type Locking
//!
//! Tags always create `Tag` columns. A field column takes the type of its first
//! value, and later values of any other type are rejected with
//! [`BufferError::TypeMismatch`].
//!
//! ## Failure Semantics
//!
//! Appends are abort-before-commit: names and types of the whole row are
//! checked under the write lock before any store is touched, so a rejected
//! row changes neither the row count, the time bounds nor any column.

mod buffer_impl;
mod clock;
mod config;
mod error;
mod row;
mod stats;

#[cfg(test)]
mod tests;

pub use buffer_impl::{validate_name, IngestionBuffer};
pub use clock::{Clock, SystemClock};
pub use config::BufferConfig;
pub use error::BufferError;
pub use row::{ColumnChunk, Row, RowBuilder};
pub use stats::BufferStats;
