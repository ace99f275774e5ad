//! # tsbatch - Sparse Row to Columnar Batch Ingestion
//!
//! `tsbatch` accumulates schemaless time-series rows (string tags, typed
//! fields and a nanosecond timestamp) into rectangular, strongly typed columns
//! and snapshots them into an ordered columnar [`Batch`](batch::Batch) ready
//! for submission to a storage service.
//!
//! ## Key Features
//!
//! - **Sparse input, dense output**: rows may mention any subset of columns;
//!   absent slots become nulls so every column always has one slot per row.
//!
//! - **Type locking**: a field column takes the type of its first value and
//!   rejects values of any other type.
//!
//! - **Abort-before-commit**: a rejected row leaves the buffer untouched.
//!
//! - **Deterministic snapshots**: columns are ordered byte-wise by name, and
//!   the observed minimum and maximum timestamps travel with the batch.
//!
//! - **Arrow native**: batches convert to Arrow `RecordBatch`es, encode as
//!   length-prefixed Arrow IPC blocks and export to Parquet.
//!
//! ## Quick Start
//!
//! ```rust
//! use tsbatch::buffer::{IngestionBuffer, Row};
//! use tsbatch::batch::{decode_block, encode_block};
//!
//! let buffer = IngestionBuffer::new("db0", "rp0", "cpu");
//!
//! buffer.append(&Row::builder().tag("host", "a").field("usage", 0.5).timestamp(100).build())?;
//! buffer.append(&Row::builder().tag("host", "b").field("idle", true).timestamp(200).build())?;
//!
//! let batch = buffer.to_batch()?;
//! assert_eq!(batch.row_count(), 2);
//! assert_eq!(batch.min_time(), 100);
//!
//! let block = encode_block(&batch)?;
//! let record = decode_block(&block)?;
//! assert_eq!(record.num_columns(), 4);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! - [`value`]: field values and column types
//! - [`column`]: typed, nullable column storage
//! - [`buffer`]: the thread-safe ingestion buffer
//! - [`batch`]: immutable snapshots, Arrow conversion and block encoding
//! - [`schema`]: Arrow schema and metadata keys
//! - [`transport`]: write request shapes and the service trait
//! - [`export`]: Parquet export

// Documentation lints - enforce complete documentation for publication
#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]

pub mod batch;
pub mod buffer;
pub mod column;
pub mod export;
pub mod schema;
pub mod transport;
pub mod value;

/// Re-export commonly used types for convenience
pub mod prelude {
    pub use crate::batch::{
        decode_block, encode_block, Batch, BatchError, BatchIdentifiers, BatchSnapshotter,
        TimeRange,
    };
    pub use crate::buffer::{
        BufferConfig, BufferError, BufferStats, ColumnChunk, IngestionBuffer, Row, RowBuilder,
    };
    pub use crate::column::{Column, ColumnSchema, ColumnValueStore};
    pub use crate::export::{write_parquet, write_parquet_file, CompressionType, ExportConfig};
    pub use crate::schema::TIME_COLUMN;
    pub use crate::transport::{
        Credentials, WriteRowsRequest, WriteRowsResponse, WriteService, TransportError,
    };
    pub use crate::value::{ColumnType, FieldValue};
}
