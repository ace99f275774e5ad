//! # Parquet Export
//!
//! Writes a [`Batch`] to a Parquet file for offline inspection with any
//! Parquet-compatible tool. Tag columns are dictionary encoded, float columns
//! may use `BYTE_STREAM_SPLIT`, and the batch identifiers and time bounds are
//! stored as key-value metadata in the footer.
//!
//! Export is a one-shot dump of an already taken snapshot. The buffer never
//! reads these files back and keeps no state on disk; a file written here is
//! not a recovery log or a durable store for buffered rows.

use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use log::info;
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression, Encoding, ZstdLevel};
use parquet::file::properties::{EnabledStatistics, WriterProperties};
use parquet::format::KeyValue;
use parquet::schema::types::ColumnPath;
use serde::{Deserialize, Serialize};

use crate::batch::{Batch, BatchError};
use crate::value::ColumnType;

/// Compression options for exported files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompressionType {
    /// ZSTD compression at the given level
    Zstd(i32),
    /// Snappy compression
    Snappy,
    /// No compression
    Uncompressed,
}

impl Default for CompressionType {
    fn default() -> Self {
        Self::Zstd(3)
    }
}

impl CompressionType {
    /// Maximum compression (slower write, smallest files)
    pub fn max_compression() -> Self {
        Self::Zstd(22)
    }

    /// Balanced compression
    pub fn balanced() -> Self {
        Self::Zstd(3)
    }

    /// Fast compression (faster write, larger files)
    pub fn fast() -> Self {
        Self::Snappy
    }

    fn to_parquet(self) -> Compression {
        match self {
            Self::Zstd(level) => {
                Compression::ZSTD(ZstdLevel::try_new(level).unwrap_or_default())
            }
            Self::Snappy => Compression::SNAPPY,
            Self::Uncompressed => Compression::UNCOMPRESSED,
        }
    }
}

/// Configuration for Parquet export
#[derive(Debug, Clone, PartialEq)]
pub struct ExportConfig {
    /// Compression type to use
    pub compression: CompressionType,

    /// Maximum rows per row group
    pub row_group_size: usize,

    /// Data page size in bytes
    pub data_page_size: usize,

    /// Whether to write column chunk statistics
    pub write_statistics: bool,

    /// Dictionary page size limit in bytes
    pub dictionary_page_size_limit: usize,

    /// Use BYTE_STREAM_SPLIT encoding for float columns
    pub use_byte_stream_split: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            compression: CompressionType::default(),
            row_group_size: 100_000,
            // 1MB data pages
            data_page_size: 1024 * 1024,
            write_statistics: true,
            dictionary_page_size_limit: 1024 * 1024,
            use_byte_stream_split: true,
        }
    }
}

impl ExportConfig {
    /// Configuration optimized for maximum compression (slower write)
    pub fn max_compression() -> Self {
        Self {
            compression: CompressionType::max_compression(),
            row_group_size: 500_000,
            data_page_size: 2 * 1024 * 1024,
            dictionary_page_size_limit: 2 * 1024 * 1024,
            ..Self::default()
        }
    }

    /// Configuration optimized for fast writing (larger files)
    pub fn fast_write() -> Self {
        Self {
            compression: CompressionType::fast(),
            row_group_size: 50_000,
            data_page_size: 512 * 1024,
            dictionary_page_size_limit: 512 * 1024,
            ..Self::default()
        }
    }

    /// Balanced configuration (default)
    pub fn balanced() -> Self {
        Self::default()
    }

    /// Use ZSTD at `level`.
    pub fn with_zstd_level(mut self, level: i32) -> Self {
        self.compression = CompressionType::Zstd(level);
        self
    }

    /// Create writer properties for `batch`.
    pub fn to_writer_properties(&self, batch: &Batch) -> WriterProperties {
        let statistics = if self.write_statistics {
            EnabledStatistics::Chunk
        } else {
            EnabledStatistics::None
        };

        let mut builder = WriterProperties::builder()
            .set_compression(self.compression.to_parquet())
            .set_data_page_size_limit(self.data_page_size)
            .set_dictionary_page_size_limit(self.dictionary_page_size_limit)
            .set_statistics_enabled(statistics)
            .set_max_row_group_size(self.row_group_size);

        for column in batch.schema() {
            let path = ColumnPath::new(vec![column.name.clone()]);
            match column.column_type {
                // Tag values repeat heavily within a measurement.
                ColumnType::Tag => {
                    builder = builder.set_column_dictionary_enabled(path, true);
                }
                ColumnType::Float => {
                    builder = builder.set_column_dictionary_enabled(path.clone(), false);
                    if self.use_byte_stream_split {
                        builder = builder.set_column_encoding(path, Encoding::BYTE_STREAM_SPLIT);
                    }
                }
                _ => {}
            }
        }

        builder
            .set_key_value_metadata(Some(key_value_metadata(&batch.schema_metadata())))
            .build()
    }
}

fn key_value_metadata(metadata: &HashMap<String, String>) -> Vec<KeyValue> {
    let mut kv: Vec<KeyValue> = metadata
        .iter()
        .map(|(k, v)| KeyValue {
            key: k.clone(),
            value: Some(v.clone()),
        })
        .collect();
    kv.sort_by(|a, b| a.key.cmp(&b.key));
    kv
}

/// Result of a Parquet export
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportStats {
    /// Rows written
    pub rows_written: usize,
    /// Row groups written
    pub row_groups: usize,
    /// Columns written
    pub columns: usize,
}

impl fmt::Display for ExportStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Wrote {} rows x {} columns in {} row groups",
            self.rows_written, self.columns, self.row_groups
        )
    }
}

/// Write `batch` as a Parquet file to `writer`.
pub fn write_parquet<W: Write + Send>(
    batch: &Batch,
    writer: W,
    config: &ExportConfig,
) -> Result<ExportStats, BatchError> {
    let record = batch.to_record_batch()?;
    let props = config.to_writer_properties(batch);

    let mut arrow_writer = ArrowWriter::try_new(writer, record.schema(), Some(props))?;
    arrow_writer.write(&record)?;
    let metadata = arrow_writer.close()?;

    Ok(ExportStats {
        rows_written: usize::try_from(metadata.num_rows).unwrap_or_default(),
        row_groups: metadata.row_groups.len(),
        columns: record.num_columns(),
    })
}

/// Write `batch` as a Parquet file at `path`.
pub fn write_parquet_file<P: AsRef<Path>>(
    batch: &Batch,
    path: P,
    config: &ExportConfig,
) -> Result<ExportStats, BatchError> {
    let path = path.as_ref();
    let file = File::create(path)?;
    let stats = write_parquet(batch, file, config)?;
    info!("{} to {}", stats, path.display());
    Ok(stats)
}
