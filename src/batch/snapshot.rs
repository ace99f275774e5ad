use log::debug;

use super::{Batch, BatchError, BatchIdentifiers, TimeRange};
use crate::buffer::IngestionBuffer;
use crate::column::Column;

/// Stateless transform from a set of buffered columns to an ordered [`Batch`].
///
/// Columns are sorted by name and checked against the row count before any
/// value is copied, so a failed snapshot never yields a partial batch.
#[derive(Debug, Clone, Copy, Default)]
pub struct BatchSnapshotter;

impl BatchSnapshotter {
    /// Snapshot a buffer under its shared lock.
    pub fn to_batch(buffer: &IngestionBuffer) -> Result<Batch, BatchError> {
        buffer.to_batch()
    }

    /// Build a batch from borrowed columns.
    ///
    /// Fails with [`BatchError::EmptyBatch`] when there are no columns (or no
    /// rows), and with [`BatchError::RecordInconsistency`] when a column's
    /// length differs from `row_count`.
    pub fn snapshot<'a, I>(
        identifiers: &BatchIdentifiers,
        columns: I,
        row_count: usize,
        time_range: Option<TimeRange>,
    ) -> Result<Batch, BatchError>
    where
        I: IntoIterator<Item = &'a Column>,
    {
        let mut columns: Vec<&Column> = columns.into_iter().collect();
        if columns.is_empty() {
            return Err(BatchError::EmptyBatch);
        }

        // str ordering is byte-wise; names are unique so stability never matters.
        columns.sort_by(|a, b| a.name().cmp(b.name()));

        for column in &columns {
            if column.len() != row_count {
                return Err(BatchError::RecordInconsistency {
                    column: column.name().to_string(),
                    len: column.len(),
                    row_count,
                });
            }
        }

        let time_range = time_range.ok_or(BatchError::EmptyBatch)?;

        let (schema, values) = columns
            .into_iter()
            .map(|column| (column.schema().clone(), column.store().clone()))
            .unzip();

        let batch = Batch {
            identifiers: identifiers.clone(),
            row_count,
            time_range,
            schema,
            values,
        };
        debug!("Snapshot {}", batch);
        Ok(batch)
    }
}
