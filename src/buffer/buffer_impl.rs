use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use log::{debug, trace};
use parking_lot::RwLock;

use super::clock::{Clock, SystemClock};
use super::config::BufferConfig;
use super::error::BufferError;
use super::row::{ColumnChunk, Row};
use super::stats::BufferStats;
use crate::batch::{Batch, BatchError, BatchIdentifiers, BatchSnapshotter, TimeRange};
use crate::column::Column;
use crate::schema::TIME_COLUMN;
use crate::value::{ColumnType, FieldValue};

/// Check a caller-supplied tag or field name.
pub fn validate_name(name: &str) -> Result<(), BufferError> {
    if name.is_empty() {
        return Err(BufferError::EmptyName);
    }
    if name == TIME_COLUMN {
        return Err(BufferError::ReservedName(name.to_string()));
    }
    Ok(())
}

/// Mutable state guarded by the buffer lock.
#[derive(Debug, Default)]
struct BufferState {
    columns: HashMap<String, Column>,
    row_count: usize,
    time_range: Option<TimeRange>,
}

impl BufferState {
    /// Fail if `name` already exists with a type other than `actual`.
    fn check_type(&self, name: &str, actual: ColumnType) -> Result<(), BufferError> {
        match self.columns.get(name) {
            Some(column) if column.column_type() != actual => Err(BufferError::TypeMismatch {
                column: name.to_string(),
                expected: column.column_type(),
                actual,
            }),
            _ => Ok(()),
        }
    }

    /// Validate a whole row before any column is touched.
    fn check_row(
        &self,
        tags: &HashMap<String, String>,
        fields: &HashMap<String, FieldValue>,
    ) -> Result<(), BufferError> {
        for name in tags.keys() {
            validate_name(name)?;
            self.check_type(name, ColumnType::Tag)?;
        }
        for (name, value) in fields {
            validate_name(name)?;
            if tags.contains_key(name) {
                return Err(BufferError::DuplicateName(name.clone()));
            }
            self.check_type(name, value.column_type())?;
        }
        Ok(())
    }

    /// Validate a columnar chunk and resolve the type of every field column
    /// that will be written. All-null fields with no existing column map to `None`.
    fn check_chunk<'a>(
        &self,
        chunk: &'a ColumnChunk,
    ) -> Result<HashMap<&'a str, Option<ColumnType>>, BufferError> {
        let rows = chunk.timestamps.len();

        for (name, values) in &chunk.tags {
            validate_name(name)?;
            check_len(name, values.len(), rows)?;
            self.check_type(name, ColumnType::Tag)?;
        }

        let mut field_types = HashMap::with_capacity(chunk.fields.len());
        for (name, values) in &chunk.fields {
            validate_name(name)?;
            check_len(name, values.len(), rows)?;
            if chunk.tags.contains_key(name) {
                return Err(BufferError::DuplicateName(name.clone()));
            }

            let locked = self.columns.get(name.as_str()).map(Column::column_type);
            if locked == Some(ColumnType::Tag) {
                // Tags are only written through the tag path, even as nulls.
                let actual = values
                    .iter()
                    .flatten()
                    .next()
                    .map_or(ColumnType::String, FieldValue::column_type);
                return Err(BufferError::TypeMismatch {
                    column: name.clone(),
                    expected: ColumnType::Tag,
                    actual,
                });
            }
            let mut resolved = locked;
            for value in values.iter().flatten() {
                let actual = value.column_type();
                match resolved {
                    None => resolved = Some(actual),
                    Some(expected) if expected != actual => {
                        return Err(BufferError::TypeMismatch {
                            column: name.clone(),
                            expected,
                            actual,
                        })
                    }
                    Some(_) => {}
                }
            }
            field_types.insert(name.as_str(), resolved);
        }
        Ok(field_types)
    }

    /// Append one slot to `name`, creating and backfilling the column on first sight.
    fn append_slot(
        &mut self,
        name: &str,
        column_type: ColumnType,
        value: Option<FieldValue>,
        capacity: usize,
    ) -> Result<(), BufferError> {
        if !self.columns.contains_key(name) {
            debug!(
                "Creating column '{}' ({}) with {} backfilled nulls",
                name, column_type, self.row_count
            );
            let column = Column::with_backfill(name, column_type, self.row_count, capacity);
            self.columns.insert(name.to_string(), column);
        }
        if let Some(column) = self.columns.get_mut(name) {
            match value {
                Some(value) => column
                    .append_value(value)
                    .map_err(|e| BufferError::from_column(name, e))?,
                None => column.append_nulls(1),
            }
        }
        Ok(())
    }

    fn observe(&mut self, timestamp: i64) {
        match self.time_range.as_mut() {
            Some(range) => range.observe(timestamp),
            None => self.time_range = Some(TimeRange::at(timestamp)),
        }
    }
}

fn check_len(name: &str, len: usize, expected: usize) -> Result<(), BufferError> {
    if len != expected {
        return Err(BufferError::LengthMismatch {
            column: name.to_string(),
            len,
            expected,
        });
    }
    Ok(())
}

/// In-memory row-to-column accumulator for one write batch.
///
/// Appends take the exclusive lock for their whole duration and validate the
/// entire row before mutating anything, so a failed append leaves the buffer
/// exactly as it was. Snapshots take the shared lock.
///
/// # Example
///
/// ```
/// use std::collections::HashMap;
/// use tsbatch::buffer::IngestionBuffer;
/// use tsbatch::value::FieldValue;
///
/// let buffer = IngestionBuffer::new("db0", "rp0", "cpu");
/// let tags = HashMap::from([("host".to_string(), "a".to_string())]);
/// let fields = HashMap::from([("usage".to_string(), FieldValue::Float(0.5))]);
/// buffer.append_row(&tags, &fields, 1_000)?;
///
/// let batch = buffer.to_batch()?;
/// assert_eq!(batch.row_count(), 1);
/// assert_eq!(batch.num_columns(), 3);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct IngestionBuffer {
    identifiers: BatchIdentifiers,
    config: BufferConfig,
    clock: Arc<dyn Clock>,
    state: RwLock<BufferState>,
}

impl IngestionBuffer {
    /// Create a buffer with the default configuration and the system clock.
    pub fn new(
        database: impl Into<String>,
        retention_policy: impl Into<String>,
        measurement: impl Into<String>,
    ) -> Self {
        Self::with_config(
            BatchIdentifiers::new(database, retention_policy, measurement),
            BufferConfig::default(),
        )
    }

    /// Create a buffer with an explicit configuration.
    pub fn with_config(identifiers: BatchIdentifiers, config: BufferConfig) -> Self {
        Self {
            identifiers,
            config,
            clock: Arc::new(SystemClock),
            state: RwLock::new(BufferState::default()),
        }
    }

    /// Replace the clock used for rows with timestamp `0`.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Batch identifiers.
    pub fn identifiers(&self) -> &BatchIdentifiers {
        &self.identifiers
    }

    /// Target database.
    pub fn database(&self) -> &str {
        &self.identifiers.database
    }

    /// Target retention policy.
    pub fn retention_policy(&self) -> &str {
        &self.identifiers.retention_policy
    }

    /// Target measurement.
    pub fn measurement(&self) -> &str {
        &self.identifiers.measurement
    }

    /// Buffer configuration.
    pub fn config(&self) -> &BufferConfig {
        &self.config
    }

    fn resolve_timestamp(&self, timestamp: i64) -> i64 {
        if timestamp == 0 {
            self.clock.now_nanos()
        } else {
            timestamp
        }
    }

    /// Append one row.
    ///
    /// Tags become `Tag` columns, fields take the type of their first value, and
    /// the (resolved) timestamp goes to the reserved time column. Columns missing
    /// from this row receive one null each.
    pub fn append_row(
        &self,
        tags: &HashMap<String, String>,
        fields: &HashMap<String, FieldValue>,
        timestamp: i64,
    ) -> Result<(), BufferError> {
        let mut state = self.state.write();
        state.check_row(tags, fields)?;

        let timestamp = self.resolve_timestamp(timestamp);
        let capacity = self.config.capacity_hint;
        let mut touched: HashSet<&str> = HashSet::with_capacity(tags.len() + fields.len() + 1);

        for (name, value) in tags {
            state.append_slot(
                name,
                ColumnType::Tag,
                Some(FieldValue::String(value.clone())),
                capacity,
            )?;
            touched.insert(name);
        }
        for (name, value) in fields {
            state.append_slot(name, value.column_type(), Some(value.clone()), capacity)?;
            touched.insert(name);
        }
        state.append_slot(
            TIME_COLUMN,
            ColumnType::Int,
            Some(FieldValue::Int(timestamp)),
            capacity,
        )?;
        touched.insert(TIME_COLUMN);

        state.row_count += 1;
        state.observe(timestamp);

        for (name, column) in state.columns.iter_mut() {
            if !touched.contains(name.as_str()) {
                column.append_nulls(1);
            }
        }

        trace!(
            "Appended row {} ({} tags, {} fields) at {}",
            state.row_count,
            tags.len(),
            fields.len(),
            timestamp
        );
        Ok(())
    }

    /// Append a [`Row`].
    pub fn append(&self, row: &Row) -> Result<(), BufferError> {
        self.append_row(&row.tags, &row.fields, row.timestamp)
    }

    /// Parse and append one JSON row (see [`Row::from_json`]).
    pub fn append_json(&self, line: &str) -> Result<(), BufferError> {
        let row = Row::from_json(line)?;
        self.append(&row)
    }

    /// Append several rows given column-wise; returns the number of rows added.
    ///
    /// The chunk is validated as a whole first: on error nothing is appended.
    /// A new field column whose entries are all `None` has no type and is
    /// skipped.
    pub fn append_columns(&self, chunk: &ColumnChunk) -> Result<usize, BufferError> {
        let rows = chunk.len();
        if rows == 0 {
            return Ok(0);
        }

        let mut state = self.state.write();
        let field_types = state.check_chunk(chunk)?;

        let capacity = self.config.capacity_hint.max(rows);
        let mut touched: HashSet<&str> =
            HashSet::with_capacity(chunk.tags.len() + chunk.fields.len() + 1);

        for (name, values) in &chunk.tags {
            for value in values {
                let value = value.clone().map(FieldValue::String);
                state.append_slot(name, ColumnType::Tag, value, capacity)?;
            }
            touched.insert(name);
        }
        for (name, values) in &chunk.fields {
            let Some(Some(column_type)) = field_types.get(name.as_str()).copied() else {
                continue;
            };
            for value in values {
                state.append_slot(name, column_type, value.clone(), capacity)?;
            }
            touched.insert(name);
        }

        let timestamps: Vec<i64> = chunk
            .timestamps
            .iter()
            .map(|&ts| self.resolve_timestamp(ts))
            .collect();
        for &timestamp in &timestamps {
            state.append_slot(
                TIME_COLUMN,
                ColumnType::Int,
                Some(FieldValue::Int(timestamp)),
                capacity,
            )?;
        }
        touched.insert(TIME_COLUMN);

        state.row_count += rows;
        for &timestamp in &timestamps {
            state.observe(timestamp);
        }

        for (name, column) in state.columns.iter_mut() {
            if !touched.contains(name.as_str()) {
                column.append_nulls(rows);
            }
        }

        debug!("Appended {} rows column-wise, {} buffered", rows, state.row_count);
        Ok(rows)
    }

    /// Produce an ordered, validated snapshot without modifying the buffer.
    pub fn to_batch(&self) -> Result<Batch, BatchError> {
        let state = self.state.read();
        BatchSnapshotter::snapshot(
            &self.identifiers,
            state.columns.values(),
            state.row_count,
            state.time_range,
        )
    }

    /// Snapshot and reset in one exclusive section.
    ///
    /// On error the buffer is left untouched.
    pub fn flush(&self) -> Result<Batch, BatchError> {
        let mut state = self.state.write();
        let batch = BatchSnapshotter::snapshot(
            &self.identifiers,
            state.columns.values(),
            state.row_count,
            state.time_range,
        )?;
        *state = BufferState::default();
        Ok(batch)
    }

    /// Drop all columns, rows and time bounds.
    pub fn reset(&self) {
        *self.state.write() = BufferState::default();
    }

    /// Number of buffered rows.
    pub fn row_count(&self) -> usize {
        self.state.read().row_count
    }

    /// Returns true if no row has been buffered.
    pub fn is_empty(&self) -> bool {
        self.row_count() == 0
    }

    /// Whether the soft row limit has been reached.
    pub fn is_full(&self) -> bool {
        match self.config.max_rows {
            Some(max_rows) => self.row_count() >= max_rows,
            None => false,
        }
    }

    /// Number of columns, including the time column once a row exists.
    pub fn column_count(&self) -> usize {
        self.state.read().columns.len()
    }

    /// Column names in byte-wise order.
    pub fn column_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.state.read().columns.keys().cloned().collect();
        names.sort();
        names
    }

    /// Locked type of a column, if it exists.
    pub fn column_type(&self, name: &str) -> Option<ColumnType> {
        self.state.read().columns.get(name).map(Column::column_type)
    }

    /// Observed time bounds, or `None` before the first row.
    pub fn time_range(&self) -> Option<TimeRange> {
        self.state.read().time_range
    }

    /// Smallest buffered timestamp.
    pub fn min_time(&self) -> Option<i64> {
        self.time_range().map(|range| range.min)
    }

    /// Largest buffered timestamp.
    pub fn max_time(&self) -> Option<i64> {
        self.time_range().map(|range| range.max)
    }

    /// Current statistics.
    pub fn stats(&self) -> BufferStats {
        let state = self.state.read();
        BufferStats {
            rows: state.row_count,
            columns: state.columns.len(),
            tag_columns: state
                .columns
                .values()
                .filter(|c| c.column_type().is_tag())
                .count(),
            null_slots: state.columns.values().map(|c| c.store().null_count()).sum(),
            time_range: state.time_range,
        }
    }
}
