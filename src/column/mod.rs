//! # Columns
//!
//! A [`Column`] pairs a `(name, type)` descriptor with one
//! [`ColumnValueStore`]. The type never changes after creation; new columns
//! can be backfilled with nulls so they line up with rows that were buffered
//! before the column first appeared.

mod store;


use serde::{Deserialize, Serialize};

use crate::value::{ColumnType, FieldValue};

pub use store::{ColumnValueStore, ColumnValues};

/// Errors raised by a single column store
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ColumnError {
    /// The value's runtime type differs from the column's locked type
    #[error("type mismatch: column is {expected}, value is {actual}")]
    TypeMismatch {
        /// Locked column type
        expected: ColumnType,
        /// Type of the rejected value
        actual: ColumnType,
    },
}

/// Schema descriptor of one column
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnSchema {
    /// Column name (case-sensitive)
    pub name: String,
    /// Locked column type
    pub column_type: ColumnType,
}

impl ColumnSchema {
    /// Create a new descriptor.
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
        }
    }
}

/// One named, typed column of a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    schema: ColumnSchema,
    store: ColumnValueStore,
}

impl Column {
    /// Create an empty column.
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self::with_backfill(name, column_type, 0, 0)
    }

    /// Create a column that starts with `backfill` null slots.
    ///
    /// `capacity` is a preallocation hint for the slot vectors.
    pub fn with_backfill(
        name: impl Into<String>,
        column_type: ColumnType,
        backfill: usize,
        capacity: usize,
    ) -> Self {
        let mut store = ColumnValueStore::with_capacity(column_type, capacity.max(backfill));
        store.append_nulls(backfill);
        Self {
            schema: ColumnSchema::new(name, column_type),
            store,
        }
    }

    /// Column name.
    pub fn name(&self) -> &str {
        &self.schema.name
    }

    /// Locked column type.
    pub fn column_type(&self) -> ColumnType {
        self.schema.column_type
    }

    /// Schema descriptor.
    pub fn schema(&self) -> &ColumnSchema {
        &self.schema
    }

    /// Value store.
    pub fn store(&self) -> &ColumnValueStore {
        &self.store
    }

    /// Number of slots.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Returns true if the column has no slots.
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Append one value after checking it against the column type.
    pub fn append_value(&mut self, value: FieldValue) -> Result<(), ColumnError> {
        if !self.column_type().accepts(&value) {
            return Err(ColumnError::TypeMismatch {
                expected: self.column_type(),
                actual: value.column_type(),
            });
        }
        self.store.append_value(value)
    }

    /// Append `count` nulls.
    pub fn append_nulls(&mut self, count: usize) {
        self.store.append_nulls(count);
    }
}
