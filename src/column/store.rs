use std::sync::Arc;

use arrow::array::{ArrayRef, BooleanArray, Float64Array, Int64Array, StringArray, UInt64Array};
use arrow::buffer::{NullBuffer, ScalarBuffer};

use super::ColumnError;
use crate::value::{ColumnType, FieldValue};

/// Typed value slots of one column.
///
/// Null slots hold a placeholder (zero, `false` or the empty string) so the
/// vector stays index-aligned with the validity bitmap.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValues {
    /// Int64 values
    Int(Vec<i64>),
    /// UInt64 values
    UInt(Vec<u64>),
    /// Float64 values
    Float(Vec<f64>),
    /// Boolean values
    Boolean(Vec<bool>),
    /// String values (string fields and tags)
    String(Vec<String>),
}

impl ColumnValues {
    fn with_capacity(column_type: ColumnType, capacity: usize) -> Self {
        match column_type {
            ColumnType::Int => ColumnValues::Int(Vec::with_capacity(capacity)),
            ColumnType::UInt => ColumnValues::UInt(Vec::with_capacity(capacity)),
            ColumnType::Float => ColumnValues::Float(Vec::with_capacity(capacity)),
            ColumnType::Boolean => ColumnValues::Boolean(Vec::with_capacity(capacity)),
            ColumnType::String | ColumnType::Tag => {
                ColumnValues::String(Vec::with_capacity(capacity))
            }
        }
    }

    fn len(&self) -> usize {
        match self {
            ColumnValues::Int(v) => v.len(),
            ColumnValues::UInt(v) => v.len(),
            ColumnValues::Float(v) => v.len(),
            ColumnValues::Boolean(v) => v.len(),
            ColumnValues::String(v) => v.len(),
        }
    }

    fn push_placeholders(&mut self, count: usize) {
        match self {
            ColumnValues::Int(v) => v.resize(v.len() + count, 0),
            ColumnValues::UInt(v) => v.resize(v.len() + count, 0),
            ColumnValues::Float(v) => v.resize(v.len() + count, 0.0),
            ColumnValues::Boolean(v) => v.resize(v.len() + count, false),
            ColumnValues::String(v) => v.resize(v.len() + count, String::new()),
        }
    }
}

/// Append-only value container with a validity bitmap.
///
/// The store's type is fixed at construction. Values of any other type are
/// rejected without touching existing slots.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnValueStore {
    column_type: ColumnType,
    values: ColumnValues,
    validity: Vec<bool>,
}

impl ColumnValueStore {
    /// Create an empty store for the given column type.
    pub fn new(column_type: ColumnType) -> Self {
        Self::with_capacity(column_type, 0)
    }

    /// Create an empty store with room for `capacity` slots.
    pub fn with_capacity(column_type: ColumnType, capacity: usize) -> Self {
        Self {
            column_type,
            values: ColumnValues::with_capacity(column_type, capacity),
            validity: Vec::with_capacity(capacity),
        }
    }

    /// The locked column type.
    pub fn column_type(&self) -> ColumnType {
        self.column_type
    }

    /// Number of slots, null or not.
    #[inline]
    pub fn len(&self) -> usize {
        self.validity.len()
    }

    /// Returns true if the store has no slots.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.validity.is_empty()
    }

    /// Append one real value.
    pub fn append_value(&mut self, value: FieldValue) -> Result<(), ColumnError> {
        match (&mut self.values, value) {
            (ColumnValues::Int(v), FieldValue::Int(x)) => v.push(x),
            (ColumnValues::UInt(v), FieldValue::UInt(x)) => v.push(x),
            (ColumnValues::Float(v), FieldValue::Float(x)) => v.push(x),
            (ColumnValues::Boolean(v), FieldValue::Boolean(x)) => v.push(x),
            (ColumnValues::String(v), FieldValue::String(x)) => v.push(x),
            (_, other) => {
                return Err(ColumnError::TypeMismatch {
                    expected: self.column_type,
                    actual: other.column_type(),
                })
            }
        }
        self.validity.push(true);
        Ok(())
    }

    /// Append `count` null slots.
    pub fn append_nulls(&mut self, count: usize) {
        if count == 0 {
            return;
        }
        self.values.push_placeholders(count);
        self.validity.resize(self.validity.len() + count, false);
    }

    /// Returns true if the slot at `index` is null or out of range.
    pub fn is_null(&self, index: usize) -> bool {
        !self.validity.get(index).copied().unwrap_or(false)
    }

    /// Number of null slots.
    pub fn null_count(&self) -> usize {
        self.validity.iter().filter(|valid| !**valid).count()
    }

    /// Validity bitmap (true = value present).
    pub fn validity(&self) -> &[bool] {
        &self.validity
    }

    /// Raw value slots, including placeholders under null slots.
    pub fn values(&self) -> &ColumnValues {
        &self.values
    }

    /// Value at `index`, or `None` for a null or out-of-range slot.
    pub fn get(&self, index: usize) -> Option<FieldValue> {
        if self.is_null(index) {
            return None;
        }
        let value = match &self.values {
            ColumnValues::Int(v) => FieldValue::Int(v[index]),
            ColumnValues::UInt(v) => FieldValue::UInt(v[index]),
            ColumnValues::Float(v) => FieldValue::Float(v[index]),
            ColumnValues::Boolean(v) => FieldValue::Boolean(v[index]),
            ColumnValues::String(v) => FieldValue::String(v[index].clone()),
        };
        Some(value)
    }

    /// Iterate over all slots in order.
    pub fn iter(&self) -> impl Iterator<Item = Option<FieldValue>> + '_ {
        (0..self.len()).map(move |i| self.get(i))
    }

    /// Materialize the store as an Arrow array.
    pub fn to_array(&self) -> ArrayRef {
        debug_assert_eq!(self.values.len(), self.validity.len());
        let nulls = create_null_buffer(&self.validity);
        match &self.values {
            ColumnValues::Int(v) => Arc::new(Int64Array::new(ScalarBuffer::from(v.clone()), nulls)),
            ColumnValues::UInt(v) => {
                Arc::new(UInt64Array::new(ScalarBuffer::from(v.clone()), nulls))
            }
            ColumnValues::Float(v) => {
                Arc::new(Float64Array::new(ScalarBuffer::from(v.clone()), nulls))
            }
            ColumnValues::Boolean(v) => {
                let slots: Vec<Option<bool>> = v
                    .iter()
                    .zip(&self.validity)
                    .map(|(value, valid)| valid.then_some(*value))
                    .collect();
                Arc::new(BooleanArray::from(slots))
            }
            ColumnValues::String(v) => {
                let slots: Vec<Option<&str>> = v
                    .iter()
                    .zip(&self.validity)
                    .map(|(value, valid)| valid.then_some(value.as_str()))
                    .collect();
                Arc::new(StringArray::from(slots))
            }
        }
    }
}

/// Create a validity bitmap, or `None` when no slot is null.
fn create_null_buffer(validity: &[bool]) -> Option<NullBuffer> {
    if validity.iter().all(|&v| v) {
        return None;
    }
    Some(NullBuffer::from(validity.to_vec()))
}
