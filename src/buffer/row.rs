use std::collections::HashMap;

use serde::Deserialize;

use super::error::BufferError;
use crate::value::FieldValue;

/// One schemaless row: tags, fields and a nanosecond timestamp (`0` = now).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    /// Tag name -> value
    pub tags: HashMap<String, String>,
    /// Field name -> value
    pub fields: HashMap<String, FieldValue>,
    /// Nanoseconds since the Unix epoch, or `0` for the buffer's clock
    pub timestamp: i64,
}

/// Wire shape of a JSON row before field values are typed.
#[derive(Debug, Deserialize)]
struct RawRow {
    #[serde(default)]
    tags: HashMap<String, String>,
    #[serde(default)]
    fields: HashMap<String, serde_json::Value>,
    #[serde(default)]
    timestamp: i64,
}

impl Row {
    /// Create an empty row at `timestamp`.
    pub fn new(timestamp: i64) -> Self {
        Self {
            timestamp,
            ..Self::default()
        }
    }

    /// Start building a row.
    pub fn builder() -> RowBuilder {
        RowBuilder::default()
    }

    /// Parse one JSON object of the form
    /// `{"tags": {..}, "fields": {..}, "timestamp": ..}`.
    ///
    /// Field values must be strings, booleans or numbers; anything else fails
    /// with [`BufferError::UnknownFieldType`].
    ///
    /// Numbers are typed by their literal form: `1` is an `Int` and `1.0` a
    /// `Float`. A writer that prints whole floats without a fraction will hit
    /// [`BufferError::TypeMismatch`] once the column is locked to `Float`.
    pub fn from_json(line: &str) -> Result<Self, BufferError> {
        let raw: RawRow = serde_json::from_str(line)?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawRow) -> Result<Self, BufferError> {
        let mut fields = HashMap::with_capacity(raw.fields.len());
        for (name, value) in raw.fields {
            match FieldValue::try_from(value) {
                Ok(value) => {
                    fields.insert(name, value);
                }
                Err(unsupported) => {
                    return Err(BufferError::UnknownFieldType {
                        name,
                        kind: unsupported.kind,
                    })
                }
            }
        }
        Ok(Self {
            tags: raw.tags,
            fields,
            timestamp: raw.timestamp,
        })
    }
}

/// Builder for creating rows
#[derive(Debug, Clone, Default)]
pub struct RowBuilder {
    row: Row,
}

impl RowBuilder {
    /// Add a tag.
    pub fn tag(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.row.tags.insert(name.into(), value.into());
        self
    }

    /// Add a field.
    pub fn field(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.row.fields.insert(name.into(), value.into());
        self
    }

    /// Set the timestamp in nanoseconds (`0` = now).
    pub fn timestamp(mut self, timestamp: i64) -> Self {
        self.row.timestamp = timestamp;
        self
    }

    /// Build the row.
    pub fn build(self) -> Row {
        self.row
    }
}

/// Several rows given column-wise.
///
/// Every tag and field vector must have one entry per timestamp; `None`
/// entries become nulls.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnChunk {
    /// Tag name -> one optional value per row
    pub tags: HashMap<String, Vec<Option<String>>>,
    /// Field name -> one optional value per row
    pub fields: HashMap<String, Vec<Option<FieldValue>>>,
    /// One timestamp per row (`0` = now)
    pub timestamps: Vec<i64>,
}

impl ColumnChunk {
    /// Create a chunk with the given timestamps and no columns.
    pub fn new(timestamps: Vec<i64>) -> Self {
        Self {
            timestamps,
            ..Self::default()
        }
    }

    /// Add a tag column.
    pub fn with_tag(mut self, name: impl Into<String>, values: Vec<Option<String>>) -> Self {
        self.tags.insert(name.into(), values);
        self
    }

    /// Add a field column.
    pub fn with_field(mut self, name: impl Into<String>, values: Vec<Option<FieldValue>>) -> Self {
        self.fields.insert(name.into(), values);
        self
    }

    /// Number of rows in the chunk.
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    /// Returns true if the chunk has no rows.
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }
}
