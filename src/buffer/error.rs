use crate::column::ColumnError;
use crate::value::ColumnType;

/// Errors that can occur while appending to an ingestion buffer
#[derive(Debug, thiserror::Error)]
pub enum BufferError {
    /// A tag or field name was empty
    #[error("empty name not allowed")]
    EmptyName,

    /// A tag or field used the reserved time column name
    #[error("key can't be '{0}'")]
    ReservedName(String),

    /// A field value has no column type
    #[error("unknown field type for '{name}': {kind}")]
    UnknownFieldType {
        /// Field name
        name: String,
        /// Kind of the rejected value
        kind: &'static str,
    },

    /// The same name was used for a tag and a field in one write
    #[error("'{0}' used as both tag and field")]
    DuplicateName(String),

    /// A value's type differs from the column's locked type
    #[error("type mismatch for column '{column}': column is {expected}, value is {actual}")]
    TypeMismatch {
        /// Column name
        column: String,
        /// Locked column type
        expected: ColumnType,
        /// Type of the rejected value
        actual: ColumnType,
    },

    /// A columnar chunk holds vectors of different lengths
    #[error("column '{column}' has {len} entries, expected {expected}")]
    LengthMismatch {
        /// Column name
        column: String,
        /// Its entry count
        len: usize,
        /// Number of timestamps in the chunk
        expected: usize,
    },

    /// A JSON row could not be parsed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl BufferError {
    pub(super) fn from_column(column: &str, error: ColumnError) -> Self {
        match error {
            ColumnError::TypeMismatch { expected, actual } => BufferError::TypeMismatch {
                column: column.to_string(),
                expected,
                actual,
            },
        }
    }
}
