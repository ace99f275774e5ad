//! # Batch Schema Definition
//!
//! Arrow schema conventions for materialized batches.
//!
//! Every buffered column becomes one Arrow field. The field carries a
//! `tsbatch:column_kind` metadata entry so a decoder can tell tags from string
//! fields, since both are stored as Utf8:
//!
//! | Kind | Meaning |
//! |------|---------|
//! | `time` | the reserved timestamp column (Int64, never null) |
//! | `tag` | categorical string identifier |
//! | `field` | measured value of any scalar type |
//!
//! Batch identifiers and time bounds travel in the schema-level metadata.

use std::collections::HashMap;

use arrow::datatypes::{DataType, Field, Schema, SchemaBuilder};

use crate::column::ColumnSchema;
use crate::value::ColumnType;

/// Name of the implicit timestamp column. Callers may not use it for tags or fields.
pub const TIME_COLUMN: &str = "time";

/// Block format version - follows semantic versioning
pub const BLOCK_FORMAT_VERSION: &str = "1.0.0";

/// Field metadata key holding the column kind (`time`, `tag` or `field`)
pub const KEY_COLUMN_KIND: &str = "tsbatch:column_kind";

/// Field metadata key holding the buffer column type (`int`, `uint`, ...)
pub const KEY_COLUMN_TYPE: &str = "tsbatch:column_type";

/// Schema metadata key for the block format version
pub const KEY_FORMAT_VERSION: &str = "tsbatch:format_version";

/// Schema metadata key for the target database
pub const KEY_DATABASE: &str = "tsbatch:database";

/// Schema metadata key for the target retention policy
pub const KEY_RETENTION_POLICY: &str = "tsbatch:retention_policy";

/// Schema metadata key for the target measurement
pub const KEY_MEASUREMENT: &str = "tsbatch:measurement";

/// Schema metadata key for the smallest timestamp in the batch
pub const KEY_MIN_TIME: &str = "tsbatch:min_time";

/// Schema metadata key for the largest timestamp in the batch
pub const KEY_MAX_TIME: &str = "tsbatch:max_time";

/// Column kind values stored under [`KEY_COLUMN_KIND`]
pub mod column_kinds {
    /// The reserved timestamp column
    pub const TIME: &str = "time";
    /// Tag column
    pub const TAG: &str = "tag";
    /// Field column
    pub const FIELD: &str = "field";
}

/// Kind label for a column.
pub fn column_kind(name: &str, column_type: ColumnType) -> &'static str {
    if name == TIME_COLUMN {
        column_kinds::TIME
    } else if column_type.is_tag() {
        column_kinds::TAG
    } else {
        column_kinds::FIELD
    }
}

/// Creates the Arrow field for one buffered column.
///
/// The time column is the only non-nullable one; it receives a value on every row.
pub fn column_field(column: &ColumnSchema) -> Field {
    let mut metadata = HashMap::new();
    metadata.insert(
        KEY_COLUMN_KIND.to_string(),
        column_kind(&column.name, column.column_type).to_string(),
    );
    metadata.insert(
        KEY_COLUMN_TYPE.to_string(),
        column.column_type.as_str().to_string(),
    );
    let nullable = column.name != TIME_COLUMN;
    Field::new(&column.name, column.column_type.data_type(), nullable).with_metadata(metadata)
}

/// Recovers the buffer column type from an Arrow field produced by [`column_field`].
///
/// Falls back to the data type when the metadata is missing, treating Utf8 as a
/// string field.
pub fn column_type_of(field: &Field) -> Option<ColumnType> {
    if let Some(kind) = field.metadata().get(KEY_COLUMN_TYPE) {
        return match kind.as_str() {
            "int" => Some(ColumnType::Int),
            "uint" => Some(ColumnType::UInt),
            "float" => Some(ColumnType::Float),
            "string" => Some(ColumnType::String),
            "boolean" => Some(ColumnType::Boolean),
            "tag" => Some(ColumnType::Tag),
            _ => None,
        };
    }
    match field.data_type() {
        DataType::Int64 => Some(ColumnType::Int),
        DataType::UInt64 => Some(ColumnType::UInt),
        DataType::Float64 => Some(ColumnType::Float),
        DataType::Utf8 => Some(ColumnType::String),
        DataType::Boolean => Some(ColumnType::Boolean),
        _ => None,
    }
}

/// Creates the Arrow schema for an ordered set of columns plus schema-level metadata.
pub fn create_batch_schema(columns: &[ColumnSchema], metadata: HashMap<String, String>) -> Schema {
    let mut builder = SchemaBuilder::with_capacity(columns.len());
    for column in columns {
        builder.push(column_field(column));
    }
    builder.finish().with_metadata(metadata)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_field_not_nullable() {
        let field = column_field(&ColumnSchema::new(TIME_COLUMN, ColumnType::Int));
        assert!(!field.is_nullable());
        assert_eq!(field.data_type(), &DataType::Int64);
        assert_eq!(
            field.metadata().get(KEY_COLUMN_KIND).map(String::as_str),
            Some(column_kinds::TIME)
        );
    }

    #[test]
    fn test_tag_and_string_share_arrow_type() {
        let tag = column_field(&ColumnSchema::new("host", ColumnType::Tag));
        let text = column_field(&ColumnSchema::new("msg", ColumnType::String));
        assert_eq!(tag.data_type(), text.data_type());
        assert_eq!(column_type_of(&tag), Some(ColumnType::Tag));
        assert_eq!(column_type_of(&text), Some(ColumnType::String));
    }

    #[test]
    fn test_column_type_without_metadata() {
        let field = Field::new("v", DataType::UInt64, true);
        assert_eq!(column_type_of(&field), Some(ColumnType::UInt));
        let nested = Field::new("v", DataType::Date32, true);
        assert_eq!(column_type_of(&nested), None);
    }

    #[test]
    fn test_create_batch_schema_order() {
        let columns = vec![
            ColumnSchema::new("a", ColumnType::Float),
            ColumnSchema::new("b", ColumnType::Tag),
            ColumnSchema::new(TIME_COLUMN, ColumnType::Int),
        ];
        let mut metadata = HashMap::new();
        metadata.insert(KEY_DATABASE.to_string(), "db0".to_string());
        let schema = create_batch_schema(&columns, metadata);
        let names: Vec<_> = schema.fields().iter().map(|f| f.name().as_str()).collect();
        assert_eq!(names, vec!["a", "b", "time"]);
        assert_eq!(schema.metadata().get(KEY_DATABASE).map(String::as_str), Some("db0"));
    }
}
