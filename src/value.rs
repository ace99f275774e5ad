//! # Field Values and Column Types
//!
//! Rows arrive schemaless: every field carries one of a closed set of scalar
//! types. The first value observed for a column name decides the column's
//! [`ColumnType`] for the rest of the batch.
//!
//! | Value | Column type | Arrow type |
//! |-------|-------------|------------|
//! | signed integer | `Int` | Int64 |
//! | unsigned integer | `UInt` | UInt64 |
//! | float | `Float` | Float64 |
//! | string | `String` | Utf8 |
//! | boolean | `Boolean` | Boolean |
//! | tag (always string) | `Tag` | Utf8 |

use std::fmt;

use arrow::datatypes::DataType;
use serde::{Deserialize, Serialize};

/// Type of a buffered column, locked by the first value seen for its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    /// Signed 64-bit integer
    Int,
    /// Unsigned 64-bit integer
    UInt,
    /// 64-bit float
    Float,
    /// UTF-8 string field
    String,
    /// Boolean field
    Boolean,
    /// Categorical string identifier
    Tag,
}

impl ColumnType {
    /// Arrow data type used when the column is materialized.
    pub fn data_type(&self) -> DataType {
        match self {
            ColumnType::Int => DataType::Int64,
            ColumnType::UInt => DataType::UInt64,
            ColumnType::Float => DataType::Float64,
            ColumnType::String | ColumnType::Tag => DataType::Utf8,
            ColumnType::Boolean => DataType::Boolean,
        }
    }

    /// Stable lowercase name, also used in Arrow field metadata.
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Int => "int",
            ColumnType::UInt => "uint",
            ColumnType::Float => "float",
            ColumnType::String => "string",
            ColumnType::Boolean => "boolean",
            ColumnType::Tag => "tag",
        }
    }

    /// Returns true for tag columns.
    pub fn is_tag(&self) -> bool {
        matches!(self, ColumnType::Tag)
    }

    /// Whether a value of the given variant may be stored in a column of this type.
    ///
    /// Tag columns hold string values; every other type requires an exact match.
    pub fn accepts(&self, value: &FieldValue) -> bool {
        match self {
            ColumnType::Tag => matches!(value, FieldValue::String(_)),
            other => *other == value.column_type(),
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single field value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Signed integer
    Int(i64),
    /// Unsigned integer
    UInt(u64),
    /// Floating point
    Float(f64),
    /// String
    String(String),
    /// Boolean
    Boolean(bool),
}

impl FieldValue {
    /// Column type inferred from this value when it creates a new field column.
    pub fn column_type(&self) -> ColumnType {
        match self {
            FieldValue::Int(_) => ColumnType::Int,
            FieldValue::UInt(_) => ColumnType::UInt,
            FieldValue::Float(_) => ColumnType::Float,
            FieldValue::String(_) => ColumnType::String,
            FieldValue::Boolean(_) => ColumnType::Boolean,
        }
    }

    /// Returns the string payload, if any.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Int(v) => write!(f, "{v}i"),
            FieldValue::UInt(v) => write!(f, "{v}u"),
            FieldValue::Float(v) => write!(f, "{v}"),
            FieldValue::String(v) => write!(f, "{v:?}"),
            FieldValue::Boolean(v) => write!(f, "{v}"),
        }
    }
}

macro_rules! impl_from_scalar {
    ($variant:ident, $target:ty, $($source:ty),+) => {
        $(
            impl From<$source> for FieldValue {
                fn from(value: $source) -> Self {
                    FieldValue::$variant(<$target>::from(value))
                }
            }
        )+
    };
}

impl_from_scalar!(Int, i64, i64, i32, i16, i8);
impl_from_scalar!(UInt, u64, u64, u32, u16, u8);
impl_from_scalar!(Float, f64, f64, f32);
impl_from_scalar!(Boolean, bool, bool);
impl_from_scalar!(String, String, String, &str);

/// A dynamic value whose shape has no column type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported value kind: {kind}")]
pub struct UnsupportedValue {
    /// Kind of the rejected value (e.g. "null", "array", "object")
    pub kind: &'static str,
}

impl TryFrom<serde_json::Value> for FieldValue {
    type Error = UnsupportedValue;

    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        use serde_json::Value;

        match value {
            Value::String(s) => Ok(FieldValue::String(s)),
            Value::Bool(b) => Ok(FieldValue::Boolean(b)),
            Value::Number(n) => {
                // Integers that fit i64 stay signed; only values above i64::MAX become UInt.
                if let Some(i) = n.as_i64() {
                    Ok(FieldValue::Int(i))
                } else if let Some(u) = n.as_u64() {
                    Ok(FieldValue::UInt(u))
                } else if let Some(f) = n.as_f64() {
                    Ok(FieldValue::Float(f))
                } else {
                    Err(UnsupportedValue { kind: "number" })
                }
            }
            Value::Null => Err(UnsupportedValue { kind: "null" }),
            Value::Array(_) => Err(UnsupportedValue { kind: "array" }),
            Value::Object(_) => Err(UnsupportedValue { kind: "object" }),
        }
    }
}
