// In: src/model/value.rs

//! The value domain of a data point.
//!
//! A point carries exactly one value of one of five kinds. Series are
//! restricted to the first four kinds; encoders accept all five.

use std::fmt;

use arrow::datatypes::DataType;
use serde::{Deserialize, Serialize};

use crate::bridge::format::{BOOLEAN_KEY, BYTES_KEY, DOUBLE_KEY, LONG_KEY, STRING_KEY};
use crate::error::CodecError;

/// A single value held by a data point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Long(i64),
    Double(f64),
    Boolean(bool),
    String(String),
    Bytes(Vec<u8>),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Long(_) => ValueKind::Long,
            Value::Double(_) => ValueKind::Double,
            Value::Boolean(_) => ValueKind::Boolean,
            Value::String(_) => ValueKind::String,
            Value::Bytes(_) => ValueKind::Bytes,
        }
    }
}

/// The five value kinds, in the order their fields appear in a schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ValueKind {
    Long,
    Double,
    Boolean,
    String,
    Bytes,
}

impl ValueKind {
    pub const ALL: [ValueKind; 5] = [
        ValueKind::Long,
        ValueKind::Double,
        ValueKind::Boolean,
        ValueKind::String,
        ValueKind::Bytes,
    ];

    /// The field name this kind is stored under.
    pub fn field_name(&self) -> &'static str {
        match self {
            ValueKind::Long => LONG_KEY,
            ValueKind::Double => DOUBLE_KEY,
            ValueKind::Boolean => BOOLEAN_KEY,
            ValueKind::String => STRING_KEY,
            ValueKind::Bytes => BYTES_KEY,
        }
    }

    pub fn from_field_name(name: &str) -> Option<Self> {
        ValueKind::ALL.into_iter().find(|kind| kind.field_name() == name)
    }

    /// The Arrow physical type of the value field for this kind.
    pub fn data_type(&self) -> DataType {
        match self {
            ValueKind::Long => DataType::Int64,
            ValueKind::Double => DataType::Float64,
            ValueKind::Boolean => DataType::Boolean,
            ValueKind::String => DataType::Utf8,
            ValueKind::Bytes => DataType::Binary,
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field_name())
    }
}

/// The declared value type of a series. A series starts `Undefined` and is
/// fixed by its first typed point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SeriesType {
    #[default]
    Undefined,
    Long,
    Double,
    Boolean,
    String,
}

impl SeriesType {
    /// The value kind stored by a series of this type, if defined.
    pub fn value_kind(&self) -> Option<ValueKind> {
        match self {
            SeriesType::Undefined => None,
            SeriesType::Long => Some(ValueKind::Long),
            SeriesType::Double => Some(ValueKind::Double),
            SeriesType::Boolean => Some(ValueKind::Boolean),
            SeriesType::String => Some(ValueKind::String),
        }
    }
}

impl TryFrom<ValueKind> for SeriesType {
    type Error = CodecError;

    fn try_from(kind: ValueKind) -> Result<Self, Self::Error> {
        match kind {
            ValueKind::Long => Ok(SeriesType::Long),
            ValueKind::Double => Ok(SeriesType::Double),
            ValueKind::Boolean => Ok(SeriesType::Boolean),
            ValueKind::String => Ok(SeriesType::String),
            ValueKind::Bytes => Err(CodecError::UnsupportedType(
                "BYTES values cannot be stored in a series".to_string(),
            )),
        }
    }
}

impl fmt::Display for SeriesType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value_kind() {
            Some(kind) => kind.fmt(f),
            None => f.write_str("UNDEFINED"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_names_round_trip() {
        for kind in ValueKind::ALL {
            assert_eq!(ValueKind::from_field_name(kind.field_name()), Some(kind));
        }
        assert_eq!(ValueKind::from_field_name("temperature"), None);
    }

    #[test]
    fn test_bytes_is_not_a_series_type() {
        assert!(SeriesType::try_from(ValueKind::Bytes).is_err());
        assert_eq!(SeriesType::try_from(ValueKind::Double).unwrap(), SeriesType::Double);
    }
}
