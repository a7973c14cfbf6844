// In: src/reader/columns.rs

//! Generic column-map decoding (PAIR mode), usable on any stream.

use arrow::array::{Array, ArrayRef, AsArray};
use arrow::datatypes::{DataType, Field, Float32Type, Float64Type, Int16Type, Int32Type, Int64Type};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use super::access::{as_strings, expect_text, text_array, type_error};
use super::BatchReader;
use crate::error::CodecError;
use crate::model::{Column, ColumnMap, Pair};

/// Target column kind of a stream field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Integer,
    Float,
    Boolean,
    Text,
    /// Binary values, rendered as base64 text.
    Base64,
}

/// Plain integers start at 16 bits; `Int8` is only accepted as dictionary keys.
fn column_kind(field: &Field) -> Result<ColumnKind, CodecError> {
    match field.data_type() {
        DataType::Int16 | DataType::Int32 | DataType::Int64 => Ok(ColumnKind::Integer),
        DataType::Float32 | DataType::Float64 => Ok(ColumnKind::Float),
        DataType::Boolean => Ok(ColumnKind::Boolean),
        DataType::Utf8 | DataType::Dictionary(_, _) => {
            expect_text(field)?;
            Ok(ColumnKind::Text)
        }
        DataType::Binary => Ok(ColumnKind::Base64),
        _ => Err(type_error(field)),
    }
}

fn empty_column(kind: ColumnKind) -> Column {
    match kind {
        ColumnKind::Integer => Column::Integer(Vec::new()),
        ColumnKind::Float => Column::Float(Vec::new()),
        ColumnKind::Boolean => Column::Boolean(Vec::new()),
        ColumnKind::Text | ColumnKind::Base64 => Column::Text(Vec::new()),
    }
}

fn append(column: &mut Column, array: &ArrayRef) -> Result<(), CodecError> {
    match (column, array.data_type()) {
        (Column::Integer(out), DataType::Int16) => {
            out.extend(array.as_primitive::<Int16Type>().iter().map(|v| v.map(i64::from)))
        }
        (Column::Integer(out), DataType::Int32) => {
            out.extend(array.as_primitive::<Int32Type>().iter().map(|v| v.map(i64::from)))
        }
        (Column::Integer(out), DataType::Int64) => {
            out.extend(array.as_primitive::<Int64Type>().iter())
        }
        (Column::Float(out), DataType::Float32) => {
            out.extend(array.as_primitive::<Float32Type>().iter().map(|v| v.map(f64::from)))
        }
        (Column::Float(out), DataType::Float64) => {
            out.extend(array.as_primitive::<Float64Type>().iter())
        }
        (Column::Boolean(out), DataType::Boolean) => out.extend(array.as_boolean().iter()),
        (Column::Text(out), DataType::Binary) => out.extend(
            array
                .as_binary::<i32>()
                .iter()
                .map(|v| v.map(|bytes| STANDARD.encode(bytes))),
        ),
        (Column::Text(out), DataType::Utf8 | DataType::Dictionary(_, _)) => {
            let strings = text_array(array)?;
            out.extend(as_strings(&strings)?.iter().map(|v| v.map(str::to_string)))
        }
        (_, data_type) => {
            return Err(CodecError::Internal(format!(
                "column changed to {data_type} between batches"
            )))
        }
    }
    Ok(())
}

/// Decodes every field of the stream into a column, in field order. Stream
/// metadata is returned as is; ticks are not rescaled.
pub fn read_columns(reader: BatchReader<'_>) -> Result<Pair, CodecError> {
    let schema = reader.schema().clone();
    let mut columns = ColumnMap::with_capacity(schema.fields().len());
    for field in schema.fields() {
        columns.insert(field.name().clone(), empty_column(column_kind(field)?));
    }

    for batch in reader {
        let batch = batch?;
        for (column, array) in columns.values_mut().zip(batch.columns()) {
            append(column, array)?;
        }
    }

    Ok(Pair::new(schema.metadata().clone(), columns))
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::datatypes::TimeUnit;

    #[test]
    fn test_unsupported_layouts() {
        let cases = [
            (DataType::Int8, "unsupported"),
            (DataType::UInt32, "signedness"),
            (DataType::Float16, "unsupported"),
            (DataType::Timestamp(TimeUnit::Millisecond, None), "unsupported"),
            (DataType::Date32, "unsupported"),
            (DataType::FixedSizeBinary(4), "unsupported"),
            (DataType::Decimal128(10, 2), "unsupported"),
            (DataType::LargeUtf8, "unsupported"),
            (
                DataType::Dictionary(Box::new(DataType::UInt8), Box::new(DataType::Utf8)),
                "signedness",
            ),
            (
                DataType::Dictionary(Box::new(DataType::Int16), Box::new(DataType::Int64)),
                "non-string",
            ),
        ];
        for (data_type, expected) in cases {
            let field = Field::new("f", data_type.clone(), true);
            let err = column_kind(&field).unwrap_err();
            let matched = match expected {
                "signedness" => matches!(err, CodecError::SignednessMismatch { .. }),
                "non-string" => matches!(err, CodecError::NonStringDictionary { .. }),
                _ => matches!(err, CodecError::UnsupportedType(_)),
            };
            assert!(matched, "{data_type} gave {err:?}");
        }
    }

    #[test]
    fn test_supported_layouts() {
        let dict = DataType::Dictionary(Box::new(DataType::Int8), Box::new(DataType::Utf8));
        let cases = [
            (DataType::Int16, ColumnKind::Integer),
            (DataType::Int64, ColumnKind::Integer),
            (DataType::Float32, ColumnKind::Float),
            (dict, ColumnKind::Text),
            (DataType::Binary, ColumnKind::Base64),
        ];
        for (data_type, expected) in cases {
            let field = Field::new("f", data_type.clone(), true);
            assert_eq!(column_kind(&field).unwrap(), expected, "{data_type}");
        }
    }
}
