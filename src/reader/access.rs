// In: src/reader/access.rs

//! Field type validation and typed column views shared by the readers.

use std::sync::Arc;

use arrow::array::{
    Array, ArrayRef, BinaryArray, BooleanArray, Float32Array, Float64Array, Int64Array, StringArray,
};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;

use crate::bridge::format::{
    CLASSNAME_KEY, ELEVATION_KEY, LATITUDE_KEY, LONGITUDE_KEY, TIMESTAMP_KEY,
};
use crate::error::CodecError;
use crate::model::{GeoCodec, Value, ValueKind};

//==================================================================================
// I. Type Validation
//==================================================================================

fn is_signed_int(data_type: &DataType) -> bool {
    matches!(
        data_type,
        DataType::Int8 | DataType::Int16 | DataType::Int32 | DataType::Int64
    )
}

fn is_unsigned_int(data_type: &DataType) -> bool {
    matches!(
        data_type,
        DataType::UInt8 | DataType::UInt16 | DataType::UInt32 | DataType::UInt64
    )
}

/// The error for a field whose type cannot be decoded where it appears.
pub(crate) fn type_error(field: &Field) -> CodecError {
    let unsigned = match field.data_type() {
        DataType::Dictionary(keys, _) => is_unsigned_int(keys),
        other => is_unsigned_int(other),
    };
    if unsigned {
        return CodecError::SignednessMismatch {
            field: field.name().clone(),
            data_type: field.data_type().to_string(),
        };
    }
    CodecError::UnsupportedType(format!("{} (field '{}')", field.data_type(), field.name()))
}

pub(crate) fn expect_type(field: &Field, expected: &DataType) -> Result<(), CodecError> {
    if field.data_type() == expected {
        Ok(())
    } else {
        Err(type_error(field))
    }
}

/// Accepts `Utf8`, or a dictionary with signed keys and `Utf8` values.
pub(crate) fn expect_text(field: &Field) -> Result<(), CodecError> {
    match field.data_type() {
        DataType::Utf8 => Ok(()),
        DataType::Dictionary(keys, values) => {
            if !is_signed_int(keys) {
                return Err(type_error(field));
            }
            if **values != DataType::Utf8 {
                return Err(CodecError::NonStringDictionary {
                    field: field.name().clone(),
                    value_type: values.to_string(),
                });
            }
            Ok(())
        }
        _ => Err(type_error(field)),
    }
}

/// How the field is laid out in a SERIES, ENCODER or LIST stream.
pub(crate) enum Slot {
    Timestamp,
    Latitude,
    Longitude,
    Elevation,
    Classname,
    Value(ValueKind),
    Other,
}

pub(crate) fn slot_of(name: &str) -> Slot {
    match name {
        TIMESTAMP_KEY => Slot::Timestamp,
        LATITUDE_KEY => Slot::Latitude,
        LONGITUDE_KEY => Slot::Longitude,
        ELEVATION_KEY => Slot::Elevation,
        CLASSNAME_KEY => Slot::Classname,
        other => ValueKind::from_field_name(other).map_or(Slot::Other, Slot::Value),
    }
}

/// Checks every reserved field against its fixed type. Other fields must be
/// text-like when `identity_fields` is set and are ignored otherwise.
pub(crate) fn validate_point_schema(
    schema: &Schema,
    identity_fields: bool,
) -> Result<(), CodecError> {
    for field in schema.fields() {
        match slot_of(field.name()) {
            Slot::Timestamp | Slot::Elevation => expect_type(field, &DataType::Int64)?,
            Slot::Latitude | Slot::Longitude => expect_type(field, &DataType::Float32)?,
            Slot::Value(kind) => expect_type(field, &kind.data_type())?,
            Slot::Classname => expect_text(field)?,
            Slot::Other if identity_fields => expect_text(field)?,
            Slot::Other => log::debug!("Ignoring field '{}'", field.name()),
        }
    }
    Ok(())
}

/// Value kinds that have a field in `schema`, in field order.
pub(crate) fn value_kinds(schema: &Schema) -> Vec<ValueKind> {
    schema
        .fields()
        .iter()
        .filter_map(|f| ValueKind::from_field_name(f.name()))
        .collect()
}

//==================================================================================
// II. Typed Column Views
//==================================================================================

pub(crate) fn column<'b, T: Array + 'static>(
    batch: &'b RecordBatch,
    name: &str,
) -> Result<Option<&'b T>, CodecError> {
    batch
        .column_by_name(name)
        .map(|array| {
            array.as_any().downcast_ref::<T>().ok_or_else(|| {
                CodecError::Internal(format!("column '{name}' changed type between batches"))
            })
        })
        .transpose()
}

/// Unpacks a dictionary column into plain strings; `Utf8` is passed through.
pub(crate) fn text_array(array: &ArrayRef) -> Result<ArrayRef, CodecError> {
    match array.data_type() {
        DataType::Utf8 => Ok(Arc::clone(array)),
        _ => Ok(cast(array, &DataType::Utf8)?),
    }
}

pub(crate) fn as_strings(array: &ArrayRef) -> Result<&StringArray, CodecError> {
    array
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| CodecError::Internal("text column is not Utf8".to_string()))
}

/// Timestamp, location and elevation columns of one batch.
pub(crate) struct PositionColumns<'b> {
    timestamp: Option<&'b Int64Array>,
    latitude: Option<&'b Float32Array>,
    longitude: Option<&'b Float32Array>,
    elevation: Option<&'b Int64Array>,
}

impl<'b> PositionColumns<'b> {
    pub(crate) fn from_batch(batch: &'b RecordBatch) -> Result<Self, CodecError> {
        Ok(Self {
            timestamp: column(batch, TIMESTAMP_KEY)?,
            latitude: column(batch, LATITUDE_KEY)?,
            longitude: column(batch, LONGITUDE_KEY)?,
            elevation: column(batch, ELEVATION_KEY)?,
        })
    }

    pub(crate) fn tick(&self, row: usize) -> Option<i64> {
        self.timestamp.filter(|c| c.is_valid(row)).map(|c| c.value(row))
    }

    /// A location needs both coordinates.
    pub(crate) fn location(&self, row: usize, geo: &dyn GeoCodec) -> Option<i64> {
        let lat = self.latitude.filter(|c| c.is_valid(row))?.value(row);
        let lon = self.longitude.filter(|c| c.is_valid(row))?.value(row);
        Some(geo.pack(lat as f64, lon as f64))
    }

    pub(crate) fn elevation(&self, row: usize) -> Option<i64> {
        self.elevation.filter(|c| c.is_valid(row)).map(|c| c.value(row))
    }

    /// True when latitude, longitude and elevation are all null.
    pub(crate) fn is_unplaced(&self, row: usize) -> bool {
        let null_or_absent = |valid: Option<bool>| !valid.unwrap_or(false);
        null_or_absent(self.latitude.map(|c| c.is_valid(row)))
            && null_or_absent(self.longitude.map(|c| c.is_valid(row)))
            && null_or_absent(self.elevation.map(|c| c.is_valid(row)))
    }
}

/// The value columns of one batch.
pub(crate) struct ValueColumns<'b> {
    long: Option<&'b Int64Array>,
    double: Option<&'b Float64Array>,
    boolean: Option<&'b BooleanArray>,
    string: Option<&'b StringArray>,
    bytes: Option<&'b BinaryArray>,
}

impl<'b> ValueColumns<'b> {
    pub(crate) fn from_batch(batch: &'b RecordBatch) -> Result<Self, CodecError> {
        Ok(Self {
            long: column(batch, ValueKind::Long.field_name())?,
            double: column(batch, ValueKind::Double.field_name())?,
            boolean: column(batch, ValueKind::Boolean.field_name())?,
            string: column(batch, ValueKind::String.field_name())?,
            bytes: column(batch, ValueKind::Bytes.field_name())?,
        })
    }

    /// The single non-null value of `row`, `None` if every value cell is null.
    /// `global_row` is only used in errors.
    pub(crate) fn value_at(
        &self,
        row: usize,
        global_row: usize,
    ) -> Result<Option<Value>, CodecError> {
        let mut found: Vec<Value> = Vec::with_capacity(1);
        if let Some(c) = self.long.filter(|c| c.is_valid(row)) {
            found.push(Value::Long(c.value(row)));
        }
        if let Some(c) = self.double.filter(|c| c.is_valid(row)) {
            found.push(Value::Double(c.value(row)));
        }
        if let Some(c) = self.boolean.filter(|c| c.is_valid(row)) {
            found.push(Value::Boolean(c.value(row)));
        }
        if let Some(c) = self.string.filter(|c| c.is_valid(row)) {
            found.push(Value::String(c.value(row).to_string()));
        }
        if let Some(c) = self.bytes.filter(|c| c.is_valid(row)) {
            found.push(Value::Bytes(c.value(row).to_vec()));
        }

        if found.len() > 1 {
            let kinds: Vec<String> = found.iter().map(|v| v.kind().to_string()).collect();
            return Err(CodecError::AmbiguousValue {
                row: global_row,
                kinds: kinds.join(", "),
            });
        }
        Ok(found.pop())
    }
}
