// In: src/writer/projector.rs

//! Maps one (identity, point) pair onto the fields of a schema.

use crate::model::{GeoCodec, Metadata, PointView, Value};
use crate::schema::{FieldDescriptor, FieldRole};

/// One projected cell, borrowed from the input being written.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cell<'a> {
    Null,
    Text(&'a str),
    Long(i64),
    Float(f32),
    Double(f64),
    Boolean(bool),
    Bytes(&'a [u8]),
}

impl<'a> Cell<'a> {
    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    fn from_value(value: &'a Value) -> Self {
        match value {
            Value::Long(v) => Cell::Long(*v),
            Value::Double(v) => Cell::Double(*v),
            Value::Boolean(v) => Cell::Boolean(*v),
            Value::String(v) => Cell::Text(v),
            Value::Bytes(v) => Cell::Bytes(v),
        }
    }
}

/// Fills `out` with one cell per field, in field order.
///
/// `point` is `None` for the single metadata row of an empty input: every
/// positional and value cell is then null.
pub fn project_row<'a>(
    fields: &[FieldDescriptor],
    identity: Option<&'a Metadata>,
    point: Option<PointView<'a>>,
    geo: &dyn GeoCodec,
    out: &mut Vec<Cell<'a>>,
) {
    out.clear();
    let coordinates = point.and_then(|p| p.location).map(|code| geo.unpack(code));

    for field in fields {
        let cell = match field.role() {
            FieldRole::Classname => identity
                .filter(|m| !m.name.is_empty())
                .map_or(Cell::Null, |m| Cell::Text(&m.name)),
            FieldRole::Label(key) => identity
                .and_then(|m| m.labels.get(key))
                .map_or(Cell::Null, |v| Cell::Text(v)),
            FieldRole::Attribute(key) => identity
                .and_then(|m| m.attributes.get(key))
                .map_or(Cell::Null, |v| Cell::Text(v)),
            FieldRole::Timestamp => point.map_or(Cell::Null, |p| Cell::Long(p.tick)),
            FieldRole::Latitude => {
                coordinates.map_or(Cell::Null, |(lat, _)| Cell::Float(lat as f32))
            }
            FieldRole::Longitude => {
                coordinates.map_or(Cell::Null, |(_, lon)| Cell::Float(lon as f32))
            }
            FieldRole::Elevation => point
                .and_then(|p| p.elevation)
                .map_or(Cell::Null, Cell::Long),
            FieldRole::Value(kind) => point
                .filter(|p| p.value.kind() == *kind)
                .map_or(Cell::Null, |p| Cell::from_value(p.value)),
            // Column-map cells come straight from their column.
            FieldRole::Column => Cell::Null,
        };
        out.push(cell);
    }
}
