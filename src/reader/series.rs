// In: src/reader/series.rs

//! Rebuilds series and encoders from SERIES, ENCODER and LIST streams.

use std::collections::BTreeMap;

use arrow::array::{Array, ArrayRef};
use arrow::record_batch::RecordBatch;

use super::access::{
    as_strings, slot_of, text_array, validate_point_schema, value_kinds, PositionColumns, Slot,
    ValueColumns,
};
use super::{bucketization_from_metadata, identity_from_metadata, BatchReader, TimeRescale};
use crate::bridge::format::{ATTRIBUTE_ROLE, IDENTITY_ROLE_KEY};
use crate::error::CodecError;
use crate::model::{Encoder, GeoCodec, Metadata, Series, SeriesType, ValueKind};

/// The one all-null row written for an empty series or encoder.
///
/// It is only valid as the sole row of a stream: any other row without a
/// timestamp is a [`CodecError::MissingTimestamp`].
#[derive(Debug, Default)]
struct EmptyRow {
    seen_at: Option<usize>,
}

impl EmptyRow {
    /// Called for a row that has no timestamp.
    fn accept(
        &mut self,
        global: usize,
        has_value: bool,
        positions: &PositionColumns<'_>,
        row: usize,
        points_read: usize,
    ) -> Result<(), CodecError> {
        if has_value || !positions.is_unplaced(row) || points_read > 0 || self.seen_at.is_some() {
            return Err(CodecError::MissingTimestamp { row: global });
        }
        self.seen_at = Some(global);
        Ok(())
    }

    /// Called for a row that has a timestamp.
    fn check_point(&self) -> Result<(), CodecError> {
        match self.seen_at {
            Some(row) => Err(CodecError::MissingTimestamp { row }),
            None => Ok(()),
        }
    }
}

/// Reads a SERIES stream. Every row must carry a timestamp and a value,
/// except the single all-null row of an empty series.
pub fn read_series(
    reader: BatchReader<'_>,
    time_units_per_second: i64,
    geo: &dyn GeoCodec,
) -> Result<Series, CodecError> {
    let schema = reader.schema().clone();
    validate_point_schema(&schema, false)?;
    let rescale = TimeRescale::from_metadata(reader.metadata(), time_units_per_second)?;

    let identity = identity_from_metadata(reader.metadata())?;
    let mut series = Series::with_metadata(identity.unwrap_or_default());
    series.set_bucketization(bucketization_from_metadata(reader.metadata())?);
    for kind in value_kinds(&schema) {
        if kind == ValueKind::Bytes {
            return Err(CodecError::UnsupportedType(format!(
                "a series cannot hold {kind} values"
            )));
        }
        series.set_type(SeriesType::try_from(kind)?)?;
    }

    let mut empty_row = EmptyRow::default();
    let mut row_base = 0;
    for batch in reader {
        let batch = batch?;
        let positions = PositionColumns::from_batch(&batch)?;
        let values = ValueColumns::from_batch(&batch)?;
        for row in 0..batch.num_rows() {
            let global = row_base + row;
            let value = values.value_at(row, global)?;
            let Some(tick) = positions.tick(row) else {
                empty_row.accept(global, value.is_some(), &positions, row, series.len())?;
                continue;
            };
            empty_row.check_point()?;
            if series.series_type() == SeriesType::Undefined {
                return Err(CodecError::UndefinedType(series.name().to_string()));
            }
            let value = value.ok_or(CodecError::MissingValue { row: global })?;
            series.push(
                rescale.apply(tick),
                positions.location(row, geo),
                positions.elevation(row),
                value,
            )?;
        }
        row_base += batch.num_rows();
    }

    log::debug!("Read series '{}' with {} points", series.name(), series.len());
    Ok(series)
}

/// Reads an ENCODER stream. A row must carry exactly one value, except the
/// single all-null row of an empty encoder.
pub fn read_encoder(
    reader: BatchReader<'_>,
    time_units_per_second: i64,
    geo: &dyn GeoCodec,
) -> Result<Encoder, CodecError> {
    validate_point_schema(reader.schema(), false)?;
    let rescale = TimeRescale::from_metadata(reader.metadata(), time_units_per_second)?;

    let mut encoder = Encoder::new();
    encoder.set_metadata(identity_from_metadata(reader.metadata())?);

    let mut empty_row = EmptyRow::default();
    let mut row_base = 0;
    for batch in reader {
        let batch = batch?;
        let positions = PositionColumns::from_batch(&batch)?;
        let values = ValueColumns::from_batch(&batch)?;
        for row in 0..batch.num_rows() {
            let global = row_base + row;
            let value = values.value_at(row, global)?;
            let Some(tick) = positions.tick(row) else {
                empty_row.accept(global, value.is_some(), &positions, row, encoder.len())?;
                continue;
            };
            empty_row.check_point()?;
            let value = value.ok_or(CodecError::MissingValue { row: global })?;
            encoder.push(
                rescale.apply(tick),
                positions.location(row, geo),
                positions.elevation(row),
                value,
            );
        }
        row_base += batch.num_rows();
    }
    Ok(encoder)
}

//==================================================================================
// LIST streams
//==================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IdentityRole {
    Classname,
    Label,
    Attribute,
}

/// Identity columns of one batch, unpacked to plain strings.
struct IdentityColumns {
    columns: Vec<(String, IdentityRole, ArrayRef)>,
}

impl IdentityColumns {
    fn from_batch(batch: &RecordBatch) -> Result<Self, CodecError> {
        let mut columns = Vec::new();
        for (field, array) in batch.schema().fields().iter().zip(batch.columns()) {
            let role = match slot_of(field.name()) {
                Slot::Classname => IdentityRole::Classname,
                Slot::Other => match field.metadata().get(IDENTITY_ROLE_KEY).map(String::as_str) {
                    Some(ATTRIBUTE_ROLE) => IdentityRole::Attribute,
                    _ => IdentityRole::Label,
                },
                _ => continue,
            };
            columns.push((field.name().clone(), role, text_array(array)?));
        }
        Ok(Self { columns })
    }

    /// `None` when the row has no classname and no label or attribute.
    fn identity_at(&self, row: usize) -> Result<Option<Metadata>, CodecError> {
        let mut name = None;
        let mut labels = BTreeMap::new();
        let mut attributes = BTreeMap::new();
        for (key, role, array) in &self.columns {
            let strings = as_strings(array)?;
            if strings.is_null(row) {
                continue;
            }
            let value = strings.value(row).to_string();
            match role {
                IdentityRole::Classname => name = Some(value),
                IdentityRole::Label => {
                    labels.insert(key.clone(), value);
                }
                IdentityRole::Attribute => {
                    attributes.insert(key.clone(), value);
                }
            }
        }
        if name.is_none() && labels.is_empty() && attributes.is_empty() {
            return Ok(None);
        }
        Ok(Some(Metadata {
            name: name.unwrap_or_default(),
            labels,
            attributes,
        }))
    }
}

/// Reads a LIST stream into encoders.
///
/// Consecutive rows with the same identity form one encoder. A row with no
/// timestamp, no position and no value is the identity row of an empty input:
/// it becomes an encoder of its own with no points.
pub fn read_list(
    reader: BatchReader<'_>,
    time_units_per_second: i64,
    geo: &dyn GeoCodec,
) -> Result<Vec<Encoder>, CodecError> {
    validate_point_schema(reader.schema(), true)?;
    let rescale = TimeRescale::from_metadata(reader.metadata(), time_units_per_second)?;

    let mut encoders: Vec<Encoder> = Vec::new();
    // Set after an identity row so the next row never joins that empty encoder.
    let mut sealed = false;
    let mut row_base = 0;

    for batch in reader {
        let batch = batch?;
        let identities = IdentityColumns::from_batch(&batch)?;
        let positions = PositionColumns::from_batch(&batch)?;
        let values = ValueColumns::from_batch(&batch)?;

        for row in 0..batch.num_rows() {
            let global = row_base + row;
            let identity = identities.identity_at(row)?;
            let value = values.value_at(row, global)?;

            let Some(tick) = positions.tick(row) else {
                if value.is_some() || !positions.is_unplaced(row) {
                    return Err(CodecError::MissingTimestamp { row: global });
                }
                let mut empty = Encoder::new();
                empty.set_metadata(identity);
                encoders.push(empty);
                sealed = true;
                continue;
            };
            let value = value.ok_or(CodecError::MissingValue { row: global })?;

            let joins_last = !sealed
                && encoders
                    .last()
                    .is_some_and(|last| last.metadata() == identity.as_ref());
            if !joins_last {
                let mut next = Encoder::new();
                next.set_metadata(identity);
                encoders.push(next);
            }
            sealed = false;
            if let Some(current) = encoders.last_mut() {
                current.push(
                    rescale.apply(tick),
                    positions.location(row, geo),
                    positions.elevation(row),
                    value,
                );
            }
        }
        row_base += batch.num_rows();
    }

    log::debug!("Read {} encoders from list stream", encoders.len());
    Ok(encoders)
}
