// In: src/model/series.rs

//! Named, typed time series.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::value::{SeriesType, Value};
use super::PointView;
use crate::error::CodecError;

/// The identity of a series or encoder: a class name plus two string maps.
///
/// Maps are ordered so that every derived schema is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub name: String,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl Metadata {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// True when there is no name and neither map has an entry.
    pub fn is_blank(&self) -> bool {
        self.name.is_empty() && self.labels.is_empty() && self.attributes.is_empty()
    }
}

/// Bucketization parameters of a regular series. Travels only in
/// single-series streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bucketization {
    pub span: i64,
    pub count: i64,
    pub last_bucket: i64,
}

/// One point of a series.
#[derive(Debug, Clone, PartialEq)]
pub struct DataPoint {
    pub tick: i64,
    pub location: Option<i64>,
    pub elevation: Option<i64>,
    pub value: Value,
}

impl DataPoint {
    pub fn view(&self) -> PointView<'_> {
        PointView {
            tick: self.tick,
            location: self.location,
            elevation: self.elevation,
            value: &self.value,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Series {
    metadata: Metadata,
    series_type: SeriesType,
    points: Vec<DataPoint>,
    bucketization: Option<Bucketization>,
}

impl Series {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_metadata(Metadata::new(name))
    }

    pub fn with_metadata(metadata: Metadata) -> Self {
        Self {
            metadata,
            ..Default::default()
        }
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.metadata
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn series_type(&self) -> SeriesType {
        self.series_type
    }

    /// Fixes the value type. Setting the type a series already has is a no-op;
    /// any other change of a defined type is a [`CodecError::TypeConflict`].
    pub fn set_type(&mut self, series_type: SeriesType) -> Result<(), CodecError> {
        if self.series_type == SeriesType::Undefined || self.series_type == series_type {
            self.series_type = series_type;
            return Ok(());
        }
        Err(CodecError::TypeConflict {
            existing: self.series_type.to_string(),
            attempted: series_type.to_string(),
        })
    }

    /// Appends a point. The first point fixes the series type; later points
    /// must agree with it.
    pub fn push(
        &mut self,
        tick: i64,
        location: Option<i64>,
        elevation: Option<i64>,
        value: Value,
    ) -> Result<(), CodecError> {
        let series_type = SeriesType::try_from(value.kind())?;
        self.set_type(series_type)?;
        self.points.push(DataPoint {
            tick,
            location,
            elevation,
            value,
        });
        Ok(())
    }

    pub fn points(&self) -> &[DataPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn has_locations(&self) -> bool {
        self.points.iter().any(|p| p.location.is_some())
    }

    pub fn has_elevations(&self) -> bool {
        self.points.iter().any(|p| p.elevation.is_some())
    }

    pub fn bucketization(&self) -> Option<&Bucketization> {
        self.bucketization.as_ref()
    }

    pub fn set_bucketization(&mut self, bucketization: Option<Bucketization>) {
        self.bucketization = bucketization;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_point_fixes_type() {
        let mut series = Series::new("temp");
        series.push(1, None, None, Value::Double(20.5)).unwrap();

        let result = series.push(2, None, None, Value::Long(3));
        assert!(matches!(result, Err(CodecError::TypeConflict { .. })));
        assert_eq!(series.len(), 1);
        assert_eq!(series.series_type(), SeriesType::Double);
    }

    #[test]
    fn test_set_same_type_twice_is_allowed() {
        let mut series = Series::new("flag");
        series.set_type(SeriesType::Boolean).unwrap();
        series.set_type(SeriesType::Boolean).unwrap();
        assert!(series.set_type(SeriesType::String).is_err());
    }

    #[test]
    fn test_bytes_are_rejected() {
        let mut series = Series::new("blob");
        let result = series.push(0, None, None, Value::Bytes(vec![1, 2]));
        assert!(matches!(result, Err(CodecError::UnsupportedType(_))));
        assert!(series.is_empty());
    }
}
