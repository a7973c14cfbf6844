// In: src/model/encoder.rs

use super::series::{Metadata, Series};
use super::value::Value;
use super::PointView;

/// One point of an encoder. Unlike a series point, the value kind may change
/// from one point to the next.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedPoint {
    pub tick: i64,
    pub location: Option<i64>,
    pub elevation: Option<i64>,
    pub value: Value,
}

impl EncodedPoint {
    pub fn view(&self) -> PointView<'_> {
        PointView {
            tick: self.tick,
            location: self.location,
            elevation: self.elevation,
            value: &self.value,
        }
    }
}

/// A heterogeneous point container with an optional identity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Encoder {
    metadata: Option<Metadata>,
    points: Vec<EncodedPoint>,
}

impl Encoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_metadata(metadata: Metadata) -> Self {
        Self {
            metadata: Some(metadata),
            points: Vec::new(),
        }
    }

    pub fn metadata(&self) -> Option<&Metadata> {
        self.metadata.as_ref()
    }

    pub fn set_metadata(&mut self, metadata: Option<Metadata>) {
        self.metadata = metadata;
    }

    pub fn name(&self) -> Option<&str> {
        self.metadata.as_ref().map(|m| m.name.as_str())
    }

    pub fn push(&mut self, tick: i64, location: Option<i64>, elevation: Option<i64>, value: Value) {
        self.points.push(EncodedPoint {
            tick,
            location,
            elevation,
            value,
        });
    }

    pub fn points(&self) -> &[EncodedPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl From<Series> for Encoder {
    fn from(series: Series) -> Self {
        let mut encoder = Encoder::with_metadata(series.metadata().clone());
        for point in series.points() {
            encoder.push(point.tick, point.location, point.elevation, point.value.clone());
        }
        encoder
    }
}
