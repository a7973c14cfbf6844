//! In-memory time series types consumed and produced by the codec.

pub mod columns;
pub mod encoder;
pub mod geo;
pub mod series;
pub mod value;

pub use columns::{Column, ColumnMap, Pair};
pub use encoder::{EncodedPoint, Encoder};
pub use geo::{BitPairGeoCodec, GeoCodec};
pub use series::{Bucketization, DataPoint, Metadata, Series};
pub use value::{SeriesType, Value, ValueKind};

/// A borrowed view of one point, shared by series and encoders.
#[derive(Debug, Clone, Copy)]
pub struct PointView<'a> {
    pub tick: i64,
    pub location: Option<i64>,
    pub elevation: Option<i64>,
    pub value: &'a Value,
}

/// One element of a heterogeneous input list.
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    Series(Series),
    Encoder(Encoder),
}

impl Input {
    /// The identity, if any. A series always has one, an encoder may not.
    pub fn identity(&self) -> Option<&Metadata> {
        match self {
            Input::Series(series) => Some(series.metadata()),
            Input::Encoder(encoder) => encoder.metadata(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Input::Series(series) => series.len(),
            Input::Encoder(encoder) => encoder.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Panics if `index >= self.len()`.
    pub fn point(&self, index: usize) -> PointView<'_> {
        match self {
            Input::Series(series) => series.points()[index].view(),
            Input::Encoder(encoder) => encoder.points()[index].view(),
        }
    }

    pub fn points(&self) -> impl Iterator<Item = PointView<'_>> + '_ {
        (0..self.len()).map(move |i| self.point(i))
    }

    /// Label used in log lines and error messages.
    pub fn display_name(&self) -> &str {
        self.identity().map(|m| m.name.as_str()).unwrap_or("<anonymous>")
    }
}

impl From<Series> for Input {
    fn from(series: Series) -> Self {
        Input::Series(series)
    }
}

impl From<Encoder> for Input {
    fn from(encoder: Encoder) -> Self {
        Input::Encoder(encoder)
    }
}
