//! Conversion paths between payloads and streams.
//!
//! Each [`ConversionMode`] has one [`Converter`]. The [`ConverterRegistry`]
//! maps modes to converters and picks the converter for a payload when the
//! caller does not name a mode.

mod builtin;
mod registry;

use std::io::Write;

pub use crate::bridge::format::ConversionMode;
pub use builtin::{EncoderConverter, ListConverter, PairConverter, SeriesConverter};
pub use registry::ConverterRegistry;

use crate::config::CodecConfig;
use crate::error::CodecError;
use crate::model::{Encoder, GeoCodec, Input, Pair, Series};
use crate::reader::BatchReader;

/// Everything a codec can write, and everything it decodes to.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Series(Series),
    Encoder(Encoder),
    List(Vec<Input>),
    Pair(Pair),
}

impl Payload {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Payload::Series(_) => "series",
            Payload::Encoder(_) => "encoder",
            Payload::List(_) => "list",
            Payload::Pair(_) => "column map",
        }
    }

    pub fn into_series(self) -> Option<Series> {
        match self {
            Payload::Series(series) => Some(series),
            _ => None,
        }
    }

    pub fn into_encoder(self) -> Option<Encoder> {
        match self {
            Payload::Encoder(encoder) => Some(encoder),
            _ => None,
        }
    }

    pub fn into_list(self) -> Option<Vec<Input>> {
        match self {
            Payload::List(inputs) => Some(inputs),
            _ => None,
        }
    }

    pub fn into_pair(self) -> Option<Pair> {
        match self {
            Payload::Pair(pair) => Some(pair),
            _ => None,
        }
    }
}

/// Settings and collaborators shared by one conversion.
#[derive(Debug, Clone, Copy)]
pub struct ConversionContext<'a> {
    pub config: &'a CodecConfig,
    pub geo: &'a dyn GeoCodec,
}

/// One conversion path. Implementations must be stateless between calls.
pub trait Converter: Send + Sync {
    fn mode(&self) -> ConversionMode;

    /// Lower levels take precedence: a registered converter is replaced by a
    /// new one of the same mode only when the new level is lower or equal.
    fn priority(&self) -> i32 {
        0
    }

    fn is_convertible(&self, payload: &Payload) -> bool;

    fn write(
        &self,
        payload: &Payload,
        sink: &mut dyn Write,
        ctx: &ConversionContext<'_>,
    ) -> Result<(), CodecError>;

    fn read(
        &self,
        reader: BatchReader<'_>,
        ctx: &ConversionContext<'_>,
    ) -> Result<Payload, CodecError>;
}
