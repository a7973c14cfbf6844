// In: src/convert/builtin.rs

//! The four built-in conversion paths, one per [`ConversionMode`].

use std::io::Write;

use super::{ConversionContext, ConversionMode, Converter, Payload};
use crate::error::CodecError;
use crate::model::Input;
use crate::reader::{read_columns, read_encoder, read_list, read_series, BatchReader};
use crate::schema::SchemaBuilder;
use crate::writer::{write_columns, write_encoder, write_inputs, write_series};

fn not_convertible(mode: ConversionMode, payload: &Payload) -> CodecError {
    CodecError::NotConvertible(format!("{mode} cannot write a {}", payload.kind_name()))
}

/// One series, identity in the schema metadata.
#[derive(Debug, Clone, Copy, Default)]
pub struct SeriesConverter;

impl Converter for SeriesConverter {
    fn mode(&self) -> ConversionMode {
        ConversionMode::Series
    }

    fn is_convertible(&self, payload: &Payload) -> bool {
        matches!(payload, Payload::Series(_))
    }

    fn write(
        &self,
        payload: &Payload,
        sink: &mut dyn Write,
        ctx: &ConversionContext<'_>,
    ) -> Result<(), CodecError> {
        let Payload::Series(series) = payload else {
            return Err(not_convertible(self.mode(), payload));
        };
        let schema = SchemaBuilder::new(ctx.config).for_series(series)?;
        write_series(sink, &schema, series, ctx.config.rows_per_batch, ctx.geo)?;
        Ok(())
    }

    fn read(
        &self,
        reader: BatchReader<'_>,
        ctx: &ConversionContext<'_>,
    ) -> Result<Payload, CodecError> {
        read_series(reader, ctx.config.time_units_per_second, ctx.geo).map(Payload::Series)
    }
}

/// One encoder, identity in the schema metadata.
#[derive(Debug, Clone, Copy, Default)]
pub struct EncoderConverter;

impl Converter for EncoderConverter {
    fn mode(&self) -> ConversionMode {
        ConversionMode::Encoder
    }

    fn is_convertible(&self, payload: &Payload) -> bool {
        matches!(payload, Payload::Encoder(_))
    }

    fn write(
        &self,
        payload: &Payload,
        sink: &mut dyn Write,
        ctx: &ConversionContext<'_>,
    ) -> Result<(), CodecError> {
        let Payload::Encoder(encoder) = payload else {
            return Err(not_convertible(self.mode(), payload));
        };
        let schema = SchemaBuilder::new(ctx.config).for_encoder(encoder)?;
        write_encoder(sink, &schema, encoder, ctx.config.rows_per_batch, ctx.geo)?;
        Ok(())
    }

    fn read(
        &self,
        reader: BatchReader<'_>,
        ctx: &ConversionContext<'_>,
    ) -> Result<Payload, CodecError> {
        read_encoder(reader, ctx.config.time_units_per_second, ctx.geo).map(Payload::Encoder)
    }
}

/// A heterogeneous list, identity in dictionary columns. Decodes to encoders.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListConverter;

impl Converter for ListConverter {
    fn mode(&self) -> ConversionMode {
        ConversionMode::List
    }

    fn is_convertible(&self, payload: &Payload) -> bool {
        matches!(payload, Payload::List(_))
    }

    fn write(
        &self,
        payload: &Payload,
        sink: &mut dyn Write,
        ctx: &ConversionContext<'_>,
    ) -> Result<(), CodecError> {
        let Payload::List(inputs) = payload else {
            return Err(not_convertible(self.mode(), payload));
        };
        let schema = SchemaBuilder::new(ctx.config).for_inputs(inputs)?;
        write_inputs(sink, &schema, inputs, ctx.config.rows_per_batch, ctx.geo)?;
        Ok(())
    }

    fn read(
        &self,
        reader: BatchReader<'_>,
        ctx: &ConversionContext<'_>,
    ) -> Result<Payload, CodecError> {
        let encoders = read_list(reader, ctx.config.time_units_per_second, ctx.geo)?;
        Ok(Payload::List(encoders.into_iter().map(Input::Encoder).collect()))
    }
}

/// A column map with caller metadata. Reads any stream.
#[derive(Debug, Clone, Copy, Default)]
pub struct PairConverter;

impl Converter for PairConverter {
    fn mode(&self) -> ConversionMode {
        ConversionMode::Pair
    }

    fn is_convertible(&self, payload: &Payload) -> bool {
        matches!(payload, Payload::Pair(_))
    }

    fn write(
        &self,
        payload: &Payload,
        sink: &mut dyn Write,
        ctx: &ConversionContext<'_>,
    ) -> Result<(), CodecError> {
        let Payload::Pair(pair) = payload else {
            return Err(not_convertible(self.mode(), payload));
        };
        let schema = SchemaBuilder::new(ctx.config).for_columns(&pair.metadata, &pair.columns)?;
        write_columns(sink, &schema, &pair.columns, ctx.config.rows_per_batch)?;
        Ok(())
    }

    fn read(
        &self,
        reader: BatchReader<'_>,
        _ctx: &ConversionContext<'_>,
    ) -> Result<Payload, CodecError> {
        read_columns(reader).map(Payload::Pair)
    }
}
