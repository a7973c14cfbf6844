// In: src/bridge/codec.rs

//! The stateful facade: one configuration, one geo codec and one converter
//! registry, shared by every encode and decode call.

use std::io::{Read, Write};
use std::sync::Arc;

use crate::config::CodecConfig;
use crate::convert::{ConversionContext, ConversionMode, ConverterRegistry, Payload};
use crate::error::CodecError;
use crate::model::{BitPairGeoCodec, GeoCodec};
use crate::reader::{read_stream, BatchReader};

/// Per-call decode switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Decode to a column map whatever the stream's mode tag says.
    pub force_pair: bool,
}

/// Encodes payloads to Arrow IPC streams and decodes them back.
///
/// Cheap to clone; all state is behind `Arc`s and never mutated.
#[derive(Debug, Clone)]
pub struct Codec {
    config: Arc<CodecConfig>,
    geo: Arc<dyn GeoCodec>,
    registry: Arc<ConverterRegistry>,
}

impl Default for Codec {
    fn default() -> Self {
        Self {
            config: Arc::new(CodecConfig::default()),
            geo: Arc::new(BitPairGeoCodec),
            registry: Arc::new(ConverterRegistry::with_defaults()),
        }
    }
}

impl Codec {
    pub fn new(config: CodecConfig) -> Result<Self, CodecError> {
        config.validate()?;
        Ok(Self {
            config: Arc::new(config),
            ..Self::default()
        })
    }

    pub fn with_geo_codec(mut self, geo: Arc<dyn GeoCodec>) -> Self {
        self.geo = geo;
        self
    }

    pub fn with_registry(mut self, registry: ConverterRegistry) -> Self {
        self.registry = Arc::new(registry);
        self
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    pub fn registry(&self) -> &ConverterRegistry {
        &self.registry
    }

    fn context(&self) -> ConversionContext<'_> {
        ConversionContext {
            config: &self.config,
            geo: self.geo.as_ref(),
        }
    }

    /// Writes `payload` to `sink` with the first registered converter that
    /// accepts it.
    pub fn encode_to<W: Write>(&self, payload: &Payload, mut sink: W) -> Result<W, CodecError> {
        let converter = self.registry.find_for(payload).ok_or_else(|| {
            let kind = payload.kind_name();
            CodecError::NotConvertible(format!("no registered converter accepts a {kind}"))
        })?;
        converter.write(payload, &mut sink, &self.context())?;
        Ok(sink)
    }

    /// Writes `payload` with the converter of `mode`.
    pub fn encode_as<W: Write>(
        &self,
        payload: &Payload,
        mode: ConversionMode,
        mut sink: W,
    ) -> Result<W, CodecError> {
        let converter = self
            .registry
            .get(mode)
            .ok_or_else(|| CodecError::UnknownMode(mode.to_string()))?;
        if !converter.is_convertible(payload) {
            return Err(CodecError::NotConvertible(format!(
                "{mode} cannot write a {}",
                payload.kind_name()
            )));
        }
        converter.write(payload, &mut sink, &self.context())?;
        Ok(sink)
    }

    pub fn encode(&self, payload: &Payload) -> Result<Vec<u8>, CodecError> {
        self.encode_to(payload, Vec::new())
    }

    pub fn decode_from<R: Read>(
        &self,
        source: R,
        options: DecodeOptions,
    ) -> Result<Payload, CodecError> {
        let reader = BatchReader::try_new(source)?;
        let force_pair = options.force_pair || self.config.force_pair_output;
        read_stream(reader, &self.registry, &self.context(), force_pair)
    }

    pub fn decode(&self, bytes: &[u8]) -> Result<Payload, CodecError> {
        self.decode_from(bytes, DecodeOptions::default())
    }
}
