// In: src/bridge/stateless_api.rs

use std::collections::HashMap;

use crate::bridge::codec::{Codec, DecodeOptions};
use crate::bridge::format::StreamInfo;
use crate::config::CodecConfig;
use crate::convert::Payload;
use crate::error::CodecError;
use crate::model::ColumnMap;
use crate::reader::BatchReader;
use crate::schema::SchemaBuilder;
use crate::writer::write_columns;

/// Encodes a payload with the default configuration.
pub fn encode(payload: &Payload) -> Result<Vec<u8>, CodecError> {
    Codec::default().encode(payload)
}

/// Decodes a stream with the default configuration.
pub fn decode(bytes: &[u8]) -> Result<Payload, CodecError> {
    Codec::default().decode(bytes)
}

pub fn decode_with(bytes: &[u8], options: DecodeOptions) -> Result<Payload, CodecError> {
    Codec::default().decode_from(bytes, options)
}

/// Writes a column map as a PAIR stream, without building a [`Payload`].
/// `rows_per_batch == 0` writes a single batch.
pub fn encode_columns(
    metadata: &HashMap<String, String>,
    columns: &ColumnMap,
    rows_per_batch: usize,
) -> Result<Vec<u8>, CodecError> {
    let config = CodecConfig {
        rows_per_batch,
        ..CodecConfig::default()
    };
    let schema = SchemaBuilder::new(&config).for_columns(metadata, columns)?;
    write_columns(Vec::new(), &schema, columns, config.rows_per_batch)
}

/// Summarizes a stream: schema, mode tag, batch and row counts.
/// Batches are read but their values are never decoded.
pub fn inspect(bytes: &[u8]) -> Result<StreamInfo, CodecError> {
    let reader = BatchReader::try_new(bytes)?;
    let schema = reader.schema().as_ref().clone();
    let mode = match reader.mode() {
        Ok(mode) => mode,
        Err(e) => {
            log::warn!("Inspecting stream with an unrecognized mode: {e}");
            None
        }
    };

    let mut batches = 0;
    let mut rows = 0;
    for batch in reader {
        batches += 1;
        rows += batch?.num_rows();
    }

    Ok(StreamInfo {
        schema,
        mode,
        batches,
        rows,
        total_size: bytes.len(),
    })
}
