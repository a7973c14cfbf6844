//! Read path: consumes an Arrow IPC stream and rebuilds a payload.
//!
//! The conversion mode recorded in the schema metadata picks the shape of the
//! result; [`read_stream`] dispatches on it. Ticks are rescaled from the
//! producer's time unit to the reader's.

mod access;
pub mod columns;
pub mod series;

use std::collections::{BTreeMap, HashMap};
use std::io::{BufReader, Read};

use arrow::datatypes::SchemaRef;
use arrow::ipc::reader::StreamReader;
use arrow::record_batch::RecordBatch;

pub use columns::read_columns;
pub use series::{read_encoder, read_list, read_series};

use crate::bridge::format::{
    ConversionMode, ATTRIBUTES_KEY, BUCKET_COUNT_KEY, BUCKET_SPAN_KEY, CONVERSION_MODE_KEY,
    LABELS_KEY, LAST_BUCKET_KEY, NAME_KEY, TIME_UNITS_PER_SECOND_KEY,
};
use crate::convert::{ConversionContext, ConverterRegistry, Payload};
use crate::error::CodecError;
use crate::model::{Bucketization, Metadata};

//==================================================================================
// I. Stream Access
//==================================================================================

/// An open IPC stream: the schema is read eagerly, batches on demand.
pub struct BatchReader<'a> {
    inner: StreamReader<BufReader<Box<dyn Read + 'a>>>,
    schema: SchemaRef,
}

impl<'a> BatchReader<'a> {
    pub fn try_new<R: Read + 'a>(source: R) -> Result<Self, CodecError> {
        let source: Box<dyn Read + 'a> = Box::new(source);
        let inner = StreamReader::try_new(source, None)?;
        let schema = inner.schema();
        Ok(Self { inner, schema })
    }

    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    pub fn metadata(&self) -> &HashMap<String, String> {
        self.schema.metadata()
    }

    /// The recorded conversion mode, `None` when the stream has no tag.
    pub fn mode(&self) -> Result<Option<ConversionMode>, CodecError> {
        self.metadata()
            .get(CONVERSION_MODE_KEY)
            .map(|tag| tag.parse())
            .transpose()
    }
}

impl Iterator for BatchReader<'_> {
    type Item = Result<RecordBatch, CodecError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|batch| batch.map_err(CodecError::from))
    }
}

/// Reads a whole stream with the converter registered for its mode tag.
/// Untagged streams, and every stream when `force_pair` is set, decode to a
/// column map.
pub fn read_stream(
    reader: BatchReader<'_>,
    registry: &ConverterRegistry,
    ctx: &ConversionContext<'_>,
    force_pair: bool,
) -> Result<Payload, CodecError> {
    let mode = if force_pair {
        ConversionMode::Pair
    } else {
        reader.mode()?.unwrap_or_default()
    };
    let converter = registry
        .get(mode)
        .ok_or_else(|| CodecError::UnknownMode(format!("no converter registered for {mode}")))?;
    log::debug!("Decoding stream as {mode}");
    converter.read(reader, ctx)
}

//==================================================================================
// II. Time Rescaling
//==================================================================================

/// Converts producer ticks into reader ticks:
/// `round(tick * own / producer)`, halves rounded away from zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRescale {
    own: i64,
    producer: i64,
}

impl TimeRescale {
    pub fn new(own: i64, producer: i64) -> Self {
        Self { own, producer }
    }

    pub fn identity() -> Self {
        Self::new(1, 1)
    }

    /// A missing unit means the producer's unit is unknown: ticks are kept.
    pub fn from_metadata(metadata: &HashMap<String, String>, own: i64) -> Result<Self, CodecError> {
        let Some(raw) = metadata.get(TIME_UNITS_PER_SECOND_KEY) else {
            log::warn!("Stream has no '{TIME_UNITS_PER_SECOND_KEY}' entry, ticks are not rescaled");
            return Ok(Self::identity());
        };
        let producer: i64 = raw.trim().parse().map_err(|_| {
            CodecError::Metadata(format!("'{TIME_UNITS_PER_SECOND_KEY}' is not an integer: {raw}"))
        })?;
        if producer <= 0 {
            return Err(CodecError::Metadata(format!(
                "'{TIME_UNITS_PER_SECOND_KEY}' must be positive, got {producer}"
            )));
        }
        Ok(Self::new(own, producer))
    }

    pub fn apply(&self, tick: i64) -> i64 {
        if self.own == self.producer {
            return tick;
        }
        let numerator = tick as i128 * self.own as i128;
        let denominator = self.producer as i128;
        let mut quotient = numerator / denominator;
        let remainder = numerator % denominator;
        if 2 * remainder.abs() >= denominator {
            quotient += numerator.signum();
        }
        i64::try_from(quotient).unwrap_or(if quotient > 0 { i64::MAX } else { i64::MIN })
    }
}

//==================================================================================
// III. Single-Series Metadata
//==================================================================================

/// Rebuilds the identity stored by SERIES and ENCODER streams. `None` when the
/// stream carries no identity key at all.
pub fn identity_from_metadata(
    metadata: &HashMap<String, String>,
) -> Result<Option<Metadata>, CodecError> {
    let name = metadata.get(NAME_KEY);
    let labels = metadata.get(LABELS_KEY);
    let attributes = metadata.get(ATTRIBUTES_KEY);
    if name.is_none() && labels.is_none() && attributes.is_none() {
        return Ok(None);
    }
    Ok(Some(Metadata {
        name: name.cloned().unwrap_or_default(),
        labels: parse_string_map(labels)?,
        attributes: parse_string_map(attributes)?,
    }))
}

fn parse_string_map(raw: Option<&String>) -> Result<BTreeMap<String, String>, CodecError> {
    match raw {
        Some(json) => Ok(serde_json::from_str(json)?),
        None => Ok(BTreeMap::new()),
    }
}

/// Bucketization is restored only when all three keys are present.
pub fn bucketization_from_metadata(
    metadata: &HashMap<String, String>,
) -> Result<Option<Bucketization>, CodecError> {
    let (Some(span), Some(count), Some(last)) = (
        metadata.get(BUCKET_SPAN_KEY),
        metadata.get(BUCKET_COUNT_KEY),
        metadata.get(LAST_BUCKET_KEY),
    ) else {
        return Ok(None);
    };
    let parse = |key: &str, raw: &str| {
        raw.parse::<i64>()
            .map_err(|_| CodecError::Metadata(format!("'{key}' is not an integer: {raw}")))
    };
    Ok(Some(Bucketization {
        span: parse(BUCKET_SPAN_KEY, span.as_str())?,
        count: parse(BUCKET_COUNT_KEY, count.as_str())?,
        last_bucket: parse(LAST_BUCKET_KEY, last.as_str())?,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rescale_rounds_half_away_from_zero() {
        // producer in microseconds, reader in milliseconds
        let rescale = TimeRescale::new(1_000, 1_000_000);
        assert_eq!(rescale.apply(1_500), 2);
        assert_eq!(rescale.apply(1_499), 1);
        assert_eq!(rescale.apply(-1_500), -2);
        assert_eq!(rescale.apply(-1_499), -1);
        assert_eq!(rescale.apply(0), 0);
    }

    #[test]
    fn test_rescale_up_and_saturation() {
        let rescale = TimeRescale::new(1_000_000_000, 1);
        assert_eq!(rescale.apply(3), 3_000_000_000);
        assert_eq!(rescale.apply(i64::MAX), i64::MAX);
        assert_eq!(rescale.apply(i64::MIN), i64::MIN);
    }

    #[test]
    fn test_time_units_metadata() {
        let mut metadata = HashMap::new();
        assert_eq!(TimeRescale::from_metadata(&metadata, 1000).unwrap(), TimeRescale::identity());

        metadata.insert(TIME_UNITS_PER_SECOND_KEY.to_string(), "1000000".to_string());
        assert_eq!(
            TimeRescale::from_metadata(&metadata, 1000).unwrap(),
            TimeRescale::new(1000, 1_000_000)
        );

        metadata.insert(TIME_UNITS_PER_SECOND_KEY.to_string(), "0".to_string());
        assert!(matches!(
            TimeRescale::from_metadata(&metadata, 1000),
            Err(CodecError::Metadata(_))
        ));
    }

    #[test]
    fn test_identity_and_bucketization_from_metadata() {
        let metadata = HashMap::from([
            (NAME_KEY.to_string(), "temp".to_string()),
            (LABELS_KEY.to_string(), r#"{"room":"a1"}"#.to_string()),
            (BUCKET_SPAN_KEY.to_string(), "60".to_string()),
            (BUCKET_COUNT_KEY.to_string(), "10".to_string()),
            (LAST_BUCKET_KEY.to_string(), "600".to_string()),
        ]);

        let identity = identity_from_metadata(&metadata).unwrap().unwrap();
        assert_eq!(identity, Metadata::new("temp").with_label("room", "a1"));
        assert_eq!(
            bucketization_from_metadata(&metadata).unwrap(),
            Some(Bucketization { span: 60, count: 10, last_bucket: 600 })
        );
        assert_eq!(identity_from_metadata(&HashMap::new()).unwrap(), None);
    }
}
