// In: src/bridge/format.rs

//! Defines all wire-level names and constants of the geoseries stream format.
//! This is the single source of truth for field names, schema metadata keys
//! and conversion mode tags shared by the writer and the reader.

use std::fmt;
use std::str::FromStr;

use arrow::datatypes::Schema;
use serde::{Deserialize, Serialize};

use crate::error::CodecError;

//==================================================================================
// I. Stream Revision
//==================================================================================

/// The revision of the stream layout written by this crate.
pub const FORMAT_REVISION: &str = "3";

//==================================================================================
// II. Reserved Field Names
//==================================================================================

pub const CLASSNAME_KEY: &str = "classname";
pub const TIMESTAMP_KEY: &str = "timestamp";
pub const LATITUDE_KEY: &str = "latitude";
pub const LONGITUDE_KEY: &str = "longitude";
pub const ELEVATION_KEY: &str = "elevation";

pub const LONG_KEY: &str = "LONG";
pub const DOUBLE_KEY: &str = "DOUBLE";
pub const BOOLEAN_KEY: &str = "BOOLEAN";
pub const STRING_KEY: &str = "STRING";
pub const BYTES_KEY: &str = "BYTES";

/// Names no label or attribute key may take.
pub const RESERVED_FIELD_NAMES: [&str; 10] = [
    TIMESTAMP_KEY,
    LATITUDE_KEY,
    LONGITUDE_KEY,
    ELEVATION_KEY,
    LONG_KEY,
    DOUBLE_KEY,
    BOOLEAN_KEY,
    STRING_KEY,
    BYTES_KEY,
    CLASSNAME_KEY,
];

pub fn is_reserved(name: &str) -> bool {
    RESERVED_FIELD_NAMES.contains(&name)
}

//==================================================================================
// III. Schema & Field Metadata Keys
//==================================================================================

pub const FORMAT_REVISION_KEY: &str = "format_revision";
pub const TIME_UNITS_PER_SECOND_KEY: &str = "time_units_per_second";
pub const CONVERSION_MODE_KEY: &str = "conversion_mode";

// Single-series only
pub const NAME_KEY: &str = "name";
pub const LABELS_KEY: &str = "labels";
pub const ATTRIBUTES_KEY: &str = "attributes";
pub const BUCKET_SPAN_KEY: &str = "bucket_span";
pub const BUCKET_COUNT_KEY: &str = "bucket_count";
pub const LAST_BUCKET_KEY: &str = "last_bucket";

/// Field-level metadata key telling apart label and attribute columns.
pub const IDENTITY_ROLE_KEY: &str = "identity_role";
pub const LABEL_ROLE: &str = "label";
pub const ATTRIBUTE_ROLE: &str = "attribute";

/// Dictionary id of the classname field. Label and attribute dictionaries are
/// numbered from `FIRST_IDENTITY_DICT_ID` in field order.
pub const CLASSNAME_DICT_ID: i64 = 0;
pub const FIRST_IDENTITY_DICT_ID: i64 = 1;

//==================================================================================
// IV. Conversion Modes
//==================================================================================

/// The shape of the payload a stream was written from, recorded in the schema
/// metadata under [`CONVERSION_MODE_KEY`].
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConversionMode {
    /// One series. Identity lives in the schema metadata.
    Series,
    /// One encoder. Identity lives in the schema metadata.
    Encoder,
    /// A list of series and encoders. Identity lives in dictionary columns.
    List,
    /// A plain column map with caller-provided metadata.
    Pair,
}

impl Default for ConversionMode {
    fn default() -> Self {
        ConversionMode::Pair
    }
}

impl ConversionMode {
    pub const ALL: [ConversionMode; 4] = [
        ConversionMode::Series,
        ConversionMode::Encoder,
        ConversionMode::List,
        ConversionMode::Pair,
    ];

    pub fn as_tag(&self) -> &'static str {
        match self {
            ConversionMode::Series => "SERIES",
            ConversionMode::Encoder => "ENCODER",
            ConversionMode::List => "LIST",
            ConversionMode::Pair => "PAIR",
        }
    }
}

impl fmt::Display for ConversionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_tag())
    }
}

impl FromStr for ConversionMode {
    type Err = CodecError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        ConversionMode::ALL
            .into_iter()
            .find(|mode| mode.as_tag() == tag)
            .ok_or_else(|| CodecError::UnknownMode(tag.to_string()))
    }
}

//==================================================================================
// V. Analysis & Reporting Structs
//==================================================================================

/// A summary of an encoded stream, produced without rebuilding any payload.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct StreamInfo {
    /// The stream schema, including its metadata.
    pub schema: Schema,
    /// `None` for untagged streams or tags this crate does not know.
    pub mode: Option<ConversionMode>,
    pub batches: usize,
    pub rows: usize,
    pub total_size: usize,
}

impl StreamInfo {
    pub fn to_json(&self) -> Result<String, CodecError> {
        Ok(serde_json::to_string(self)?)
    }
}
