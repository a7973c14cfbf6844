// In: src/error.rs

//! This module defines the single, unified error type for the entire geoseries
//! library. It uses the `thiserror` crate to provide ergonomic, context-aware
//! error handling.
//!
//! Every failure surfaces synchronously to the caller of an encode or decode
//! call. Nothing is retried: the stream format does not tolerate partial or
//! interleaved writes.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CodecError {
    // =========================================================================
    // === Schema Construction Errors
    // =========================================================================
    #[error("Cannot build a schema from an empty input collection")]
    EmptyInput,

    #[error("Label or attribute key '{0}' is reserved by the serialization format, please rename it")]
    ReservedName(String),

    #[error("Series already has type {existing}, cannot switch to {attempted}")]
    TypeConflict { existing: String, attempted: String },

    #[error("Series '{0}' has data points but no defined value type")]
    UndefinedType(String),

    #[error("Series '{0}' has no data points and the empty-series policy rejects it")]
    EmptySeries(String),

    // =========================================================================
    // === Dictionary Errors
    // =========================================================================
    #[error("Value '{value}' is not in the prebuilt dictionary of field '{field}'")]
    UnknownDictionaryValue { field: String, value: String },

    #[error("Dictionary of field '{field}' holds {cardinality} values, more than a 32-bit index can address")]
    DictionaryTooWide { field: String, cardinality: usize },

    // =========================================================================
    // === Decode Type Errors
    // =========================================================================
    #[error("Unsupported data type for this operation: {0}")]
    UnsupportedType(String),

    #[error("Signedness mismatch on integer field '{field}': {data_type} is not a signed integer")]
    SignednessMismatch { field: String, data_type: String },

    #[error("Dictionary of field '{field}' must hold Utf8 values, found {value_type}")]
    NonStringDictionary { field: String, value_type: String },

    // =========================================================================
    // === Row Corruption Errors
    // =========================================================================
    #[error("Row {row} carries more than one non-null value field ({kinds})")]
    AmbiguousValue { row: usize, kinds: String },

    #[error("Row {row} carries no value")]
    MissingValue { row: usize },

    #[error("Row {row} has no timestamp")]
    MissingTimestamp { row: usize },

    // =========================================================================
    // === Shape Errors
    // =========================================================================
    #[error("Column '{column}' has {found} rows, expected {expected}")]
    ShapeMismatch {
        column: String,
        expected: usize,
        found: usize,
    },

    // =========================================================================
    // === Stream & Registry Errors
    // =========================================================================
    #[error("Invalid stream metadata: {0}")]
    Metadata(String),

    #[error("Unknown conversion mode: {0}")]
    UnknownMode(String),

    #[error("No converter can handle this payload: {0}")]
    NotConvertible(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Internal logic error (this is a bug): {0}")]
    Internal(String),

    // =========================================================================
    // === External Error Wrappers (Using #[from] for automatic conversion)
    // =========================================================================
    /// An error originating from the Arrow library.
    #[error("Arrow operation failed: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// An error originating from the underlying I/O subsystem.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An error from the Serde JSON library, typically while (de)serializing
    /// identity metadata or configuration.
    #[error("Serde JSON error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    #[error("Base64 decoding error: {0}")]
    Base64(#[from] base64::DecodeError),
}

pub type Result<T, E = CodecError> = std::result::Result<T, E>;
