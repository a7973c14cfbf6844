// In: src/bridge/mod.rs

// ====================================================================================
// ARCHITECTURAL OVERVIEW: The Bridge Layer
// ====================================================================================
//
// The `bridge` is the public-facing API of the geoseries library. It ties the
// schema builder, the row projector, the batch writer and the readers together
// behind a converter registry, and is the boundary between in-memory series and
// Arrow IPC bytes.
//
// Data Flow (Encoding):
//
//   1. [Stateful Facade (Codec)]           -> Receives a `Payload`
//         |
//         `-> asks the `ConverterRegistry` for a converter accepting it
//
//   2. [Converter::write]                  -> One per conversion mode
//         |
//         `-> a. `SchemaBuilder` derives fields, dictionaries and metadata
//         |
//         `-> b. `project_row` maps every (identity, point) onto the fields
//         |
//         `-> c. `BatchWriter` flushes a record batch every `rows_per_batch` rows
//
//   3. [Arrow StreamWriter]                -> Schema, dictionaries once, batches, EOS
//
//
// Data Flow (Decoding):
//
//   1. [BatchReader]                       -> Reads the schema and its metadata
//         |
//         `-> the mode tag (or `force_pair`) picks the converter
//
//   2. [Converter::read]                   -> Validates field types, then walks batches
//         |
//         `-> a. rescales ticks to this process's time unit
//         |
//         `-> b. rebuilds a Series, an Encoder, a list of Encoders or a column map
//
// ====================================================================================
pub mod codec;
pub mod format;
pub mod stateless_api;

// --- High-Level Stateful API ---
pub use codec::{Codec, DecodeOptions};

// --- Low-Level Stateless API ---
pub use stateless_api::{decode, decode_with, encode, encode_columns, inspect};

// --- Format Constants and Structs ---
pub use format::{ConversionMode, StreamInfo};
