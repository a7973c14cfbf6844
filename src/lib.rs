//! This file is the root of the `geoseries` Rust crate.
//!
//! Its responsibilities are strictly limited to declaring the top-level
//! modules of the library and re-exporting the types most callers need.
//!
//! The crate converts geo time series (named, typed series and heterogeneous
//! encoders of timestamped, optionally located points) to and from Arrow IPC
//! streams. See [`bridge`] for the data flow.

//==================================================================================
// 0. Constants
//==================================================================================
/// The crate version, automatically set from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
//==================================================================================
// 1. Module Declarations
//==================================================================================
#[macro_use]
pub mod observability; // Make macros available throughout the crate

pub mod bridge;
pub mod config;
pub mod convert;
pub mod error;
pub mod model;
pub mod reader;
pub mod schema;
pub mod writer;

//==================================================================================
// 2. Re-exports
//==================================================================================
pub use bridge::{Codec, DecodeOptions, StreamInfo};
pub use config::{CodecConfig, EmptySeriesPolicy};
pub use convert::{ConversionMode, Payload};
pub use error::CodecError;
pub use model::{Column, ColumnMap, Encoder, Input, Metadata, Pair, Series, Value};
