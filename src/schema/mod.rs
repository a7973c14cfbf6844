//! Schema derivation: field descriptors, dictionary tables and the builder
//! that turns a payload into a stream schema.

pub mod builder;
pub mod dictionary;
pub mod field;

pub use crate::bridge::format::RESERVED_FIELD_NAMES;
pub use builder::{SchemaBuilder, SeriesSchema};
pub use dictionary::{Dictionary, DictionaryBuilder, DictionaryKeys, IndexWidth};
pub use field::{FieldDescriptor, FieldRole};
