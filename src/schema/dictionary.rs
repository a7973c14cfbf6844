// In: src/schema/dictionary.rs

//! Two-phase dictionary tables for identity columns.
//!
//! A [`DictionaryBuilder`] collects the distinct strings of a field while the
//! schema is derived. Finishing it yields an immutable [`Dictionary`] whose
//! values array is shared by every batch of the stream, so the IPC writer
//! emits each dictionary once.

use std::sync::Arc;

use arrow::array::{ArrayRef, DictionaryArray, Int16Builder, Int32Builder, Int8Builder, StringArray};
use arrow::datatypes::{DataType, Int16Type, Int32Type, Int8Type};
use hashbrown::HashMap;
use num_traits::{Bounded, ToPrimitive};

use crate::error::CodecError;

/// Number of distinct codes a signed key type can address (0..=MAX).
fn addressable<T: Bounded + ToPrimitive>() -> usize {
    T::max_value().to_usize().map_or(0, |max| max + 1)
}

/// Width of the signed integer keys of a dictionary field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum IndexWidth {
    Int8,
    Int16,
    Int32,
}

impl IndexWidth {
    /// The narrowest width whose positive range holds `cardinality` codes.
    pub fn for_cardinality(cardinality: usize) -> Option<Self> {
        if cardinality <= addressable::<i8>() {
            Some(IndexWidth::Int8)
        } else if cardinality <= addressable::<i16>() {
            Some(IndexWidth::Int16)
        } else if cardinality <= addressable::<i32>() {
            Some(IndexWidth::Int32)
        } else {
            None
        }
    }

    pub fn key_type(&self) -> DataType {
        match self {
            IndexWidth::Int8 => DataType::Int8,
            IndexWidth::Int16 => DataType::Int16,
            IndexWidth::Int32 => DataType::Int32,
        }
    }

    /// `Dictionary(<key>, Utf8)`.
    pub fn dictionary_type(&self) -> DataType {
        DataType::Dictionary(Box::new(self.key_type()), Box::new(DataType::Utf8))
    }
}

//==================================================================================
// I. Build Phase
//==================================================================================

/// Insertion-ordered set of distinct strings. Codes are assigned densely from 0.
#[derive(Debug, Clone)]
pub struct DictionaryBuilder {
    id: i64,
    values: Vec<String>,
    codes: HashMap<String, usize>,
}

impl DictionaryBuilder {
    pub fn new(id: i64) -> Self {
        Self {
            id,
            values: Vec::new(),
            codes: HashMap::new(),
        }
    }

    /// Adds `value` if unseen and returns its code.
    pub fn insert(&mut self, value: &str) -> usize {
        if let Some(&code) = self.codes.get(value) {
            return code;
        }
        let code = self.values.len();
        self.values.push(value.to_string());
        self.codes.insert(value.to_string(), code);
        code
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Closes the table. No value can be added afterwards.
    pub fn finish(self, field: &str) -> Result<Dictionary, CodecError> {
        let width = IndexWidth::for_cardinality(self.values.len()).ok_or_else(|| {
            CodecError::DictionaryTooWide {
                field: field.to_string(),
                cardinality: self.values.len(),
            }
        })?;
        let values: ArrayRef = Arc::new(StringArray::from_iter_values(self.values.iter()));
        Ok(Dictionary {
            id: self.id,
            field: field.to_string(),
            width,
            codes: self.codes,
            values,
        })
    }
}

//==================================================================================
// II. Write Phase
//==================================================================================

/// A closed dictionary, ready to encode rows.
#[derive(Debug, Clone)]
pub struct Dictionary {
    id: i64,
    field: String,
    width: IndexWidth,
    codes: HashMap<String, usize>,
    values: ArrayRef,
}

impl Dictionary {
    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn width(&self) -> IndexWidth {
        self.width
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn code(&self, value: &str) -> Option<usize> {
        self.codes.get(value).copied()
    }

    /// The Utf8 values array. Every batch references this same array.
    pub fn values(&self) -> &ArrayRef {
        &self.values
    }

    /// Starts a key column for one batch.
    pub fn key_builder(&self, capacity: usize) -> DictionaryKeys {
        let keys = match self.width {
            IndexWidth::Int8 => KeyBuffer::Int8(Int8Builder::with_capacity(capacity)),
            IndexWidth::Int16 => KeyBuffer::Int16(Int16Builder::with_capacity(capacity)),
            IndexWidth::Int32 => KeyBuffer::Int32(Int32Builder::with_capacity(capacity)),
        };
        DictionaryKeys { keys }
    }

    fn unknown(&self, value: &str) -> CodecError {
        CodecError::UnknownDictionaryValue {
            field: self.field.clone(),
            value: value.to_string(),
        }
    }
}

#[derive(Debug)]
enum KeyBuffer {
    Int8(Int8Builder),
    Int16(Int16Builder),
    Int32(Int32Builder),
}

/// Key column of one batch, encoded against a closed [`Dictionary`].
#[derive(Debug)]
pub struct DictionaryKeys {
    keys: KeyBuffer,
}

impl DictionaryKeys {
    /// Appends the code of `value`, or a null key for `None`.
    pub fn append(
        &mut self,
        dictionary: &Dictionary,
        value: Option<&str>,
    ) -> Result<(), CodecError> {
        let Some(value) = value else {
            match &mut self.keys {
                KeyBuffer::Int8(b) => b.append_null(),
                KeyBuffer::Int16(b) => b.append_null(),
                KeyBuffer::Int32(b) => b.append_null(),
            }
            return Ok(());
        };

        let code = dictionary.code(value).ok_or_else(|| dictionary.unknown(value))?;
        let overflow = || CodecError::Internal(format!("code {code} exceeds its key width"));
        match &mut self.keys {
            KeyBuffer::Int8(b) => b.append_value(i8::try_from(code).map_err(|_| overflow())?),
            KeyBuffer::Int16(b) => b.append_value(i16::try_from(code).map_err(|_| overflow())?),
            KeyBuffer::Int32(b) => b.append_value(i32::try_from(code).map_err(|_| overflow())?),
        }
        Ok(())
    }

    /// Emits the batch column and resets the keys for the next batch.
    pub fn finish(&mut self, dictionary: &Dictionary) -> Result<ArrayRef, CodecError> {
        let values = Arc::clone(dictionary.values());
        let array: ArrayRef = match &mut self.keys {
            KeyBuffer::Int8(b) => {
                Arc::new(DictionaryArray::<Int8Type>::try_new(b.finish(), values)?)
            }
            KeyBuffer::Int16(b) => {
                Arc::new(DictionaryArray::<Int16Type>::try_new(b.finish(), values)?)
            }
            KeyBuffer::Int32(b) => {
                Arc::new(DictionaryArray::<Int32Type>::try_new(b.finish(), values)?)
            }
        };
        Ok(array)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Array, AsArray};

    #[test]
    fn test_width_boundaries() {
        assert_eq!(IndexWidth::for_cardinality(0), Some(IndexWidth::Int8));
        assert_eq!(IndexWidth::for_cardinality(128), Some(IndexWidth::Int8));
        assert_eq!(IndexWidth::for_cardinality(129), Some(IndexWidth::Int16));
        assert_eq!(IndexWidth::for_cardinality(32_768), Some(IndexWidth::Int16));
        assert_eq!(IndexWidth::for_cardinality(32_769), Some(IndexWidth::Int32));
    }

    #[test]
    fn test_codes_follow_first_insertion() {
        let mut builder = DictionaryBuilder::new(1);
        assert_eq!(builder.insert("paris"), 0);
        assert_eq!(builder.insert("lyon"), 1);
        assert_eq!(builder.insert("paris"), 0);
        assert_eq!(builder.len(), 2);

        let dict = builder.finish("city").unwrap();
        assert_eq!(dict.code("lyon"), Some(1));
        assert_eq!(dict.code("nice"), None);
        assert_eq!(dict.width(), IndexWidth::Int8);
    }

    #[test]
    fn test_unknown_value_is_fatal() {
        let mut builder = DictionaryBuilder::new(0);
        builder.insert("a");
        let dict = builder.finish("classname").unwrap();

        let mut keys = dict.key_builder(2);
        keys.append(&dict, Some("a")).unwrap();
        let err = keys.append(&dict, Some("b")).unwrap_err();
        assert!(matches!(
            err,
            CodecError::UnknownDictionaryValue { ref value, .. } if value == "b"
        ));
    }

    #[test]
    fn test_batches_share_the_values_array() {
        let mut builder = DictionaryBuilder::new(3);
        for v in ["x", "y", "z"] {
            builder.insert(v);
        }
        let dict = builder.finish("tag").unwrap();
        let mut keys = dict.key_builder(4);

        keys.append(&dict, Some("z")).unwrap();
        keys.append(&dict, None).unwrap();
        let first = keys.finish(&dict).unwrap();
        keys.append(&dict, Some("x")).unwrap();
        let second = keys.finish(&dict).unwrap();

        let first = first.as_dictionary::<Int8Type>();
        let second = second.as_dictionary::<Int8Type>();
        assert_eq!(first.len(), 2);
        assert_eq!(first.keys().value(0), 2);
        assert!(first.is_null(1));
        assert_eq!(second.len(), 1);
        assert!(Arc::ptr_eq(first.values(), second.values()));
    }
}
