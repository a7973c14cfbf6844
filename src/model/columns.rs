// In: src/model/columns.rs

//! The generic column map used by the PAIR conversion mode.

use std::collections::HashMap;

use arrow::datatypes::DataType;
use indexmap::IndexMap;

/// A named, nullable column of one of the five generic kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Integer(Vec<Option<i64>>),
    Float(Vec<Option<f64>>),
    Boolean(Vec<Option<bool>>),
    Text(Vec<Option<String>>),
    Binary(Vec<Option<Vec<u8>>>),
}

impl Column {
    pub fn len(&self) -> usize {
        match self {
            Column::Integer(v) => v.len(),
            Column::Float(v) => v.len(),
            Column::Boolean(v) => v.len(),
            Column::Text(v) => v.len(),
            Column::Binary(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The Arrow type this column is written as.
    pub fn data_type(&self) -> DataType {
        match self {
            Column::Integer(_) => DataType::Int64,
            Column::Float(_) => DataType::Float64,
            Column::Boolean(_) => DataType::Boolean,
            Column::Text(_) => DataType::Utf8,
            Column::Binary(_) => DataType::Binary,
        }
    }
}

/// Columns in field order.
pub type ColumnMap = IndexMap<String, Column>;

/// A column map plus free-form stream metadata.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pair {
    pub metadata: HashMap<String, String>,
    pub columns: ColumnMap,
}

impl Pair {
    pub fn new(metadata: HashMap<String, String>, columns: ColumnMap) -> Self {
        Self { metadata, columns }
    }
}
