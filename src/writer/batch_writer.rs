// In: src/writer/batch_writer.rs

//! Accumulates projected rows into per-field Arrow builders and flushes a
//! record batch into an IPC stream every `rows_per_batch` rows.

use std::io::Write;
use std::num::NonZeroUsize;
use std::sync::Arc;

use arrow::array::{
    ArrayRef, BinaryBuilder, BooleanBuilder, Float32Builder, Float64Builder, Int64Builder,
    StringBuilder,
};
use arrow::datatypes::{DataType, SchemaRef};
use arrow::ipc::writer::StreamWriter;
use arrow::record_batch::{RecordBatch, RecordBatchOptions};

use super::projector::Cell;
use crate::error::CodecError;
use crate::schema::{Dictionary, DictionaryKeys, FieldDescriptor, SeriesSchema};

/// Upper bound on rows reserved up front in each builder.
const MAX_PREALLOCATED_ROWS: usize = 8192;

#[derive(Debug)]
enum ColumnBuilder {
    Int64(Int64Builder),
    Float32(Float32Builder),
    Float64(Float64Builder),
    Boolean(BooleanBuilder),
    Utf8(StringBuilder),
    Binary(BinaryBuilder),
    Dictionary {
        dictionary: Arc<Dictionary>,
        keys: DictionaryKeys,
    },
}

impl ColumnBuilder {
    fn for_field(field: &FieldDescriptor, capacity: usize) -> Result<Self, CodecError> {
        if let Some(dictionary) = field.dictionary() {
            return Ok(ColumnBuilder::Dictionary {
                keys: dictionary.key_builder(capacity),
                dictionary: Arc::clone(dictionary),
            });
        }
        Ok(match field.data_type() {
            DataType::Int64 => ColumnBuilder::Int64(Int64Builder::with_capacity(capacity)),
            DataType::Float32 => ColumnBuilder::Float32(Float32Builder::with_capacity(capacity)),
            DataType::Float64 => ColumnBuilder::Float64(Float64Builder::with_capacity(capacity)),
            DataType::Boolean => ColumnBuilder::Boolean(BooleanBuilder::with_capacity(capacity)),
            DataType::Utf8 => ColumnBuilder::Utf8(StringBuilder::new()),
            DataType::Binary => ColumnBuilder::Binary(BinaryBuilder::new()),
            other => {
                return Err(CodecError::UnsupportedType(format!(
                    "cannot write field '{}' of type {other}",
                    field.name()
                )))
            }
        })
    }

    fn append(&mut self, cell: &Cell<'_>, field: &str) -> Result<(), CodecError> {
        match (self, cell) {
            (ColumnBuilder::Int64(b), Cell::Long(v)) => b.append_value(*v),
            (ColumnBuilder::Int64(b), Cell::Null) => b.append_null(),
            (ColumnBuilder::Float32(b), Cell::Float(v)) => b.append_value(*v),
            (ColumnBuilder::Float32(b), Cell::Null) => b.append_null(),
            (ColumnBuilder::Float64(b), Cell::Double(v)) => b.append_value(*v),
            (ColumnBuilder::Float64(b), Cell::Null) => b.append_null(),
            (ColumnBuilder::Boolean(b), Cell::Boolean(v)) => b.append_value(*v),
            (ColumnBuilder::Boolean(b), Cell::Null) => b.append_null(),
            (ColumnBuilder::Utf8(b), Cell::Text(v)) => b.append_value(v),
            (ColumnBuilder::Utf8(b), Cell::Null) => b.append_null(),
            (ColumnBuilder::Binary(b), Cell::Bytes(v)) => b.append_value(v),
            (ColumnBuilder::Binary(b), Cell::Null) => b.append_null(),
            (ColumnBuilder::Dictionary { dictionary, keys }, Cell::Text(v)) => {
                keys.append(dictionary, Some(*v))?
            }
            (ColumnBuilder::Dictionary { dictionary, keys }, Cell::Null) => {
                keys.append(dictionary, None)?
            }
            (_, cell) => {
                return Err(CodecError::Internal(format!(
                    "cell {cell:?} does not fit field '{field}'"
                )))
            }
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<ArrayRef, CodecError> {
        let array: ArrayRef = match self {
            ColumnBuilder::Int64(b) => Arc::new(b.finish()),
            ColumnBuilder::Float32(b) => Arc::new(b.finish()),
            ColumnBuilder::Float64(b) => Arc::new(b.finish()),
            ColumnBuilder::Boolean(b) => Arc::new(b.finish()),
            ColumnBuilder::Utf8(b) => Arc::new(b.finish()),
            ColumnBuilder::Binary(b) => Arc::new(b.finish()),
            ColumnBuilder::Dictionary { dictionary, keys } => keys.finish(dictionary)?,
        };
        Ok(array)
    }
}

/// Streams rows of one schema into an Arrow IPC stream.
///
/// A batch is flushed as soon as it holds `rows_per_batch` rows; the remainder
/// goes out on [`BatchWriter::finish`]. Empty batches are never written.
pub struct BatchWriter<W: Write> {
    stream: StreamWriter<W>,
    schema: SchemaRef,
    names: Vec<String>,
    columns: Vec<ColumnBuilder>,
    rows_per_batch: usize,
    pending: usize,
    rows_written: usize,
    batches_written: usize,
}

impl<W: Write> BatchWriter<W> {
    /// Writes the schema message, including its metadata, to `sink`.
    pub fn try_new(
        sink: W,
        schema: &SeriesSchema,
        rows_per_batch: NonZeroUsize,
    ) -> Result<Self, CodecError> {
        let arrow_schema = schema.to_arrow();
        let capacity = rows_per_batch.get().min(MAX_PREALLOCATED_ROWS);
        let columns = schema
            .fields()
            .iter()
            .map(|f| ColumnBuilder::for_field(f, capacity))
            .collect::<Result<Vec<_>, _>>()?;
        let stream = StreamWriter::try_new(sink, &arrow_schema)?;

        Ok(Self {
            stream,
            schema: arrow_schema,
            names: schema.fields().iter().map(|f| f.name().to_string()).collect(),
            columns,
            rows_per_batch: rows_per_batch.get(),
            pending: 0,
            rows_written: 0,
            batches_written: 0,
        })
    }

    /// Appends one row. `cells` must hold exactly one cell per field.
    pub fn write_row(&mut self, cells: &[Cell<'_>]) -> Result<(), CodecError> {
        if cells.len() != self.columns.len() {
            return Err(CodecError::Internal(format!(
                "row has {} cells for {} fields",
                cells.len(),
                self.columns.len()
            )));
        }
        for ((column, cell), name) in self.columns.iter_mut().zip(cells).zip(&self.names) {
            column.append(cell, name)?;
        }
        self.pending += 1;
        if self.pending == self.rows_per_batch {
            self.flush()?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), CodecError> {
        if self.pending == 0 {
            return Ok(());
        }
        let arrays = self
            .columns
            .iter_mut()
            .map(ColumnBuilder::finish)
            .collect::<Result<Vec<_>, _>>()?;
        let options = RecordBatchOptions::new().with_row_count(Some(self.pending));
        let batch = RecordBatch::try_new_with_options(Arc::clone(&self.schema), arrays, &options)?;
        self.stream.write(&batch)?;

        log_metric!("event"="flush_batch", "batch"=&self.batches_written, "rows"=&self.pending);
        self.rows_written += self.pending;
        self.batches_written += 1;
        self.pending = 0;
        Ok(())
    }

    pub fn rows_written(&self) -> usize {
        self.rows_written + self.pending
    }

    /// Flushes the partial batch, writes the end-of-stream marker and hands
    /// back the sink.
    pub fn finish(mut self) -> Result<W, CodecError> {
        self.flush()?;
        self.stream.finish()?;
        log::debug!(
            "Stream complete: {} rows in {} batches",
            self.rows_written,
            self.batches_written
        );
        Ok(self.stream.into_inner()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CodecConfig;
    use crate::model::{Column, ColumnMap};
    use crate::schema::SchemaBuilder;
    use arrow::ipc::reader::StreamReader;
    use std::collections::HashMap;
    use std::io::Cursor;

    fn two_column_schema() -> SeriesSchema {
        let mut columns = ColumnMap::new();
        columns.insert("n".to_string(), Column::Integer(vec![]));
        columns.insert("s".to_string(), Column::Text(vec![]));
        SchemaBuilder::new(&CodecConfig::default())
            .for_columns(&HashMap::new(), &columns)
            .unwrap()
    }

    #[test]
    fn test_batches_split_on_row_count() {
        // --- ARRANGE ---
        let schema = two_column_schema();
        let mut writer =
            BatchWriter::try_new(Vec::new(), &schema, NonZeroUsize::new(3).unwrap()).unwrap();

        // --- ACT ---
        for i in 0..7 {
            writer.write_row(&[Cell::Long(i), Cell::Text("x")]).unwrap();
        }
        let bytes = writer.finish().unwrap();

        // --- ASSERT ---
        let reader = StreamReader::try_new(Cursor::new(bytes), None).unwrap();
        let sizes: Vec<usize> = reader.map(|b| b.unwrap().num_rows()).collect();
        assert_eq!(sizes, vec![3, 3, 1]);
    }

    #[test]
    fn test_no_rows_writes_no_batches() {
        let schema = two_column_schema();
        let rows_per_batch = NonZeroUsize::new(5).unwrap();
        let writer = BatchWriter::try_new(Vec::new(), &schema, rows_per_batch).unwrap();
        let bytes = writer.finish().unwrap();

        let reader = StreamReader::try_new(Cursor::new(bytes), None).unwrap();
        assert_eq!(reader.schema().fields().len(), 2);
        assert_eq!(reader.count(), 0);
    }

    #[test]
    fn test_mismatched_cell_is_an_internal_error() {
        let schema = two_column_schema();
        let mut writer =
            BatchWriter::try_new(Vec::new(), &schema, NonZeroUsize::new(5).unwrap()).unwrap();
        let result = writer.write_row(&[Cell::Text("oops"), Cell::Text("x")]);
        assert!(matches!(result, Err(CodecError::Internal(_))));
    }
}
