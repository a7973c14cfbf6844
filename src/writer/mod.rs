//! Write path: row projection and batched IPC output.
//!
//! The `write_*` functions drive a [`BatchWriter`] with the rows of one
//! payload, against a schema previously derived by
//! [`crate::schema::SchemaBuilder`].

pub mod batch_writer;
pub mod projector;

use std::io::Write;
use std::num::NonZeroUsize;

pub use batch_writer::BatchWriter;
pub use projector::{project_row, Cell};

use crate::error::CodecError;
use crate::model::{Column, ColumnMap, Encoder, GeoCodec, Input, PointView, Series};
use crate::schema::SeriesSchema;

/// `0` means "everything in one batch". A zero-row input still gets a valid
/// (unused) batch size.
pub fn resolve_rows_per_batch(configured: usize, total_rows: usize) -> NonZeroUsize {
    let rows = if configured == 0 { total_rows } else { configured };
    NonZeroUsize::new(rows).unwrap_or(NonZeroUsize::MIN)
}

/// Writes a heterogeneous input list. An empty input contributes one
/// identity-only row.
pub fn write_inputs<W: Write>(
    sink: W,
    schema: &SeriesSchema,
    inputs: &[Input],
    rows_per_batch: usize,
    geo: &dyn GeoCodec,
) -> Result<W, CodecError> {
    let total: usize = inputs.iter().map(|i| i.len().max(1)).sum();
    let batch = resolve_rows_per_batch(rows_per_batch, total);
    let mut writer = BatchWriter::try_new(sink, schema, batch)?;
    let mut cells = Vec::with_capacity(schema.fields().len());

    for input in inputs {
        let identity = input.identity();
        if input.is_empty() {
            project_row(schema.fields(), identity, None, geo, &mut cells);
            writer.write_row(&cells)?;
            continue;
        }
        for point in input.points() {
            project_row(schema.fields(), identity, Some(point), geo, &mut cells);
            writer.write_row(&cells)?;
        }
    }

    log::info!("Wrote {} rows for {} inputs", writer.rows_written(), inputs.len());
    writer.finish()
}

/// Writes one series. Identity is already in the schema metadata; an empty
/// series is written as one all-null row.
pub fn write_series<W: Write>(
    sink: W,
    schema: &SeriesSchema,
    series: &Series,
    rows_per_batch: usize,
    geo: &dyn GeoCodec,
) -> Result<W, CodecError> {
    write_points(sink, schema, series.points().iter().map(|p| p.view()), rows_per_batch, geo)
}

/// Writes one encoder, with the same empty-input rule as [`write_series`].
pub fn write_encoder<W: Write>(
    sink: W,
    schema: &SeriesSchema,
    encoder: &Encoder,
    rows_per_batch: usize,
    geo: &dyn GeoCodec,
) -> Result<W, CodecError> {
    write_points(sink, schema, encoder.points().iter().map(|p| p.view()), rows_per_batch, geo)
}

fn write_points<'a, W: Write>(
    sink: W,
    schema: &SeriesSchema,
    points: impl ExactSizeIterator<Item = PointView<'a>>,
    rows_per_batch: usize,
    geo: &dyn GeoCodec,
) -> Result<W, CodecError> {
    let total = points.len();
    let batch = resolve_rows_per_batch(rows_per_batch, total.max(1));
    let mut writer = BatchWriter::try_new(sink, schema, batch)?;
    let mut cells = Vec::with_capacity(schema.fields().len());
    if total == 0 {
        project_row(schema.fields(), None, None, geo, &mut cells);
        writer.write_row(&cells)?;
    }
    for point in points {
        project_row(schema.fields(), None, Some(point), geo, &mut cells);
        writer.write_row(&cells)?;
    }
    writer.finish()
}

/// Writes a column map. Non-empty columns must all have the same length;
/// empty columns are written as all-null.
pub fn write_columns<W: Write>(
    sink: W,
    schema: &SeriesSchema,
    columns: &ColumnMap,
    rows_per_batch: usize,
) -> Result<W, CodecError> {
    let rows = check_shape(columns)?;
    let batch = resolve_rows_per_batch(rows_per_batch, rows);
    let mut writer = BatchWriter::try_new(sink, schema, batch)?;
    let mut cells = Vec::with_capacity(columns.len());

    for row in 0..rows {
        cells.clear();
        cells.extend(columns.values().map(|column| column_cell(column, row)));
        writer.write_row(&cells)?;
    }
    writer.finish()
}

/// Common row count of the non-empty columns.
fn check_shape(columns: &ColumnMap) -> Result<usize, CodecError> {
    let mut expected: Option<usize> = None;
    for (name, column) in columns {
        if column.is_empty() {
            continue;
        }
        match expected {
            None => expected = Some(column.len()),
            Some(rows) if rows != column.len() => {
                return Err(CodecError::ShapeMismatch {
                    column: name.clone(),
                    expected: rows,
                    found: column.len(),
                })
            }
            Some(_) => {}
        }
    }
    Ok(expected.unwrap_or(0))
}

fn column_cell(column: &Column, row: usize) -> Cell<'_> {
    match column {
        Column::Integer(v) => v.get(row).copied().flatten().map_or(Cell::Null, Cell::Long),
        Column::Float(v) => v.get(row).copied().flatten().map_or(Cell::Null, Cell::Double),
        Column::Boolean(v) => v.get(row).copied().flatten().map_or(Cell::Null, Cell::Boolean),
        Column::Text(v) => match v.get(row) {
            Some(Some(s)) => Cell::Text(s),
            _ => Cell::Null,
        },
        Column::Binary(v) => match v.get(row) {
            Some(Some(b)) => Cell::Bytes(b),
            _ => Cell::Null,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_rows_per_batch() {
        assert_eq!(resolve_rows_per_batch(0, 42).get(), 42);
        assert_eq!(resolve_rows_per_batch(0, 0).get(), 1);
        assert_eq!(resolve_rows_per_batch(7, 42).get(), 7);
    }

    #[test]
    fn test_shape_ignores_empty_columns() {
        let mut columns = ColumnMap::new();
        columns.insert("a".into(), Column::Integer(vec![Some(1), None]));
        columns.insert("b".into(), Column::Text(vec![]));
        assert_eq!(check_shape(&columns).unwrap(), 2);

        columns.insert("c".into(), Column::Boolean(vec![Some(true)]));
        let err = check_shape(&columns).unwrap_err();
        assert!(matches!(err, CodecError::ShapeMismatch { expected: 2, found: 1, .. }));
    }
}
