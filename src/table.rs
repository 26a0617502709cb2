//! In-memory tables
//!
//! A [`Table`] is a named, immutable Arrow `RecordBatch`. Every transformation
//! in the pipeline takes tables by reference and returns a new one.

use crate::error::{Error, Result};
use arrow::array::{Array, ArrayRef, BooleanArray, Int64Array, StringArray, UInt32Array};
use arrow::compute;
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::{RecordBatch, RecordBatchOptions};
use arrow::util::display::array_value_to_string;
use std::sync::Arc;

/// A named, immutable columnar table
#[derive(Debug, Clone)]
pub struct Table {
    name: String,
    batch: RecordBatch,
}

impl Table {
    /// Wrap a record batch
    pub fn new(name: impl Into<String>, batch: RecordBatch) -> Self {
        Self {
            name: name.into(),
            batch,
        }
    }

    /// Create a table with a schema and no rows
    pub fn empty(name: impl Into<String>, schema: SchemaRef) -> Self {
        Self::new(name, RecordBatch::new_empty(schema))
    }

    /// Concatenate batches sharing `schema` into one table
    pub fn from_batches(
        name: impl Into<String>,
        schema: SchemaRef,
        batches: &[RecordBatch],
    ) -> Result<Self> {
        let batch = compute::concat_batches(&schema, batches)?;
        Ok(Self::new(name, batch))
    }

    /// Build a table from named columns, all of the same length
    pub fn from_columns(name: impl Into<String>, columns: Vec<(Field, ArrayRef)>) -> Result<Self> {
        let name = name.into();
        let num_rows = columns.first().map_or(0, |(_, array)| array.len());
        let (fields, arrays): (Vec<Field>, Vec<ArrayRef>) = columns.into_iter().unzip();
        let schema = Arc::new(Schema::new(fields));
        let options = RecordBatchOptions::new().with_row_count(Some(num_rows));
        let batch = RecordBatch::try_new_with_options(schema, arrays, &options)?;
        Ok(Self::new(name, batch))
    }

    /// Table name, used in error messages and as the output directory
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> SchemaRef {
        self.batch.schema()
    }

    pub fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    pub fn into_batch(self) -> RecordBatch {
        self.batch
    }

    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    pub fn num_columns(&self) -> usize {
        self.batch.num_columns()
    }

    pub fn is_empty(&self) -> bool {
        self.batch.num_rows() == 0
    }

    /// Column names in schema order
    pub fn column_names(&self) -> Vec<String> {
        self.batch
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect()
    }

    /// Whether the table has a column with this name
    pub fn has_column(&self, name: &str) -> bool {
        self.batch.schema().index_of(name).is_ok()
    }

    /// Look up a column by name
    ///
    /// A missing column is schema drift and always an error.
    pub fn column(&self, name: &str) -> Result<&ArrayRef> {
        self.batch
            .column_by_name(name)
            .ok_or_else(|| Error::missing_column(&self.name, name))
    }

    /// Look up a field by name
    pub fn field(&self, name: &str) -> Result<Field> {
        self.batch
            .schema()
            .field_with_name(name)
            .cloned()
            .map_err(|_| Error::missing_column(&self.name, name))
    }

    /// Look up a Utf8 column
    pub fn string_column(&self, name: &str) -> Result<&StringArray> {
        let column = self.column(name)?;
        column
            .as_any()
            .downcast_ref::<StringArray>()
            .ok_or_else(|| self.type_error(name, &DataType::Utf8, column.data_type()))
    }

    /// Look up an Int64 column
    pub fn i64_column(&self, name: &str) -> Result<&Int64Array> {
        let column = self.column(name)?;
        column
            .as_any()
            .downcast_ref::<Int64Array>()
            .ok_or_else(|| self.type_error(name, &DataType::Int64, column.data_type()))
    }

    /// Keep the rows where `mask` is true
    pub fn filter(&self, mask: &BooleanArray) -> Result<Self> {
        let batch = compute::filter_record_batch(&self.batch, mask)?;
        Ok(Self::new(&self.name, batch))
    }

    /// Gather rows by index, in index order
    pub fn take(&self, indices: &UInt32Array) -> Result<Self> {
        let columns = self
            .batch
            .columns()
            .iter()
            .map(|column| compute::take(column.as_ref(), indices, None))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let options = RecordBatchOptions::new().with_row_count(Some(indices.len()));
        let batch = RecordBatch::try_new_with_options(self.batch.schema(), columns, &options)?;
        Ok(Self::new(&self.name, batch))
    }

    /// Append columns (or replace same-named ones) keeping row count
    pub fn with_columns(&self, columns: Vec<(Field, ArrayRef)>) -> Result<Self> {
        let schema = self.batch.schema();
        let mut fields: Vec<Field> = schema.fields().iter().map(|f| f.as_ref().clone()).collect();
        let mut arrays: Vec<ArrayRef> = self.batch.columns().to_vec();

        for (field, array) in columns {
            if let Some(idx) = fields.iter().position(|f| f.name() == field.name()) {
                fields[idx] = field;
                arrays[idx] = array;
            } else {
                fields.push(field);
                arrays.push(array);
            }
        }

        let options = RecordBatchOptions::new().with_row_count(Some(self.num_rows()));
        let batch =
            RecordBatch::try_new_with_options(Arc::new(Schema::new(fields)), arrays, &options)?;
        Ok(Self::new(&self.name, batch))
    }

    /// Render a cell as text, `None` for null
    pub fn display_value(&self, column: &str, row: usize) -> Result<Option<String>> {
        let array = self.column(column)?;
        display_cell(array, row)
    }

    fn type_error(&self, column: &str, expected: &DataType, actual: &DataType) -> Error {
        Error::ColumnType {
            table: self.name.clone(),
            column: column.to_string(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }
}

/// Render one array cell as text, `None` for null
pub(crate) fn display_cell(array: &ArrayRef, row: usize) -> Result<Option<String>> {
    if array.is_null(row) {
        return Ok(None);
    }
    Ok(Some(array_value_to_string(array, row)?))
}

/// Composite key of several columns at one row
pub(crate) fn row_key(columns: &[&ArrayRef], row: usize) -> Result<Vec<Option<String>>> {
    columns.iter().map(|array| display_cell(array, row)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::Float64Array;

    fn sample() -> Table {
        Table::from_columns(
            "sample",
            vec![
                (
                    Field::new("id", DataType::Utf8, true),
                    Arc::new(StringArray::from(vec![Some("a"), Some("b"), None])) as ArrayRef,
                ),
                (
                    Field::new("n", DataType::Int64, true),
                    Arc::new(Int64Array::from(vec![1, 2, 3])) as ArrayRef,
                ),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_column_lookup() {
        let table = sample();
        assert_eq!(table.num_rows(), 3);
        assert_eq!(table.column_names(), vec!["id", "n"]);
        assert!(table.has_column("n"));
        assert_eq!(table.i64_column("n").unwrap().value(1), 2);
        assert_eq!(table.string_column("id").unwrap().value(0), "a");
    }

    #[test]
    fn test_missing_column_is_error() {
        let err = sample().column("nope").unwrap_err();
        assert!(matches!(err, Error::MissingColumn { ref column, .. } if column == "nope"));
    }

    #[test]
    fn test_wrong_type_is_error() {
        let err = sample().string_column("n").unwrap_err();
        assert!(matches!(err, Error::ColumnType { .. }));
    }

    #[test]
    fn test_filter_and_take() {
        let table = sample();
        let filtered = table
            .filter(&BooleanArray::from(vec![true, false, true]))
            .unwrap();
        assert_eq!(filtered.num_rows(), 2);
        assert_eq!(filtered.i64_column("n").unwrap().value(1), 3);

        let taken = table.take(&UInt32Array::from(vec![2, 0, 0])).unwrap();
        assert_eq!(taken.num_rows(), 3);
        assert_eq!(taken.i64_column("n").unwrap().values().to_vec(), vec![3, 1, 1]);
    }

    #[test]
    fn test_with_columns_appends_and_replaces() {
        let table = sample()
            .with_columns(vec![
                (
                    Field::new("x", DataType::Float64, true),
                    Arc::new(Float64Array::from(vec![0.5, 1.5, 2.5])) as ArrayRef,
                ),
                (
                    Field::new("n", DataType::Int64, true),
                    Arc::new(Int64Array::from(vec![7, 8, 9])) as ArrayRef,
                ),
            ])
            .unwrap();
        assert_eq!(table.column_names(), vec!["id", "n", "x"]);
        assert_eq!(table.i64_column("n").unwrap().value(0), 7);
    }

    #[test]
    fn test_display_value_null() {
        let table = sample();
        assert_eq!(table.display_value("id", 1).unwrap(), Some("b".to_string()));
        assert_eq!(table.display_value("id", 2).unwrap(), None);
        assert_eq!(table.display_value("n", 0).unwrap(), Some("1".to_string()));
    }
}
