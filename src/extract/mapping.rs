//! Column projection

use crate::error::Result;
use crate::table::Table;
use arrow::array::StringArray;
use arrow::compute;
use arrow::compute::kernels::cmp;
use arrow::datatypes::{DataType, Field};

/// Optional conversion applied while projecting a column
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transform {
    /// Convert with `arrow::compute::cast`
    Cast(DataType),
}

impl Transform {
    fn apply(&self, array: &arrow::array::ArrayRef) -> Result<arrow::array::ArrayRef> {
        match self {
            Transform::Cast(to) => Ok(compute::cast(array, to)?),
        }
    }

    fn output_type(&self) -> &DataType {
        match self {
            Transform::Cast(to) => to,
        }
    }
}

/// One output column of a projection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMapping {
    /// Column read from the source table
    pub source: String,
    /// Column name in the output
    pub target: String,
    pub transform: Option<Transform>,
}

impl ColumnMapping {
    /// Copy a column under its own name
    pub fn keep(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            source: name.clone(),
            target: name,
            transform: None,
        }
    }

    /// Copy a column under a new name
    pub fn rename(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            transform: None,
        }
    }

    /// Cast the column on the way out
    #[must_use]
    pub fn cast(mut self, to: DataType) -> Self {
        self.transform = Some(Transform::Cast(to));
        self
    }
}

/// Project `source` onto `mappings`, in mapping order
///
/// The result has exactly the target columns. Rows are neither filtered nor
/// deduplicated and nulls pass through. A mapping naming a column the source
/// lacks fails with `Error::MissingColumn`.
pub fn project(source: &Table, name: &str, mappings: &[ColumnMapping]) -> Result<Table> {
    let mut columns = Vec::with_capacity(mappings.len());

    for mapping in mappings {
        let field = source.field(&mapping.source)?;
        let array = source.column(&mapping.source)?;

        let (data_type, array) = match &mapping.transform {
            Some(transform) => (transform.output_type().clone(), transform.apply(array)?),
            None => (field.data_type().clone(), array.clone()),
        };

        columns.push((
            Field::new(&mapping.target, data_type, field.is_nullable()),
            array,
        ));
    }

    Table::from_columns(name, columns)
}

/// Keep rows whose Utf8 `column` equals `value` exactly
///
/// Null cells never match.
pub fn filter_eq(table: &Table, column: &str, value: &str) -> Result<Table> {
    let array = table.string_column(column)?;
    let mask = cmp::eq(array, &StringArray::new_scalar(value))?;
    table.filter(&mask)
}
