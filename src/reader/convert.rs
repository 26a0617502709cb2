//! JSON records to Arrow
//!
//! Builds one `RecordBatch` from parsed JSON objects, either against a
//! declared schema or against a schema inferred from the records themselves.
//! A value whose JSON type does not fit its column becomes null.

use crate::error::Result;
use arrow::array::{ArrayRef, BooleanArray, Float64Array, Int32Array, Int64Array, NullArray, StringArray};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::{RecordBatch, RecordBatchOptions};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Infer an Arrow schema from a set of JSON records
///
/// Fields are sorted by name and always nullable. Nested arrays and objects
/// are kept as JSON text.
pub fn infer_schema(records: &[Value]) -> Schema {
    let mut field_types: BTreeMap<String, DataType> = BTreeMap::new();

    for record in records {
        if let Value::Object(obj) = record {
            for (key, value) in obj {
                let inferred_type = infer_type(value);
                field_types
                    .entry(key.clone())
                    .and_modify(|existing| {
                        *existing = merge_types(existing, &inferred_type);
                    })
                    .or_insert(inferred_type);
            }
        }
    }

    let fields: Vec<Field> = field_types
        .into_iter()
        .map(|(name, dtype)| Field::new(name, dtype, true))
        .collect();

    Schema::new(fields)
}

/// Convert JSON records to an Arrow RecordBatch with the given schema
///
/// Keys absent from the schema are dropped; schema columns absent from a
/// record are null.
pub fn json_to_arrow(records: &[Value], schema: SchemaRef) -> Result<RecordBatch> {
    let columns = schema
        .fields()
        .iter()
        .map(|field| {
            let values: Vec<Option<&Value>> = records
                .iter()
                .map(|record| record.get(field.name()))
                .collect();
            build_array(&values, field.data_type())
        })
        .collect::<Vec<_>>();

    let options = RecordBatchOptions::new().with_row_count(Some(records.len()));
    Ok(RecordBatch::try_new_with_options(schema, columns, &options)?)
}

/// Infer Arrow DataType from a JSON value
fn infer_type(value: &Value) -> DataType {
    match value {
        Value::Null => DataType::Null,
        Value::Bool(_) => DataType::Boolean,
        Value::Number(n) => {
            if n.is_i64() {
                DataType::Int64
            } else {
                DataType::Float64
            }
        }
        Value::String(_) | Value::Array(_) | Value::Object(_) => DataType::Utf8,
    }
}

/// Merge two data types into a compatible type
fn merge_types(type1: &DataType, type2: &DataType) -> DataType {
    match (type1, type2) {
        (a, b) if a == b => a.clone(),

        // Null can merge with anything
        (DataType::Null, other) | (other, DataType::Null) => other.clone(),

        // Numbers can merge (prefer Float64 for mixed)
        (DataType::Int64, DataType::Float64) | (DataType::Float64, DataType::Int64) => {
            DataType::Float64
        }

        // Different types -> fall back to String (most flexible)
        _ => DataType::Utf8,
    }
}

/// Integral JSON number as i64, also accepting `5.0`
fn as_integer(value: &Value) -> Option<i64> {
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
            .map(|f| f as i64)
    })
}

/// Build an Arrow array from JSON values
fn build_array(values: &[Option<&Value>], data_type: &DataType) -> ArrayRef {
    match data_type {
        DataType::Null => Arc::new(NullArray::new(values.len())),

        DataType::Boolean => {
            let arr: BooleanArray = values.iter().map(|v| v.and_then(Value::as_bool)).collect();
            Arc::new(arr)
        }

        DataType::Int32 => {
            let arr: Int32Array = values
                .iter()
                .map(|v| v.and_then(as_integer).and_then(|i| i32::try_from(i).ok()))
                .collect();
            Arc::new(arr)
        }

        DataType::Int64 => {
            let arr: Int64Array = values.iter().map(|v| v.and_then(as_integer)).collect();
            Arc::new(arr)
        }

        DataType::Float64 => {
            let arr: Float64Array = values.iter().map(|v| v.and_then(Value::as_f64)).collect();
            Arc::new(arr)
        }

        _ => {
            // Utf8 and anything else: strings verbatim, other values as JSON text
            let arr: StringArray = values
                .iter()
                .map(|v| match v {
                    None | Some(Value::Null) => None,
                    Some(Value::String(s)) => Some(s.clone()),
                    Some(other) => Some(other.to_string()),
                })
                .collect();
            Arc::new(arr)
        }
    }
}
